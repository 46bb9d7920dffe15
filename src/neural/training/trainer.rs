use tch::{nn, Kind, Tensor};

use crate::neural::policy_net::PongNet;
use crate::neural::training::gradient_clipping::clip_gradients;
use crate::training::episode::EpisodeBuffer;
use crate::{PongError, Result};

/// Outcome of one policy-gradient update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateReport {
    pub loss: f64,
    pub max_grad_norm: f64,
    pub steps: usize,
    /// Mean P(up) the sampled actions were drawn from
    pub mean_prob_up: f64,
}

/// REINFORCE loss for a batch of decisions.
///
/// `-mean(A_t * log π(a_t | x_t))`, where π(up) is the sigmoid of the network
/// logit. Log-probabilities come from `log_sigmoid` to stay finite when the
/// policy is nearly deterministic.
pub fn policy_gradient_loss(logits: &Tensor, labels: &Tensor, advantages: &Tensor) -> Tensor {
    let logits = logits.view([-1]);
    let log_up = logits.log_sigmoid();
    let log_down = (-&logits).log_sigmoid();
    let log_prob: Tensor = labels * log_up + (1.0 - labels) * log_down;
    -(advantages * log_prob).mean(Kind::Float)
}

/// One REINFORCE step over everything in `buffer`.
///
/// Returns `Ok(None)` without touching the weights when the buffer is empty
/// or the loss is not finite.
pub fn reinforce_update(
    net: &PongNet,
    vs: &nn::VarStore,
    optimizer: &mut nn::Optimizer,
    buffer: &EpisodeBuffer,
    gamma: f32,
    grad_clip: f64,
) -> Result<Option<UpdateReport>> {
    if buffer.is_empty() {
        log::debug!("Empty episode buffer, skipping update");
        return Ok(None);
    }

    let device = vs.device();
    let steps = buffer.len();
    let advantages = buffer.advantages(gamma);
    if advantages.len() != steps {
        return Err(PongError::Training(format!(
            "{} advantages for {} steps",
            advantages.len(),
            steps
        )));
    }
    let labels: Vec<f32> = buffer.actions().iter().map(|a| a.label()).collect();

    let inputs = Tensor::from_slice(buffer.inputs())
        .view([steps as i64, buffer.input_dim() as i64])
        .to_device(device);
    let labels = Tensor::from_slice(&labels).to_device(device);
    let advantages = Tensor::from_slice(&advantages).to_device(device);

    let logits = net.logits(&inputs);
    let loss = policy_gradient_loss(&logits, &labels, &advantages);
    let loss_value = loss.double_value(&[]);

    if !loss_value.is_finite() {
        log::error!("⚠️ Non-finite policy loss ({}), skipping update", loss_value);
        return Ok(None);
    }

    optimizer.zero_grad();
    loss.backward();
    let max_grad_norm = clip_gradients(vs, grad_clip);
    optimizer.step();

    let mean_prob_up = buffer.probs().iter().sum::<f64>() / steps as f64;
    log::debug!(
        "Policy update | loss: {:.4}, max grad norm: {:.4}, steps: {}, mean p(up): {:.3}",
        loss_value,
        max_grad_norm,
        steps,
        mean_prob_up
    );

    Ok(Some(UpdateReport {
        loss: loss_value,
        max_grad_norm,
        steps,
        mean_prob_up,
    }))
}
