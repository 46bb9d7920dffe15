use tch::{nn, Kind, Tensor};

use crate::utils::image::INPUT_DIM;
use crate::{PongError, Result};

/// Default hidden layer width
pub const NUM_HIDDEN: i64 = 200;

/// f32 sigmoid saturates to exactly 0 or 1 for large logits
pub const PROB_EPS: f64 = 1e-7;

/// Two-layer policy network: Linear → ReLU → Linear → Sigmoid.
///
/// The single output is the probability of moving the paddle up.
pub struct PongNet {
    layer1: nn::Linear,
    layer2: nn::Linear,
}

impl PongNet {
    pub fn new(vs: &nn::VarStore, hidden: i64) -> Self {
        let p = vs.root();
        let layer1 = nn::linear(&p / "layer1", INPUT_DIM as i64, hidden, Default::default());
        let layer2 = nn::linear(&p / "layer2", hidden, 1, Default::default());

        initialize_weights(vs);
        log::debug!("PongNet created: {} -> {} -> 1", INPUT_DIM, hidden);

        Self { layer1, layer2 }
    }

    /// Batched forward pass, `[N, 6400] -> [N, 1]` probabilities.
    pub fn forward(&self, x: &Tensor) -> Tensor {
        self.logits(x).sigmoid()
    }

    /// Pre-sigmoid output, used by the trainer for numerically stable log-probabilities.
    pub fn logits(&self, x: &Tensor) -> Tensor {
        x.apply(&self.layer1).relu().apply(&self.layer2)
    }

    /// P(up) for one difference vector. Runs without tracking gradients.
    pub fn probability_up(&self, input: &[f32]) -> Result<f64> {
        if input.len() != INPUT_DIM {
            return Err(PongError::InvalidInputLength {
                expected: INPUT_DIM,
                actual: input.len(),
            });
        }
        let device = self.layer1.ws.device();
        let prob = tch::no_grad(|| {
            let x = Tensor::from_slice(input)
                .to_kind(Kind::Float)
                .to_device(device)
                .view([1, INPUT_DIM as i64]);
            self.forward(&x).double_value(&[0, 0])
        });
        Ok(prob.clamp(PROB_EPS, 1.0 - PROB_EPS))
    }
}

/// Xavier-uniform weights, zero biases.
pub fn initialize_weights(vs: &nn::VarStore) {
    for (name, mut param) in vs.variables() {
        let size = param.size();

        tch::no_grad(|| {
            if size.len() == 2 {
                let fan_in = size[1] as f64;
                let fan_out = size[0] as f64;
                let bound = (6.0 / (fan_in + fan_out)).sqrt();
                let _ = param.uniform_(-bound, bound);
            } else if size.len() == 1 {
                let _ = param.zero_();
            }
        });

        if param.isnan().any().double_value(&[]) > 0.0 {
            log::error!("🚨 NaN detected in {} after initialization!", name);
        }
    }
}
