//! Gestion des gradients et clipping pour stabiliser l'entraînement

use tch::nn;

/// Clamp every gradient of `vs` elementwise to `[-max_value, max_value]`.
///
/// Returns the largest gradient L2 norm seen before clamping.
pub fn clip_gradients(vs: &nn::VarStore, max_value: f64) -> f64 {
    let mut max_grad: f64 = 0.0;

    tch::no_grad(|| {
        for tensor in vs.trainable_variables() {
            let mut grad = tensor.grad();
            if grad.defined() {
                let grad_norm = grad.norm().double_value(&[]);
                max_grad = max_grad.max(grad_norm);

                let _ = grad.clamp_(-max_value, max_value);
            }
        }
    });

    if max_grad > 2.0 * max_value {
        log::debug!("High gradient norm: {:.4}", max_grad);
    }

    max_grad
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{Device, Kind, Tensor};

    #[test]
    fn test_clip_bounds_gradients_and_reports_norm() {
        let vs = nn::VarStore::new(Device::Cpu);
        let w = vs.root().var("w", &[3], nn::Init::Const(1.0));
        let loss = (&w * Tensor::from_slice(&[10.0f32, -10.0, 0.5])).sum(Kind::Float);
        loss.backward();

        let norm = clip_gradients(&vs, 1.0);
        assert!((norm - (200.25f64).sqrt()).abs() < 1e-3);

        let grad = w.grad();
        assert!((grad.double_value(&[0]) - 1.0).abs() < 1e-6);
        assert!((grad.double_value(&[1]) + 1.0).abs() < 1e-6);
        assert!((grad.double_value(&[2]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_clip_without_gradients_is_noop() {
        let vs = nn::VarStore::new(Device::Cpu);
        let _w = vs.root().var("w", &[2], nn::Init::Const(0.0));
        assert_eq!(clip_gradients(&vs, 1.0), 0.0);
    }
}
