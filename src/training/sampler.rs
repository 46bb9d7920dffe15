use rand::prelude::*;

use crate::game::Action;

/// Bernoulli draw: `Up` when a uniform sample in [0, 1) falls below `prob_up`.
pub fn sample_action<R: Rng + ?Sized>(rng: &mut R, prob_up: f64) -> Action {
    let u: f64 = rng.random();
    if u < prob_up {
        Action::Up
    } else {
        Action::Down
    }
}
