use std::collections::HashMap;

use crate::game::{Action, Frame};
use crate::Result;

/// Outcome of one environment step
#[derive(Debug, Clone)]
pub struct Step {
    pub frame: Frame,
    pub reward: f32,
    pub done: bool,
    pub info: HashMap<String, String>,
}

/// A game that produces frames and accepts paddle actions.
///
/// Implementations wrap an emulator or simulator. Errors raised by the
/// backend are reported as `PongError::Environment` and end the training run.
pub trait Environment {
    /// Start a new episode and return its first observation
    fn reset(&mut self) -> Result<Frame>;

    /// Performs one time/action-step
    ///
    /// Applies the given `action` and returns:
    ///   - next observation
    ///   - immediate reward earned during the step
    ///   - done flag (episode ended)
    ///   - backend-specific info
    fn step(&mut self, action: Action) -> Result<Step>;

    /// Display the last observation. No-op by default.
    fn render(&mut self) -> Result<()> {
        Ok(())
    }
}
