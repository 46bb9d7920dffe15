use serde::{Deserialize, Serialize};

/// Paddle move chosen by the policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
}

impl Action {
    /// Action code in the Atari Learning Environment's Pong action set
    pub fn ale_code(self) -> u8 {
        match self {
            Action::Up => 2,
            Action::Down => 3,
        }
    }

    /// Label used by the policy-gradient loss: 1.0 for the action the network's output scores.
    pub fn label(self) -> f32 {
        match self {
            Action::Up => 1.0,
            Action::Down => 0.0,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Up => write!(f, "UP"),
            Action::Down => write!(f, "DOWN"),
        }
    }
}
