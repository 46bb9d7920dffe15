use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Smoothing factor of the running reward
pub const RUNNING_REWARD_DECAY: f64 = 0.99;

/// Summary of one finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStats {
    pub episode: usize,
    pub steps: usize,
    pub reward_sum: f64,
    /// Exponential moving average of `reward_sum` over past episodes
    pub running_reward: f64,
    /// Loss of the update that followed this episode, if one ran
    pub loss: Option<f64>,
    /// RFC 3339 UTC time the episode finished
    pub timestamp: String,
}

impl EpisodeStats {
    pub fn new(
        episode: usize,
        steps: usize,
        reward_sum: f64,
        previous_running: Option<f64>,
        loss: Option<f64>,
    ) -> Self {
        Self {
            episode,
            steps,
            reward_sum,
            running_reward: running_reward(previous_running, reward_sum),
            loss,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// The first episode seeds the average with its own reward.
pub fn running_reward(previous: Option<f64>, reward_sum: f64) -> f64 {
    match previous {
        Some(prev) => prev * RUNNING_REWARD_DECAY + reward_sum * (1.0 - RUNNING_REWARD_DECAY),
        None => reward_sum,
    }
}
