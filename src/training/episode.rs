use crate::game::Action;
use crate::neural::training::returns::{discount_rewards, standardize};

/// Trajectory storage for the REINFORCE update.
///
/// Holds one or more finished episodes plus the one in progress. Inputs are
/// stored flat, `input_dim` values per step.
#[derive(Debug, Clone)]
pub struct EpisodeBuffer {
    input_dim: usize,
    inputs: Vec<f32>,
    actions: Vec<Action>,
    probs: Vec<f64>,
    rewards: Vec<f32>,
    /// Exclusive end index of every finished episode
    episode_ends: Vec<usize>,
}

impl EpisodeBuffer {
    pub fn new(input_dim: usize) -> Self {
        Self {
            input_dim,
            inputs: Vec::new(),
            actions: Vec::new(),
            probs: Vec::new(),
            rewards: Vec::new(),
            episode_ends: Vec::new(),
        }
    }

    /// Record one step: the network input, the sampled action with the
    /// probability of "up" it was drawn from, and the reward that followed.
    pub fn push_step(&mut self, input: &[f32], action: Action, prob_up: f64, reward: f32) {
        debug_assert_eq!(input.len(), self.input_dim);
        self.inputs.extend_from_slice(input);
        self.actions.push(action);
        self.probs.push(prob_up);
        self.rewards.push(reward);
    }

    /// Close the episode in progress. Does nothing when it has no steps.
    pub fn finish_episode(&mut self) {
        let start = self.episode_ends.last().copied().unwrap_or(0);
        if self.actions.len() > start {
            self.episode_ends.push(self.actions.len());
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn finished_episodes(&self) -> usize {
        self.episode_ends.len()
    }

    pub fn inputs(&self) -> &[f32] {
        &self.inputs
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    /// Discounted returns computed per episode, then standardized over the whole buffer.
    ///
    /// Steps of an unfinished episode are discounted as if it ended now.
    pub fn advantages(&self, gamma: f32) -> Vec<f32> {
        let mut returns = Vec::with_capacity(self.rewards.len());
        let mut start = 0;
        let ends = self.episode_ends.iter().copied().chain(std::iter::once(self.rewards.len()));
        for end in ends {
            returns.extend(discount_rewards(&self.rewards[start..end], gamma));
            start = end;
        }
        standardize(&returns)
    }

    pub fn clear(&mut self) {
        self.inputs.clear();
        self.actions.clear();
        self.probs.clear();
        self.rewards.clear();
        self.episode_ends.clear();
    }
}
