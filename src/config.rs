//! Training configuration
//!
//! Hyperparameters, budgets and output paths for a training run. The struct is
//! saved as JSON together with every checkpoint; resuming checks the saved
//! network width against the requested one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tch::Device;

use crate::Result;

/// Environment variable that turns on rendering when set
pub const RENDER_ENV: &str = "RENDER";
/// Environment variable that loads the last checkpoint before training when set
pub const RESUME_ENV: &str = "RESUME";

pub const CHECKPOINT_FILE: &str = "policy.safetensors";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Hidden layer width
    pub hidden: i64,
    pub learning_rate: f64,
    /// Reward discount factor
    pub gamma: f32,
    /// Episodes collected per gradient update
    pub batch_episodes: usize,
    /// Gradients are clamped to `[-grad_clip, grad_clip]`
    pub grad_clip: f64,
    /// Save weights every N episodes (0 disables periodic saves)
    pub checkpoint_every: usize,
    pub max_episodes: usize,
    /// Optional cap on the total number of environment steps
    pub max_steps: Option<usize>,
    pub seed: u64,
    pub render: bool,
    pub resume: bool,
    pub checkpoint_dir: PathBuf,
    pub stats_dir: PathBuf,
    /// Run on CUDA when available
    pub use_cuda: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            hidden: 200,
            learning_rate: 1e-3,
            gamma: 0.99,
            batch_episodes: 1,
            grad_clip: 1.0,
            checkpoint_every: 10,
            max_episodes: 1000,
            max_steps: None,
            seed: 42,
            render: false,
            resume: false,
            checkpoint_dir: PathBuf::from("model_weights"),
            stats_dir: PathBuf::from("training_stats"),
            use_cuda: false,
        }
    }
}

impl TrainingConfig {
    /// Turn on `render` / `resume` when `RENDER` / `RESUME` are present in the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var_os(key).is_some())
    }

    fn with_overrides_from(mut self, is_set: impl Fn(&str) -> bool) -> Self {
        if is_set(RENDER_ENV) {
            self.render = true;
        }
        if is_set(RESUME_ENV) {
            self.resume = true;
        }
        self
    }

    pub fn device(&self) -> Device {
        if self.use_cuda {
            Device::cuda_if_available()
        } else {
            Device::Cpu
        }
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join(CHECKPOINT_FILE)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(CONFIG_FILE), json)?;
        Ok(())
    }

    pub fn load(dir: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        Ok(serde_json::from_str(&json)?)
    }
}
