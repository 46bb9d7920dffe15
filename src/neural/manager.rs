//! Neural Network Manager
//!
//! Owns the policy network together with its VarStore and optimizer.
//! Handles initialization, resuming from a checkpoint and saving.
//!
//! A checkpoint directory holds the weights and the `config.json` of the run
//! that wrote them; both are always written together.

use std::path::{Path, PathBuf};

use tch::nn;
use tch::nn::OptimizerConfig;

use crate::config::{TrainingConfig, CONFIG_FILE};
use crate::neural::model_io::{load_varstore, save_varstore};
use crate::neural::policy_net::PongNet;
use crate::neural::training::trainer::{reinforce_update, UpdateReport};
use crate::training::episode::EpisodeBuffer;
use crate::{PongError, Result};

/// Neural Network Manager that encapsulates all network components
pub struct NeuralManager {
    vs: nn::VarStore,
    net: PongNet,
    optimizer: nn::Optimizer,
    config: TrainingConfig,
    checkpoint_path: PathBuf,
}

impl NeuralManager {
    /// Create a new neural network manager with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(&TrainingConfig::default())
    }

    /// Build the network for `config`. When `config.resume` is set and a
    /// checkpoint exists, its weights replace the fresh initialization.
    pub fn with_config(config: &TrainingConfig) -> Result<Self> {
        log::info!("🧠 Initializing policy network...");
        let device = config.device();
        log::debug!("Neural config: hidden={}, device={:?}", config.hidden, device);

        tch::manual_seed(config.seed as i64);
        let mut vs = nn::VarStore::new(device);
        let net = PongNet::new(&vs, config.hidden);

        let checkpoint_path = config.checkpoint_path();
        if config.resume {
            if checkpoint_path.exists() {
                log::info!("📂 Resuming from {}", checkpoint_path.display());
                check_saved_config(config)?;
                load_varstore(&mut vs, &checkpoint_path)?;
                log::info!("✅ Policy weights loaded");
            } else {
                log::warn!(
                    "⚠️ Resume requested but {} does not exist, starting fresh",
                    checkpoint_path.display()
                );
            }
        }

        let optimizer = nn::Adam::default().build(&vs, config.learning_rate)?;

        log::info!("✅ Policy network ready");

        Ok(Self {
            vs,
            net,
            optimizer,
            config: config.clone(),
            checkpoint_path,
        })
    }

    pub fn checkpoint_path(&self) -> &Path {
        &self.checkpoint_path
    }

    /// P(up) for one difference vector
    pub fn probability_up(&self, input: &[f32]) -> Result<f64> {
        self.net.probability_up(input)
    }

    /// Apply one REINFORCE update using everything in `buffer`.
    pub fn update(&mut self, buffer: &EpisodeBuffer) -> Result<Option<UpdateReport>> {
        reinforce_update(
            &self.net,
            &self.vs,
            &mut self.optimizer,
            buffer,
            self.config.gamma,
            self.config.grad_clip,
        )
    }

    /// Write the weights and the config that describes them.
    pub fn save_checkpoint(&self) -> Result<()> {
        save_varstore(&self.vs, &self.checkpoint_path)?;
        self.config.save(&self.config.checkpoint_dir)?;
        log::info!("💾 Saved policy weights to {}", self.checkpoint_path.display());
        Ok(())
    }
}

/// Refuse to resume into a network whose width differs from the saved one.
fn check_saved_config(config: &TrainingConfig) -> Result<()> {
    if !config.checkpoint_dir.join(CONFIG_FILE).exists() {
        log::warn!("⚠️ No {} next to the checkpoint, skipping config check", CONFIG_FILE);
        return Ok(());
    }
    let saved = TrainingConfig::load(&config.checkpoint_dir)?;
    if saved.hidden != config.hidden {
        return Err(PongError::Checkpoint(format!(
            "checkpoint was trained with hidden={}, requested hidden={}",
            saved.hidden, config.hidden
        )));
    }
    Ok(())
}
