//! # Pong Policy-Gradient Library
//!
//! Trains a small two-layer network to play Pong from raw 210×160×3 frames
//! using the REINFORCE policy-gradient algorithm.
//!
//! ## Features
//!
//! - **Game**: frame type, action set, environment contract and a built-in Pong simulator
//! - **Preprocessing**: crop / downsample / binarize frames into 80×80 motion vectors
//! - **Neural**: `PongNet` policy network, checkpoint I/O, REINFORCE update
//! - **Training**: episode buffer, action sampling and the budgeted training session
//! - **Recording**: per-episode statistics written to CSV
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pong_pg::{
//!     config::TrainingConfig,
//!     game::PongSim,
//!     neural::NeuralManager,
//!     training::{CancellationToken, TrainingSession},
//! };
//!
//! let config = TrainingConfig::default();
//! let mut manager = NeuralManager::with_config(&config).unwrap();
//! let mut env = PongSim::new(config.seed);
//! let mut session = TrainingSession::new(&config, CancellationToken::new()).unwrap();
//! let summary = session.run(&mut env, &mut manager).unwrap();
//! println!("{} episodes", summary.episodes);
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Hyperparameters, paths and budgets
pub mod config;

/// Frames, actions and the environment contract
pub mod game;

/// Policy network, checkpoints and the gradient update
pub mod neural;

/// Per-episode statistics output
pub mod recording;

/// Training loop and its building blocks
pub mod training;

/// Frame preprocessing helpers
pub mod utils;

/// Logger initialisation
pub mod logging;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use game::{Action, Environment, Frame, PongSim, Step};
pub use neural::{NeuralManager, PongNet};
pub use training::{CancellationToken, TrainingSession, TrainingSummary};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the library
#[derive(Debug, thiserror::Error)]
pub enum PongError {
    #[error("invalid observation shape: expected {expected:?}, got {actual:?}")]
    InvalidObservationShape {
        expected: (usize, usize, usize),
        actual: (usize, usize, usize),
    },

    #[error("invalid network input length: expected {expected}, got {actual}")]
    InvalidInputLength { expected: usize, actual: usize },

    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Torch error: {0}")]
    Tch(#[from] tch::TchError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PongError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
