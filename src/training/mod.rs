pub mod cancel;
pub mod episode;
pub mod sampler;
pub mod session;

pub use cancel::CancellationToken;
pub use episode::EpisodeBuffer;
pub use sampler::sample_action;
pub use session::{LoopState, StopReason, TrainingSession, TrainingSummary};
