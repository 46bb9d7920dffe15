pub mod manager;
pub mod model_io;
pub mod policy_net;
pub mod training;

// Re-export key components for convenience
pub use manager::NeuralManager;
pub use policy_net::PongNet;
pub use training::trainer::UpdateReport;
