pub mod action;
pub mod environment;
pub mod frame;
pub mod pong_sim;

pub use action::Action;
pub use environment::{Environment, Step};
pub use frame::Frame;
pub use pong_sim::PongSim;
