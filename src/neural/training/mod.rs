pub mod gradient_clipping;
pub mod returns;
pub mod trainer;
