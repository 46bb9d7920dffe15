pub mod image;

pub use image::{frame_difference, preprocess, INPUT_DIM};
