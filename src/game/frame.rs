//! Raw observation frames.
//!
//! A frame is the 210×160 RGB screen of the Atari console, stored row-major
//! with interleaved channels: `index = (row * WIDTH + col) * CHANNELS + ch`.

use crate::{PongError, Result};

pub const FRAME_HEIGHT: usize = 210;
pub const FRAME_WIDTH: usize = 160;
pub const FRAME_CHANNELS: usize = 3;
pub const FRAME_LEN: usize = FRAME_HEIGHT * FRAME_WIDTH * FRAME_CHANNELS;

/// A validated 210×160×3 observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw bytes, checking the declared shape and the byte count.
    pub fn from_raw(height: usize, width: usize, channels: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = (FRAME_HEIGHT, FRAME_WIDTH, FRAME_CHANNELS);
        if (height, width, channels) != expected || pixels.len() != FRAME_LEN {
            // report the byte count as rows when the declared shape was right but the data wasn't
            let actual = if (height, width, channels) == expected {
                (pixels.len() / (FRAME_WIDTH * FRAME_CHANNELS), width, channels)
            } else {
                (height, width, channels)
            };
            return Err(PongError::InvalidObservationShape { expected, actual });
        }
        Ok(Self { pixels })
    }

    /// A frame where every pixel has the same colour
    pub fn filled(rgb: [u8; 3]) -> Self {
        let pixels = rgb.iter().copied().cycle().take(FRAME_LEN).collect();
        Self { pixels }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (FRAME_HEIGHT, FRAME_WIDTH, FRAME_CHANNELS)
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.pixels[(row * FRAME_WIDTH + col) * FRAME_CHANNELS + channel]
    }

    pub fn set_pixel(&mut self, row: usize, col: usize, rgb: [u8; 3]) {
        if row >= FRAME_HEIGHT || col >= FRAME_WIDTH {
            return;
        }
        let base = (row * FRAME_WIDTH + col) * FRAME_CHANNELS;
        self.pixels[base..base + FRAME_CHANNELS].copy_from_slice(&rgb);
    }

    /// Paint an axis-aligned rectangle, clipped to the screen.
    pub fn fill_rect(&mut self, top: usize, left: usize, height: usize, width: usize, rgb: [u8; 3]) {
        for row in top..(top + height).min(FRAME_HEIGHT) {
            for col in left..(left + width).min(FRAME_WIDTH) {
                self.set_pixel(row, col, rgb);
            }
        }
    }
}
