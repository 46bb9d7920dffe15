use crate::game::Frame;
use crate::{PongError, Result};

/// First playfield row kept by the crop
pub const CROP_TOP: usize = 35;
/// One past the last playfield row kept by the crop
pub const CROP_BOTTOM: usize = 195;
pub const DOWNSAMPLE: usize = 2;
pub const DOWNSAMPLED_SIDE: usize = (CROP_BOTTOM - CROP_TOP) / DOWNSAMPLE;
/// Length of the preprocessed vector fed to the policy network (80×80)
pub const INPUT_DIM: usize = DOWNSAMPLED_SIDE * DOWNSAMPLED_SIDE;

/// Red-channel intensities of the two Pong background colours
pub const BACKGROUND_VALUES: [u8; 2] = [144, 109];

/// Crop, downsample and binarize a frame into a flat 80×80 vector.
///
/// Only the red channel is kept; background intensities become 0.0 and every
/// other non-zero value (paddles, ball, walls) becomes 1.0.
pub fn preprocess(frame: &Frame) -> Vec<f32> {
    let mut out = Vec::with_capacity(INPUT_DIM);
    for row in (CROP_TOP..CROP_BOTTOM).step_by(DOWNSAMPLE) {
        for col in (0..frame.shape().1).step_by(DOWNSAMPLE) {
            let value = frame.pixel(row, col, 0);
            let on = value != 0 && !BACKGROUND_VALUES.contains(&value);
            out.push(if on { 1.0 } else { 0.0 });
        }
    }
    out
}

/// Motion image: `current - previous`, or all zeros when there is no previous frame.
///
/// Both vectors must have the same length.
pub fn frame_difference(current: &[f32], previous: Option<&[f32]>) -> Result<Vec<f32>> {
    match previous {
        Some(previous) if previous.len() != current.len() => Err(PongError::InvalidInputLength {
            expected: current.len(),
            actual: previous.len(),
        }),
        Some(previous) => Ok(current.iter().zip(previous).map(|(c, p)| c - p).collect()),
        None => Ok(vec![0.0; current.len()]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::pong_sim::{BACKGROUND, SCORE_BAR};
    use assert_matches::assert_matches;

    fn background_frame() -> Frame {
        let mut frame = Frame::filled(BACKGROUND);
        frame.fill_rect(0, 0, 35, 160, SCORE_BAR);
        frame
    }

    #[test]
    fn test_output_length_and_values() {
        let mut frame = background_frame();
        frame.fill_rect(60, 30, 9, 7, [236, 236, 236]);
        frame.fill_rect(120, 100, 3, 3, [92, 186, 92]);
        let out = preprocess(&frame);
        assert_eq!(out.len(), 6400);
        assert!(out.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_deterministic() {
        let mut frame = background_frame();
        frame.fill_rect(80, 80, 4, 2, [236, 236, 236]);
        assert_eq!(preprocess(&frame), preprocess(&frame.clone()));
    }

    #[test]
    fn test_background_is_erased() {
        let out = preprocess(&background_frame());
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_single_ball_pixel_lands_at_downsampled_position() {
        let mut frame = background_frame();
        // the second background colour inside the playfield must be erased too
        frame.fill_rect(150, 0, 10, 160, SCORE_BAR);
        let (row, col) = (101, 64);
        frame.set_pixel(row, col, [236, 236, 236]);

        let out = preprocess(&frame);
        let expected = ((row - CROP_TOP) / 2) * DOWNSAMPLED_SIDE + col / 2;
        assert_eq!(out[expected], 1.0);
        assert_eq!(out.iter().filter(|&&v| v == 1.0).count(), 1);
    }

    #[test]
    fn test_rows_outside_the_crop_are_dropped() {
        let mut frame = background_frame();
        frame.fill_rect(0, 0, 35, 160, [236, 236, 236]);
        frame.fill_rect(195, 0, 15, 160, [236, 236, 236]);
        assert!(preprocess(&frame).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_only_red_channel_counts() {
        let mut frame = background_frame();
        frame.set_pixel(41, 10, [144, 255, 255]);
        assert!(preprocess(&frame).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_first_difference_is_zero() {
        let current = preprocess(&background_frame());
        let diff = frame_difference(&current, None).unwrap();
        assert_eq!(diff, vec![0.0; 6400]);
    }

    #[test]
    fn test_difference_captures_motion() {
        let mut a = background_frame();
        a.set_pixel(41, 10, [236, 236, 236]);
        let mut b = background_frame();
        b.set_pixel(43, 10, [236, 236, 236]);
        let (pa, pb) = (preprocess(&a), preprocess(&b));
        let diff = frame_difference(&pb, Some(&pa)).unwrap();
        assert_eq!(diff.len(), 6400);
        assert_eq!(diff[3 * 80 + 5], -1.0);
        assert_eq!(diff[4 * 80 + 5], 1.0);
        assert_eq!(diff.iter().filter(|&&v| v != 0.0).count(), 2);
    }

    #[test]
    fn test_difference_rejects_mismatched_previous() {
        let current = preprocess(&background_frame());
        let err = frame_difference(&current, Some(&current[..100])).unwrap_err();
        assert_matches!(
            err,
            PongError::InvalidInputLength { expected: 6400, actual: 100 }
        );
    }
}
