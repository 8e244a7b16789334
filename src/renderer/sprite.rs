//! Skier sprite sheet geometry
//!
//! The sheet is a single row of equally sized frames. Lean is shown by
//! picking a frame, never by rotating the image.

use serde::{Deserialize, Serialize};

use crate::consts::{JUMP_MAX_SCALE, MAX_ROTATION, SKIER_SIZE, SPRITE_FRAME_COUNT};
use crate::sim::state::jump_peak_height;

/// Source rectangle within the sheet image (pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// A loaded sprite sheet's slice geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub frame_width: f32,
    pub frame_height: f32,
    pub frame_count: u32,
}

impl SpriteSheet {
    /// Slice geometry for an image of the given size. None if it is too small to slice.
    pub fn from_image(width: u32, height: u32) -> Option<Self> {
        let frame_width = width as f32 / SPRITE_FRAME_COUNT as f32;
        if frame_width <= 0.0 || height == 0 {
            return None;
        }
        Some(Self {
            frame_width,
            frame_height: height as f32,
            frame_count: SPRITE_FRAME_COUNT,
        })
    }

    /// Source rectangle for a frame index (clamped to the sheet)
    pub fn frame_rect(&self, frame: u32) -> SourceRect {
        let frame = frame.min(self.frame_count.saturating_sub(1));
        SourceRect {
            x: frame as f32 * self.frame_width,
            y: 0.0,
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// On-screen size: skier width, height keeping the frame's aspect ratio
    pub fn draw_size(&self) -> (f32, f32) {
        (SKIER_SIZE, self.frame_height / self.frame_width * SKIER_SIZE)
    }
}

/// Frame index for a rotation.
///
/// Rotation past ±MAX_ROTATION (extended turns) shows the outermost frame.
/// Full left lean is the last frame, full right lean frame 0.
pub fn sprite_frame(rotation: f32) -> u32 {
    let last = SPRITE_FRAME_COUNT.saturating_sub(1);
    let normalized = rotation.clamp(-MAX_ROTATION, MAX_ROTATION) / MAX_ROTATION;
    let index = ((1.0 - normalized) * last as f32 / 2.0).round();
    (index.max(0.0) as u32).min(last)
}

/// Draw scale for a jump height: 1 on the ground, JUMP_MAX_SCALE at the apex
pub fn jump_scale(height: f32) -> f32 {
    let t = (height / jump_peak_height()).clamp(0.0, 1.0);
    1.0 + (JUMP_MAX_SCALE - 1.0) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sprite_frame_mapping() {
        assert_eq!(sprite_frame(0.0), 2);
        assert_eq!(sprite_frame(-MAX_ROTATION), 4);
        assert_eq!(sprite_frame(MAX_ROTATION), 0);
        assert_eq!(sprite_frame(-MAX_ROTATION * 0.5), 3);
        assert_eq!(sprite_frame(MAX_ROTATION * 0.5), 1);
        // Extended turns saturate
        assert_eq!(sprite_frame(-std::f32::consts::FRAC_PI_2), 4);
        assert_eq!(sprite_frame(std::f32::consts::FRAC_PI_2), 0);
    }

    #[test]
    fn test_sheet_slicing() {
        let sheet = SpriteSheet::from_image(500, 120).unwrap();
        assert_eq!(sheet.frame_width, 100.0);
        assert_eq!(sheet.frame_rect(3).x, 300.0);
        assert_eq!(sheet.frame_rect(99).x, 400.0);
        let (w, h) = sheet.draw_size();
        assert_eq!(w, SKIER_SIZE);
        assert!((h - 1.2 * SKIER_SIZE).abs() < 1e-4);

        assert!(SpriteSheet::from_image(0, 120).is_none());
        assert!(SpriteSheet::from_image(500, 0).is_none());
    }

    #[test]
    fn test_jump_scale() {
        assert_eq!(jump_scale(0.0), 1.0);
        assert!((jump_scale(jump_peak_height()) - JUMP_MAX_SCALE).abs() < 1e-6);
        let mid = jump_scale(jump_peak_height() / 2.0);
        assert!(mid > 1.0 && mid < JUMP_MAX_SCALE);
    }
}
