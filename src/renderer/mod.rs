//! Render-facing projections
//!
//! Turns simulation state into what a 2D drawing backend needs: sprite
//! frames, jump scale, layering and a shaken per-frame snapshot.

pub mod sprite;
pub mod view;

pub use sprite::{SourceRect, SpriteSheet, jump_scale, sprite_frame};
pub use view::{FrameView, SkierLayer, SkierView, TrailSegment, skier_layer, trail_opacity};
