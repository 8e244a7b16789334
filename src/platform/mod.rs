//! Platform abstraction layer
//!
//! Drives the simulation from display-frame callbacks. Browser and native
//! hosts plug in their own scheduler and render surface.

pub mod frame_loop;

pub use frame_loop::{FrameHandle, FrameLoop, FrameOutcome, FrameScheduler, RenderSurface};
