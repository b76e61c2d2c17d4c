//! Wheel Drop - a falling-shape sorting game core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (body integration, obstacles, wheel matching)
//! - `config`: Data-driven layout and tuning
//! - `error`: Layout validation errors

pub mod config;
pub mod error;
pub mod sim;

pub use config::LayoutConfig;
pub use error::ConfigError;

use glam::Vec2;

/// Game configuration constants
///
/// All velocities and accelerations are per tick, not per second.
pub mod consts {
    /// Fixed simulation rate
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep in seconds (for the host frame loop)
    pub const SIM_DT: f32 = 1.0 / SIM_HZ as f32;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame the fixed-step driver will account for
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Pin push-out and flipper push-out overshoot factor (prevents sticking)
    pub const SEPARATION_FACTOR: f32 = 1.5;
    /// Flippers accept hits slightly past the paddle tip
    pub const FLIPPER_TIP_SLOP: f32 = 10.0;
    /// Upward velocity added on every flipper hit
    pub const FLIPPER_BOOST: f32 = 5.0;

    /// Wheel rotation per rotate command (radians)
    pub const WHEEL_ROTATE_STEP: f32 = 0.1;
    /// Slot centers sit at this fraction of the wheel radius
    pub const SLOT_RADIUS_FACTOR: f32 = 0.85;
    /// Body must be within `size * MATCH_DISTANCE_FACTOR` of a slot to drop in
    pub const MATCH_DISTANCE_FACTOR: f32 = 1.2;
    /// Number of past wheel rotations kept for the motion trail
    pub const WHEEL_TRAIL_LENGTH: usize = 5;

    /// Ticks between a body leaving and the next spawn (2 seconds)
    pub const SPAWN_COOLDOWN_TICKS: u64 = 2 * SIM_HZ as u64;

    /// Pause button touch target half-width, as a fraction of wheel radius
    pub const PAUSE_BUTTON_FACTOR: f32 = 0.45;
    /// Ticks after a press before the pause toggle is decided (100 ms)
    pub const PAUSE_CONFIRM_TICKS: u64 = 6;
    /// Minimum hold for a press to count (50 ms)
    pub const PAUSE_MIN_HOLD_TICKS: u64 = 3;
    /// Maximum drift for a press to count
    pub const PAUSE_MAX_DRIFT: f32 = 20.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Rotate a vector by `theta` radians
#[inline]
pub fn rotate(v: Vec2, theta: f32) -> Vec2 {
    Vec2::from_angle(theta).rotate(v)
}
