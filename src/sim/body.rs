//! The falling body
//!
//! Exactly one body is in play at a time. It owns its own integration step and
//! bookkeeping; obstacles push it around through `sim::collision`.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::shapes::ShapeKind;
use crate::config::{BodyParams, WorldBounds};

/// Trail point for body rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec2,
    pub rotation: f32,
}

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 30;

/// Where and how a body dropped into its slot
///
/// Captured once at match time; the renderer animates `scale` and `spin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPose {
    pub kind: ShapeKind,
    pub slot: usize,
    /// Slot center in world space
    pub pos: Vec2,
    /// Slot angle including wheel rotation
    pub angle: f32,
    pub scale: f32,
    pub spin: f32,
}

impl MatchPose {
    pub const START_SCALE: f32 = 0.8;
    pub const END_SCALE: f32 = 1.2;
    const SCALE_STEP: f32 = 0.1;
    const SPIN_STEP: f32 = 0.1;

    pub fn new(kind: ShapeKind, slot: usize, pos: Vec2, angle: f32) -> Self {
        Self {
            kind,
            slot,
            pos,
            angle,
            scale: Self::START_SCALE,
            spin: 0.0,
        }
    }

    /// Advance the drop-in animation one tick
    pub fn advance(&mut self) {
        self.scale = (self.scale + Self::SCALE_STEP).min(Self::END_SCALE);
        self.spin += Self::SPIN_STEP;
    }
}

/// The single active falling shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: u32,
    pub kind: ShapeKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
    pub gravity: f32,
    pub friction: f32,
    pub bounce: f32,
    pub normal_speed: f32,
    pub fast_speed: f32,
    /// Descent boost toggled by the player
    pub fast: bool,
    /// Set when a platform caught the body this tick
    pub on_platform: bool,
    /// Terminal: set once the body drops into a slot
    pub matched: Option<MatchPose>,
    /// Trail history for rendering (oldest first)
    #[serde(skip)]
    pub trail: VecDeque<TrailPoint>,
}

impl Body {
    pub fn new(id: u32, kind: ShapeKind, pos: Vec2, params: &BodyParams) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            size: params.size,
            rotation: 0.0,
            rotation_speed: params.rotation_speed,
            gravity: params.gravity,
            friction: params.friction,
            bounce: params.bounce,
            normal_speed: params.normal_speed,
            fast_speed: params.fast_speed,
            fast: false,
            on_platform: false,
            matched: None,
            trail: VecDeque::with_capacity(TRAIL_LENGTH + 1),
        }
    }

    #[inline]
    pub fn half_size(&self) -> f32 {
        self.size / 2.0
    }

    /// Additive descent applied every tick on top of the integrated velocity
    #[inline]
    pub fn fall_speed(&self) -> f32 {
        if self.fast {
            self.fast_speed
        } else {
            self.normal_speed
        }
    }

    pub fn set_speed(&mut self, fast: bool) {
        self.fast = fast;
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }

    /// One integration step with horizontal wall bounces
    ///
    /// Gravity feeds velocity and the fall speed is added straight to
    /// position, so both contribute to descent in the same tick.
    pub fn integrate(&mut self, world: &WorldBounds) {
        self.vel.y += self.gravity;
        self.vel.x *= self.friction;
        self.pos += self.vel;
        self.pos.y += self.fall_speed();

        let half = self.half_size();
        if self.pos.x - half < 0.0 {
            self.pos.x = half;
            self.vel.x = self.vel.x.abs() * self.bounce;
        } else if self.pos.x + half > world.width {
            self.pos.x = world.width - half;
            self.vel.x = -self.vel.x.abs() * self.bounce;
        }
    }

    /// Spin and record the current pose to the trail
    pub fn record_trail(&mut self) {
        self.rotation += self.rotation_speed;
        self.trail.push_back(TrailPoint {
            pos: self.pos,
            rotation: self.rotation,
        });
        if self.trail.len() > TRAIL_LENGTH {
            self.trail.pop_front();
        }
    }

    /// Enter the terminal matched state
    pub fn start_match(&mut self, slot: usize, pos: Vec2, angle: f32) {
        self.matched = Some(MatchPose::new(self.kind, slot, pos, angle));
    }
}
