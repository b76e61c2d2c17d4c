//! Obstacles the body can hit
//!
//! Each obstacle is mutated only by its own `update`; collision checks in
//! `sim::collision` read them and push the body.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{FishParams, FlipperConfig, PinConfig, PlatformConfig, WorldBounds};
use crate::rotate;

/// A fixed round pin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pin {
    pub pos: Vec2,
    pub radius: f32,
    /// Minimum sideways kick on hit
    pub force: f32,
    /// Extra random kick on top of `force`
    pub random_force: f32,
}

impl From<&PinConfig> for Pin {
    fn from(c: &PinConfig) -> Self {
        Self {
            pos: c.pos,
            radius: c.radius,
            force: c.force,
            random_force: c.random_force,
        }
    }
}

/// An axis-aligned platform sliding back and forth
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    pub speed: f32,
    /// -1 (left) or 1 (right)
    pub direction: f32,
}

impl From<&PlatformConfig> for Platform {
    fn from(c: &PlatformConfig) -> Self {
        Self {
            pos: c.pos,
            width: c.width,
            height: c.height,
            speed: c.speed,
            direction: c.direction,
        }
    }
}

impl Platform {
    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    /// Slide, reversing once an edge reaches the world bounds
    pub fn update(&mut self, world: &WorldBounds) {
        self.pos.x += self.speed * self.direction;
        if self.pos.x <= 0.0 || self.pos.x + self.width >= world.width {
            self.direction = -self.direction;
        }
    }

    /// Inclusive overlap with an axis-aligned square of half-extent `half`
    pub fn overlaps(&self, center: Vec2, half: f32) -> bool {
        center.y + half >= self.pos.y
            && center.y - half <= self.pos.y + self.height
            && center.x + half >= self.pos.x
            && center.x - half <= self.pos.x + self.width
    }
}

/// A paddle rotating about its pivot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flipper {
    pub pivot: Vec2,
    pub length: f32,
    pub width: f32,
    pub angle: f32,
    pub target_angle: f32,
    pub rest_angle: f32,
    pub active_angle: f32,
    /// Fraction of the remaining angle closed per tick
    pub rotation_speed: f32,
    pub active: bool,
}

impl From<&FlipperConfig> for Flipper {
    fn from(c: &FlipperConfig) -> Self {
        Self {
            pivot: c.pivot,
            length: c.length,
            width: c.width,
            angle: c.rest_angle,
            target_angle: c.rest_angle,
            rest_angle: c.rest_angle,
            active_angle: c.active_angle,
            rotation_speed: c.rotation_speed,
            active: false,
        }
    }
}

impl Flipper {
    /// Swing toward the active angle
    pub fn activate(&mut self) {
        self.active = true;
        self.target_angle = self.active_angle;
    }

    /// Swing back to rest
    pub fn deactivate(&mut self) {
        self.active = false;
        self.target_angle = self.rest_angle;
    }

    /// Ease the angle toward the target (first-order, no overshoot)
    pub fn update(&mut self) {
        self.angle += (self.target_angle - self.angle) * self.rotation_speed;
    }

    /// Paddle forward axis
    #[inline]
    pub fn axis(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// A world point in the paddle frame (x along the paddle, y across it)
    #[inline]
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        rotate(point - self.pivot, -self.angle)
    }
}

/// A fish swimming across the lower playfield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fish {
    pub id: u32,
    pub pos: Vec2,
    /// Diameter
    pub size: f32,
    /// Horizontal swim distance per tick (sign is heading)
    pub speed: f32,
    /// Knock-back velocity picked up from collisions
    pub vel: Vec2,
    pub bounce: f32,
    pub friction: f32,
    /// 0 at spawn, leaves the playfield at 1
    pub jump_progress: f32,
    /// Peak jump height (render hint)
    pub jump_height: f32,
}

impl Fish {
    /// Spawn just off a random side edge
    pub fn spawn(id: u32, world: &WorldBounds, params: &FishParams, rng: &mut impl Rng) -> Self {
        let heading = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
        let x = if heading > 0.0 { -50.0 } else { world.width + 50.0 };
        let y = world.height - 100.0 - rng.random::<f32>() * 200.0;
        Self {
            id,
            pos: Vec2::new(x, y),
            size: 20.0 + rng.random::<f32>() * 30.0,
            speed: (2.0 + rng.random::<f32>() * 2.0) * heading,
            vel: Vec2::ZERO,
            bounce: params.bounce,
            friction: params.friction,
            jump_progress: 0.0,
            jump_height: 50.0 + rng.random::<f32>() * 50.0,
        }
    }

    /// Swim and drift; knock-back decays by friction
    pub fn update(&mut self, jump_step: f32) {
        self.pos.x += self.speed;
        self.pos += self.vel;
        self.vel *= self.friction;
        self.jump_progress += jump_step;
    }

    /// Rendered height above the swim line
    pub fn jump_offset(&self) -> f32 {
        (self.jump_progress * std::f32::consts::PI).sin() * self.jump_height
    }

    /// Finished its jump or swam out of the world
    pub fn is_gone(&self, world: &WorldBounds) -> bool {
        self.jump_progress >= 1.0 || self.pos.x < -100.0 || self.pos.x > world.width + 100.0
    }
}
