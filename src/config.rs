//! Layout and tuning
//!
//! Everything the simulation needs to know about the world is injected through
//! a `LayoutConfig`. Layouts serialize to JSON and are validated on load so a
//! bad value is rejected up front instead of turning into NaN mid-run.

use std::f32::consts::PI;
use std::path::Path;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{self, ConfigError};
use crate::sim::shapes::ShapeKind;

/// Playfield size (origin top-left, +y down)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub width: f32,
    pub height: f32,
}

impl Default for WorldBounds {
    fn default() -> Self {
        // Portrait phone-ish playfield
        Self {
            width: 480.0,
            height: 800.0,
        }
    }
}

/// Physical constants for every spawned body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyParams {
    /// Edge length / diameter
    pub size: f32,
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Horizontal velocity retained per tick (and per pin hit)
    pub friction: f32,
    /// Restitution for every collision
    pub bounce: f32,
    /// Additive descent per tick while not boosted
    pub normal_speed: f32,
    /// Additive descent per tick while boosted
    pub fast_speed: f32,
    /// Spin per tick (radians)
    pub rotation_speed: f32,
}

impl Default for BodyParams {
    fn default() -> Self {
        Self {
            size: 30.0,
            gravity: 0.5,
            friction: 0.98,
            bounce: 0.7,
            normal_speed: 0.85,
            fast_speed: 3.4,
            rotation_speed: 0.02,
        }
    }
}

/// A fixed round pin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinConfig {
    pub pos: Vec2,
    #[serde(default = "PinConfig::default_radius")]
    pub radius: f32,
    /// Minimum sideways kick on hit
    #[serde(default = "PinConfig::default_force")]
    pub force: f32,
    /// Extra random kick on top of `force`
    #[serde(default = "PinConfig::default_random_force")]
    pub random_force: f32,
}

impl PinConfig {
    fn default_radius() -> f32 {
        5.0
    }

    fn default_force() -> f32 {
        2.0
    }

    fn default_random_force() -> f32 {
        1.0
    }

    /// Stock pin at `pos`
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            radius: Self::default_radius(),
            force: Self::default_force(),
            random_force: Self::default_random_force(),
        }
    }
}

/// A horizontally oscillating platform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Top-left corner
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Horizontal distance per tick
    pub speed: f32,
    /// Initial direction, -1 (left) or 1 (right)
    pub direction: f32,
}

/// Which side of the playfield a flipper guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperSide {
    Left,
    Right,
}

/// A rotating paddle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipperConfig {
    pub pivot: Vec2,
    pub length: f32,
    pub width: f32,
    /// Angle while idle (radians)
    pub rest_angle: f32,
    /// Angle while held (radians)
    pub active_angle: f32,
    /// Fraction of the remaining angle closed per tick, in (0, 1]
    pub rotation_speed: f32,
}

impl FlipperConfig {
    pub const LENGTH: f32 = 100.0;
    pub const WIDTH: f32 = 20.0;
    pub const ROTATION_SPEED: f32 = 0.3;

    /// Stock flipper whose outer end sits at `anchor`
    ///
    /// The pivot is half a paddle length inward from the anchor. The left
    /// flipper's angles are the right flipper's mirrored through π.
    pub fn anchored(side: FlipperSide, anchor: Vec2) -> Self {
        let (pivot_dx, rest_angle, active_angle) = match side {
            FlipperSide::Left => (Self::LENGTH / 2.0, PI / 4.0 + PI, PI / 6.0 + PI),
            FlipperSide::Right => (-Self::LENGTH / 2.0, -PI / 4.0, -PI / 6.0),
        };
        Self {
            pivot: Vec2::new(anchor.x + pivot_dx, anchor.y),
            length: Self::LENGTH,
            width: Self::WIDTH,
            rest_angle,
            active_angle,
            rotation_speed: Self::ROTATION_SPEED,
        }
    }
}

/// One wheel hole
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub kind: ShapeKind,
    /// Offset from the wheel's zero angle (radians)
    pub angle: f32,
}

/// The rotating target wheel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub center: Vec2,
    pub radius: f32,
    /// Holes in match priority order
    pub slots: Vec<SlotConfig>,
}

impl WheelConfig {
    /// Eight holes spaced evenly around the wheel
    pub fn stock(center: Vec2, radius: f32) -> Self {
        use ShapeKind::*;
        let kinds = [Triangle, Hexagon, Square, Star, Heart, Cross, Circle, Moon];
        let slots = kinds
            .into_iter()
            .enumerate()
            .map(|(i, kind)| SlotConfig {
                kind,
                angle: PI * 2.0 * i as f32 / 8.0,
            })
            .collect();
        Self {
            center,
            radius,
            slots,
        }
    }
}

/// Floating fish obstacles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FishParams {
    pub enabled: bool,
    /// Ticks between spawn rolls
    pub spawn_interval_ticks: u64,
    /// Chance per roll that a fish appears
    pub spawn_chance: f32,
    pub bounce: f32,
    pub friction: f32,
    /// Jump progress per tick; the fish leaves when progress reaches 1
    pub jump_step: f32,
}

impl Default for FishParams {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_interval_ticks: 60,
            spawn_chance: 0.1,
            bounce: 0.7,
            friction: 0.98,
            jump_step: 0.02,
        }
    }
}

/// Complete playfield description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub world: WorldBounds,
    pub body: BodyParams,
    pub pins: Vec<PinConfig>,
    pub platforms: Vec<PlatformConfig>,
    pub flippers: Vec<FlipperConfig>,
    pub wheel: WheelConfig,
    pub fish: FishParams,
    /// Ticks to wait before spawning when no body is active
    pub spawn_cooldown_ticks: u64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::generate(WorldBounds::default(), 0)
    }
}

impl LayoutConfig {
    /// Number of platforms in the stock layout
    pub const PLATFORM_COUNT: usize = 6;
    /// Platform thickness in the stock layout
    pub const PLATFORM_HEIGHT: f32 = 8.0;
    /// Wheel center sits this far above the bottom edge
    pub const WHEEL_BOTTOM_OFFSET: f32 = 150.0;
    /// Wheel radius as a fraction of the short world side
    pub const WHEEL_RADIUS_FACTOR: f32 = 0.255;

    /// Build the stock layout scaled to `world`
    ///
    /// Platform widths, positions, and some speeds are drawn from `seed`.
    pub fn generate(world: WorldBounds, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let (w, h) = (world.width, world.height);

        // Pins: three rows of 1, 2, 3, shifted right of center
        let mut pins = Vec::new();
        let start_y = h * 0.05;
        let row_step = h * 0.4 / 3.0;
        let right_offset = w * 0.1;
        for row in 0..3 {
            let y = start_y + row as f32 * row_step;
            let count = row + 1;
            let total_width = w * (0.3 + row as f32 * 0.2);
            let spacing = total_width / (count + 1) as f32;
            let start_x = (w - count as f32 * spacing) / 2.0 + right_offset;
            for i in 0..count {
                pins.push(PinConfig::at(Vec2::new(start_x + i as f32 * spacing, y)));
            }
        }

        // Platforms: evenly stacked through the upper half
        let top_half = h / 2.0;
        let min_y = top_half * 0.3;
        let max_y = top_half * 0.8;
        let y_step = (max_y - min_y) / (Self::PLATFORM_COUNT - 1) as f32;
        let platforms = (0..Self::PLATFORM_COUNT)
            .map(|i| {
                let width = (30.0 + rng.random::<f32>() * 20.0) * 1.5;
                let x = rng.random::<f32>() * (w - width).max(0.0);
                let speed = if i % 2 == 0 {
                    1.5 + rng.random::<f32>() * 2.0
                } else {
                    2.0
                };
                let direction = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
                PlatformConfig {
                    pos: Vec2::new(x, min_y + i as f32 * y_step),
                    width,
                    height: Self::PLATFORM_HEIGHT,
                    speed,
                    direction,
                }
            })
            .collect();

        // Wheel near the bottom, flippers flanking it a quarter of the way up
        let wheel_center = Vec2::new(w / 2.0, h - Self::WHEEL_BOTTOM_OFFSET);
        let wheel_radius = w.min(h) * Self::WHEEL_RADIUS_FACTOR;
        let flipper_base = wheel_center.y + 20.0;
        let flipper_y = flipper_base - flipper_base * 0.25;
        let flippers = vec![
            FlipperConfig::anchored(FlipperSide::Left, Vec2::new(w * 0.05, flipper_y)),
            FlipperConfig::anchored(FlipperSide::Right, Vec2::new(w * 0.95, flipper_y)),
        ];

        Self {
            world,
            body: BodyParams::default(),
            pins,
            platforms,
            flippers,
            wheel: WheelConfig::stock(wheel_center, wheel_radius),
            fish: FishParams::default(),
            spawn_cooldown_ticks: crate::consts::SPAWN_COOLDOWN_TICKS,
        }
    }

    /// Reject values that would poison the integrator
    pub fn validate(&self) -> Result<(), ConfigError> {
        error::positive("world.width", self.world.width)?;
        error::positive("world.height", self.world.height)?;

        let b = &self.body;
        error::positive("body.size", b.size)?;
        error::non_negative("body.gravity", b.gravity)?;
        error::in_range("body.friction", b.friction, 0.0, 1.0)?;
        error::in_range("body.bounce", b.bounce, 0.0, 1.0)?;
        error::non_negative("body.normal_speed", b.normal_speed)?;
        error::non_negative("body.fast_speed", b.fast_speed)?;
        error::finite("body.rotation_speed", b.rotation_speed)?;

        for (i, pin) in self.pins.iter().enumerate() {
            check_point(&format!("pins[{i}].pos"), pin.pos)?;
            error::positive(&format!("pins[{i}].radius"), pin.radius)?;
            error::non_negative(&format!("pins[{i}].force"), pin.force)?;
            error::non_negative(&format!("pins[{i}].random_force"), pin.random_force)?;
        }

        for (i, p) in self.platforms.iter().enumerate() {
            check_point(&format!("platforms[{i}].pos"), p.pos)?;
            error::positive(&format!("platforms[{i}].width"), p.width)?;
            // A platform wider than the world reverses every tick
            error::in_range(&format!("platforms[{i}].width"), p.width, 0.0, self.world.width)?;
            error::positive(&format!("platforms[{i}].height"), p.height)?;
            error::non_negative(&format!("platforms[{i}].speed"), p.speed)?;
            error::direction(&format!("platforms[{i}].direction"), p.direction)?;
        }

        for (i, f) in self.flippers.iter().enumerate() {
            check_point(&format!("flippers[{i}].pivot"), f.pivot)?;
            error::positive(&format!("flippers[{i}].length"), f.length)?;
            error::positive(&format!("flippers[{i}].width"), f.width)?;
            error::finite(&format!("flippers[{i}].rest_angle"), f.rest_angle)?;
            error::finite(&format!("flippers[{i}].active_angle"), f.active_angle)?;
            error::positive(&format!("flippers[{i}].rotation_speed"), f.rotation_speed)?;
            error::in_range(
                &format!("flippers[{i}].rotation_speed"),
                f.rotation_speed,
                0.0,
                1.0,
            )?;
        }

        check_point("wheel.center", self.wheel.center)?;
        error::positive("wheel.radius", self.wheel.radius)?;
        if self.wheel.slots.is_empty() {
            return Err(ConfigError::EmptyWheel);
        }
        for (i, slot) in self.wheel.slots.iter().enumerate() {
            error::finite(&format!("wheel.slots[{i}].angle"), slot.angle)?;
        }

        let fish = &self.fish;
        error::in_range("fish.spawn_chance", fish.spawn_chance, 0.0, 1.0)?;
        error::in_range("fish.bounce", fish.bounce, 0.0, 1.0)?;
        error::in_range("fish.friction", fish.friction, 0.0, 1.0)?;
        error::positive("fish.jump_step", fish.jump_step)?;

        Ok(())
    }

    /// Parse and validate a JSON layout
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let layout: Self = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a JSON layout file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout = Self::from_json(&json)?;
        log::info!(
            "Loaded layout from {} ({} pins, {} platforms, {} flippers, {} slots)",
            path.display(),
            layout.pins.len(),
            layout.platforms.len(),
            layout.flippers.len(),
            layout.wheel.slots.len()
        );
        Ok(layout)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Layout saved to {}", path.display());
        Ok(())
    }
}

fn check_point(field: &str, p: Vec2) -> Result<(), ConfigError> {
    error::finite(&format!("{field}.x"), p.x)?;
    error::finite(&format!("{field}.y"), p.y)?;
    Ok(())
}
