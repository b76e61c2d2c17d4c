//! The rotating target wheel
//!
//! Slots sit at fixed angular offsets on a ring at 0.85 × radius. A body can
//! only drop into an unfilled slot of its own kind, and only once it is near
//! the rim. Filling is one-way; once every slot is filled the wheel is
//! complete for good.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::shapes::ShapeKind;
use crate::config::WheelConfig;
use crate::consts::{
    MATCH_DISTANCE_FACTOR, SLOT_RADIUS_FACTOR, WHEEL_ROTATE_STEP, WHEEL_TRAIL_LENGTH,
};
use crate::polar_to_cartesian;

/// Direction of a discrete wheel turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Turn {
    /// Decreasing angle (counter-clockwise on screen)
    Left,
    /// Increasing angle (clockwise on screen)
    Right,
}

impl Turn {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Turn::Left => -1.0,
            Turn::Right => 1.0,
        }
    }
}

/// One hole in the wheel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoleSlot {
    pub kind: ShapeKind,
    /// Offset from the wheel's zero angle (radians)
    pub angle: f32,
    filled: bool,
}

impl HoleSlot {
    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled
    }
}

/// A successful drop into a slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotMatch {
    pub slot: usize,
    pub kind: ShapeKind,
    /// Slot center in world space at match time
    pub pos: Vec2,
    /// Slot angle including wheel rotation
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wheel {
    pub center: Vec2,
    pub radius: f32,
    rotation: f32,
    slots: Vec<HoleSlot>,
    filled_count: usize,
    /// Recent rotations, oldest first (for the motion trail)
    rotation_trail: VecDeque<f32>,
}

impl From<&WheelConfig> for Wheel {
    fn from(c: &WheelConfig) -> Self {
        Self {
            center: c.center,
            radius: c.radius,
            rotation: 0.0,
            slots: c
                .slots
                .iter()
                .map(|s| HoleSlot {
                    kind: s.kind,
                    angle: s.angle,
                    filled: false,
                })
                .collect(),
            filled_count: 0,
            rotation_trail: VecDeque::with_capacity(WHEEL_TRAIL_LENGTH + 1),
        }
    }
}

impl Wheel {
    /// Accumulated rotation (radians)
    #[inline]
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn slots(&self) -> &[HoleSlot] {
        &self.slots
    }

    pub fn rotation_trail(&self) -> impl Iterator<Item = f32> + '_ {
        self.rotation_trail.iter().copied()
    }

    /// Turn one step; returns the new rotation
    pub fn rotate(&mut self, turn: Turn) -> f32 {
        self.rotation += turn.sign() * WHEEL_ROTATE_STEP;
        self.rotation_trail.push_back(self.rotation);
        if self.rotation_trail.len() > WHEEL_TRAIL_LENGTH {
            self.rotation_trail.pop_front();
        }
        self.rotation
    }

    /// World-space angle of a slot
    #[inline]
    pub fn slot_angle(&self, index: usize) -> f32 {
        self.slots[index].angle + self.rotation
    }

    /// World-space center of a slot
    pub fn slot_position(&self, index: usize) -> Vec2 {
        self.center + polar_to_cartesian(self.radius * SLOT_RADIUS_FACTOR, self.slot_angle(index))
    }

    /// Whether a body of `size` at `pos` is close enough to the rim to match
    pub fn near_rim(&self, pos: Vec2, size: f32) -> bool {
        let distance = pos.distance(self.center);
        distance >= self.radius - size && distance <= self.radius + size
    }

    /// Try to drop the body into a slot
    ///
    /// Slots are scanned in configured order and the first unfilled slot of
    /// the body's kind within reach wins, even if a later one is closer.
    pub fn check_collision(&mut self, body: &mut Body) -> Option<SlotMatch> {
        if body.is_matched() || !self.near_rim(body.pos, body.size) {
            return None;
        }

        let reach = body.size * MATCH_DISTANCE_FACTOR;
        let index = (0..self.slots.len()).find(|&i| {
            let slot = &self.slots[i];
            !slot.filled
                && slot.kind == body.kind
                && body.pos.distance(self.slot_position(i)) < reach
        })?;

        let found = SlotMatch {
            slot: index,
            kind: body.kind,
            pos: self.slot_position(index),
            angle: self.slot_angle(index),
        };
        self.slots[index].filled = true;
        self.filled_count += 1;
        body.start_match(index, found.pos, found.angle);
        Some(found)
    }

    #[inline]
    pub fn filled_count(&self) -> usize {
        self.filled_count
    }

    #[inline]
    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    /// Indices of filled slots, in slot order
    pub fn filled_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.filled)
            .map(|(i, _)| i)
    }

    /// Indices of slots still waiting for a body, in slot order
    pub fn unfilled_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.filled)
            .map(|(i, _)| i)
    }

    /// Every slot filled (terminal)
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.filled_count == self.slots.len()
    }
}
