//! Collision detection and response
//!
//! Every response is built on the same elastic impulse along a contact
//! normal. Detection and response are split so tests and tools can inspect a
//! contact without moving the body.

use glam::Vec2;
use rand::Rng;

use super::body::Body;
use super::obstacles::{Fish, Flipper, Pin, Platform};
use crate::consts::{FLIPPER_BOOST, FLIPPER_TIP_SLOP, SEPARATION_FACTOR};

/// Contact between the body and an obstacle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal pointing from the obstacle toward the body
    pub normal: Vec2,
    /// Overlap depth along the normal
    pub penetration: f32,
}

/// Elastic impulse: v' = v - (1 + e)(v·n)n
#[inline]
pub fn apply_impulse(velocity: Vec2, normal: Vec2, bounce: f32) -> Vec2 {
    let impulse = -(1.0 + bounce) * velocity.dot(normal);
    velocity + impulse * normal
}

/// Unit normal from `from` to `to`, or `None` when the points coincide
#[inline]
fn separation_normal(from: Vec2, to: Vec2) -> Option<(Vec2, f32)> {
    let delta = to - from;
    let distance = delta.length();
    if distance > f32::EPSILON && distance.is_finite() {
        Some((delta / distance, distance))
    } else {
        None
    }
}

/// Circle-circle contact between the body and a pin
pub fn pin_contact(body: &Body, pin: &Pin) -> Option<Contact> {
    let reach = pin.radius + body.half_size();
    let (normal, distance) = separation_normal(pin.pos, body.pos)?;
    (distance < reach).then_some(Contact {
        normal,
        penetration: reach - distance,
    })
}

/// Bounce off a pin with a random sideways kick
///
/// Order: impulse, friction on both axes, kick, push-out.
pub fn resolve_pin(body: &mut Body, pin: &Pin, rng: &mut impl Rng) -> bool {
    let Some(contact) = pin_contact(body, pin) else {
        return false;
    };

    body.vel = apply_impulse(body.vel, contact.normal, body.bounce);
    body.vel *= body.friction;

    let side = if rng.random_bool(0.5) { -1.0 } else { 1.0 };
    let kick = pin.force + rng.random::<f32>() * pin.random_force;
    body.vel.x += side * kick;

    body.pos += contact.normal * contact.penetration * SEPARATION_FACTOR;
    true
}

/// Land on top of a platform
///
/// Only a descending body is caught; a rising body passes through.
pub fn resolve_platform(body: &mut Body, platform: &Platform) -> bool {
    if !platform.overlaps(body.pos, body.half_size()) || body.vel.y <= 0.0 {
        return false;
    }

    body.pos.y = platform.top() - body.half_size();
    body.vel.y = -body.vel.y * body.bounce;
    body.on_platform = true;
    true
}

/// Contact with a flipper paddle
///
/// The normal is the paddle's forward axis rather than the true surface
/// normal, which is what gives flippers their characteristic throw.
pub fn flipper_contact(body: &Body, flipper: &Flipper) -> Option<Contact> {
    let local = flipper.to_local(body.pos);
    let reach = flipper.width / 2.0 + body.half_size();
    let along = local.x >= 0.0 && local.x <= flipper.length + FLIPPER_TIP_SLOP;
    let across = local.y.abs() <= reach;
    (along && across).then(|| Contact {
        normal: flipper.axis(),
        penetration: reach - local.y.abs(),
    })
}

/// Bounce off a flipper and get lofted
pub fn resolve_flipper(body: &mut Body, flipper: &Flipper) -> bool {
    let Some(contact) = flipper_contact(body, flipper) else {
        return false;
    };

    body.vel = apply_impulse(body.vel, contact.normal, body.bounce);
    body.vel.y -= FLIPPER_BOOST;
    body.pos += contact.normal * contact.penetration * SEPARATION_FACTOR;
    true
}

/// Circle-circle contact between the body and a fish
pub fn fish_contact(body: &Body, fish: &Fish) -> Option<Contact> {
    let reach = (fish.size + body.size) / 2.0;
    let (normal, distance) = separation_normal(fish.pos, body.pos)?;
    (distance < reach).then_some(Contact {
        normal,
        penetration: reach - distance,
    })
}

/// Two-body bounce between the body and a fish
///
/// Both sides take an impulse from the shared relative velocity, each scaled
/// by its own restitution. Only the fish is jittered and damped afterwards.
pub fn resolve_fish(body: &mut Body, fish: &mut Fish, rng: &mut impl Rng) -> bool {
    let Some(contact) = fish_contact(body, fish) else {
        return false;
    };
    let n = contact.normal;

    let approach = (body.vel - fish.vel).dot(n);
    body.vel += -(1.0 + body.bounce) * approach * n;
    fish.vel -= -(1.0 + fish.bounce) * approach * n;

    let push = n * contact.penetration * SEPARATION_FACTOR;
    body.pos += push;
    fish.pos -= push;

    fish.vel += Vec2::new(rng.random::<f32>() - 0.5, rng.random::<f32>() - 0.5) * 2.0;
    fish.vel *= fish.friction;
    true
}
