//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (configured array order)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod obstacles;
pub mod shapes;
pub mod state;
pub mod tick;
pub mod wheel;

pub use body::{Body, MatchPose, TrailPoint};
pub use collision::{Contact, apply_impulse};
pub use obstacles::{Fish, Flipper, Pin, Platform};
pub use shapes::{FillLayer, FillMode, PathOp, ShapeDescriptor, ShapeKind};
pub use state::{PauseButton, SimEvent, SimPhase, SimState};
pub use tick::{
    FixedStep, FlipperCommand, FlipperTarget, Pointer, TickInput, autopilot_input, tick,
};
pub use wheel::{HoleSlot, SlotMatch, Turn, Wheel};
