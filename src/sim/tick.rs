//! Fixed timestep simulation tick
//!
//! Advances the simulation deterministically, one tick at a time, in a fixed
//! order: obstacles move first, then the body integrates and is tested
//! against pins, platforms, fish, the wheel, and finally the flippers.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::Body;
use super::collision::{resolve_fish, resolve_flipper, resolve_pin, resolve_platform};
use super::state::{SimEvent, SimPhase, SimState};
use super::wheel::Turn;
use crate::consts::*;
use crate::normalize_angle;

/// Which flippers a command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperTarget {
    All,
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipperCommand {
    pub target: FlipperTarget,
    pub active: bool,
}

/// Pointer activity relevant to the pause button
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pointer {
    Down(Vec2),
    Move(Vec2),
    Up,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn the wheel one step
    pub rotate: Option<Turn>,
    /// Switch the descent boost on or off
    pub fast: Option<bool>,
    pub flippers: Vec<FlipperCommand>,
    /// Pause toggle
    pub pause: bool,
    /// Pointer event for the on-wheel pause button
    pub pointer: Option<Pointer>,
}

impl TickInput {
    /// Clear inputs that must only apply once
    pub fn clear_one_shots(&mut self) {
        self.rotate = None;
        self.pause = false;
        self.pointer = None;
        self.flippers.clear();
    }
}

/// Outcome of stepping the body
enum Flow {
    Continue,
    /// Run ended this tick
    Ended,
}

/// Advance the simulation by one fixed timestep
///
/// Events left over from the previous tick are discarded; drain them after
/// every call.
pub fn tick(state: &mut SimState, input: &TickInput) {
    if state.phase.is_terminal() {
        return;
    }
    state.clear_events();

    // The clock runs while paused so a press on the pause button can resolve
    state.clock_ticks += 1;
    apply_input(state, input);
    state.poll_pause_button();

    if state.phase != SimPhase::Running {
        return;
    }
    state.sim_ticks += 1;

    // 1. Obstacles
    let world = state.world;
    for platform in &mut state.platforms {
        platform.update(&world);
    }
    for flipper in &mut state.flippers {
        flipper.update();
    }
    if let Some(pose) = &mut state.match_animation {
        pose.advance();
    }
    roll_fish_spawn(state);

    // 2-9. Body
    if let Some(body) = state.body.take() {
        if let Flow::Ended = step_body(state, body) {
            return;
        }
    }

    // 10. Spawn after cooldown
    if state.body.is_none() && state.spawn_ready() {
        state.spawn_body();
    }

    // 11. Completion
    if state.wheel.is_complete() {
        state.win();
    }
}

fn apply_input(state: &mut SimState, input: &TickInput) {
    if input.pause {
        state.toggle_pause();
    }
    match input.pointer {
        Some(Pointer::Down(pos) | Pointer::Move(pos)) => {
            state.press_pause_button(pos);
        }
        Some(Pointer::Up) => state.release_pause_button(),
        None => {}
    }
    if let Some(turn) = input.rotate {
        state.rotate_wheel(turn);
    }
    if let Some(fast) = input.fast {
        state.set_speed(fast);
    }
    for command in &input.flippers {
        match (command.target, command.active) {
            (FlipperTarget::All, true) => state.activate_flippers(),
            (FlipperTarget::All, false) => state.deactivate_flippers(),
            (FlipperTarget::Index(i), true) => state.activate_flipper(i),
            (FlipperTarget::Index(i), false) => state.deactivate_flipper(i),
        }
    }
}

/// Roll for a new fish every spawn interval
fn roll_fish_spawn(state: &mut SimState) {
    let params = state.fish_params;
    if !params.enabled || state.sim_ticks.checked_rem(params.spawn_interval_ticks) != Some(0) {
        return;
    }
    if state.rng.random::<f32>() < params.spawn_chance {
        state.spawn_fish();
    }
}

/// Steps 2 to 9 for the active body (taken out of `state` for the duration)
fn step_body(state: &mut SimState, mut body: Body) -> Flow {
    // 2. Integrate
    body.integrate(&state.world);

    // 3. Pins (every pin, every tick)
    for i in 0..state.pins.len() {
        if resolve_pin(&mut body, &state.pins[i], &mut state.rng) {
            log::debug!("Body {} hit pin {}", body.id, i);
            state.emit(SimEvent::PinHit { pin: i });
        }
    }

    // 4. Platforms (first hit wins)
    body.on_platform = false;
    let landed = (0..state.platforms.len())
        .find(|&i| resolve_platform(&mut body, &state.platforms[i]));
    if let Some(i) = landed {
        log::debug!("Body {} landed on platform {}", body.id, i);
        state.emit(SimEvent::PlatformHit { platform: i });
    }

    // 5. Fish
    for i in 0..state.fish.len() {
        if resolve_fish(&mut body, &mut state.fish[i], &mut state.rng) {
            let fish = state.fish[i].id;
            log::debug!("Body {} bumped fish {}", body.id, fish);
            state.emit(SimEvent::FishHit { fish });
        }
    }

    // 6. Bookkeeping: spin and trail, fish swim and leave
    body.record_trail();
    let jump_step = state.fish_params.jump_step;
    for fish in &mut state.fish {
        fish.update(jump_step);
    }
    let world = state.world;
    state.fish.retain(|f| !f.is_gone(&world));

    // 7. Wheel
    if let Some(found) = state.wheel.check_collision(&mut body) {
        state.score += 1;
        state.match_animation = body.matched;
        state.last_spawn_tick = Some(state.sim_ticks);
        log::info!(
            "Body {} ({}) dropped into slot {} ({}/{}), score {}",
            body.id,
            found.kind,
            found.slot,
            state.wheel.filled_count(),
            state.wheel.total_slots(),
            state.score
        );
        state.emit(SimEvent::Matched {
            body: body.id,
            kind: found.kind,
            slot: found.slot,
        });

        // Matched body leaves play; the next one drops in this same tick
        if !state.spawn_body() {
            state.win();
            return Flow::Ended;
        }
        return Flow::Continue;
    }

    // 8. Fell out of the world
    if body.pos.y > state.world.height {
        state.body = Some(body);
        state.lose();
        return Flow::Ended;
    }

    // 9. Flippers
    for i in 0..state.flippers.len() {
        if resolve_flipper(&mut body, &state.flippers[i]) {
            log::debug!("Body {} hit flipper {}", body.id, i);
            state.emit(SimEvent::FlipperHit { flipper: i });
        }
    }

    state.body = Some(body);
    Flow::Continue
}

/// Host-side fixed-step driver
///
/// Accumulates frame time and runs whole ticks, bounded per frame to avoid a
/// spiral of death after a long stall.
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    accumulator: f32,
    /// Events from every tick of the latest `advance`
    events: Vec<SimEvent>,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the ticks covered by `frame_dt` seconds; returns how many ran
    ///
    /// One-shot inputs are cleared after the first tick that sees them.
    /// Events of every substep are collected for [`FixedStep::drain_events`].
    pub fn advance(&mut self, state: &mut SimState, input: &mut TickInput, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DT)
        } else {
            0.0
        };
        self.accumulator += dt;
        self.events.clear();

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(state, input);
            self.events.append(&mut state.drain_events());
            self.accumulator -= SIM_DT;
            substeps += 1;
            input.clear_one_shots();
        }

        // No backlog survives a pause or the end of the run
        match state.phase {
            SimPhase::Paused => self.accumulator = self.accumulator.min(SIM_DT),
            SimPhase::Won | SimPhase::Lost => self.accumulator = 0.0,
            SimPhase::Running => {}
        }
        substeps
    }

    /// Take the events of the latest `advance`, in tick order
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Demo-mode player: steer the nearest matching slot under the body
pub fn autopilot_input(state: &SimState) -> TickInput {
    let mut input = TickInput::default();
    let Some(body) = state.body.as_ref().filter(|_| state.is_running()) else {
        return input;
    };

    let wheel = &state.wheel;
    let ring = wheel.radius * SLOT_RADIUS_FACTOR;
    // Point on the top of the slot ring straight below the body
    let dx = (body.pos.x - wheel.center.x).clamp(-ring, ring);
    let target = (-(ring * ring - dx * dx).max(0.0).sqrt()).atan2(dx);

    let best = wheel
        .unfilled_indices()
        .filter(|&i| wheel.slots()[i].kind == body.kind)
        .map(|i| normalize_angle(target - wheel.slot_angle(i)))
        .min_by(|a, b| a.abs().total_cmp(&b.abs()));

    if let Some(delta) = best {
        if delta.abs() > WHEEL_ROTATE_STEP / 2.0 {
            input.rotate = Some(if delta > 0.0 { Turn::Right } else { Turn::Left });
        }
        input.fast = Some(delta.abs() < WHEEL_ROTATE_STEP);
    }

    input.flippers = state
        .flippers
        .iter()
        .enumerate()
        .map(|(i, f)| FlipperCommand {
            target: FlipperTarget::Index(i),
            active: body.pos.distance(f.pivot) < f.length,
        })
        .collect();
    input
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        FlipperConfig, LayoutConfig, PinConfig, PlatformConfig, SlotConfig, WorldBounds,
    };
    use crate::sim::shapes::ShapeKind;
    use proptest::prelude::*;
    use std::f32::consts::FRAC_PI_2;

    /// No pins, platforms, flippers, or fish
    fn open_layout() -> LayoutConfig {
        let mut layout = LayoutConfig::default();
        layout.pins.clear();
        layout.platforms.clear();
        layout.flippers.clear();
        layout.fish.enabled = false;
        layout
    }

    fn single_slot_layout(angles: &[f32]) -> LayoutConfig {
        let mut layout = open_layout();
        layout.wheel.slots = angles
            .iter()
            .map(|&angle| SlotConfig {
                kind: ShapeKind::Circle,
                angle,
            })
            .collect();
        layout
    }

    /// Flat paddle lying across the spawn point
    fn spawn_flipper() -> FlipperConfig {
        FlipperConfig {
            pivot: Vec2::new(190.0, 0.0),
            length: 100.0,
            width: 20.0,
            rest_angle: 0.0,
            active_angle: 0.0,
            rotation_speed: 0.3,
        }
    }

    #[test]
    fn test_tick_moves_body_and_obstacles() {
        let mut state = SimState::new(&LayoutConfig::default(), 12345).unwrap();
        let y = state.body.as_ref().unwrap().pos.y;
        let platform_x = state.platforms[0].pos.x;

        tick(&mut state, &TickInput::default());

        assert_eq!(state.sim_ticks, 1);
        assert_eq!(state.clock_ticks, 1);
        assert!(state.body.as_ref().unwrap().pos.y > y);
        assert_ne!(state.platforms[0].pos.x, platform_x);
    }

    #[test]
    fn test_tick_pause_freezes_simulation() {
        let mut state = SimState::new(&LayoutConfig::default(), 12345).unwrap();
        tick(&mut state, &TickInput::default());

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.phase, SimPhase::Paused);

        let body_pos = state.body.as_ref().unwrap().pos;
        let platform_pos = state.platforms[0].pos;
        let sim_ticks = state.sim_ticks;
        for _ in 0..30 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.body.as_ref().unwrap().pos, body_pos);
        assert_eq!(state.platforms[0].pos, platform_pos);
        assert_eq!(state.sim_ticks, sim_ticks);
        assert_eq!(state.clock_ticks, 32);

        // Commands still land while paused
        let rotate = TickInput {
            rotate: Some(Turn::Right),
            ..Default::default()
        };
        tick(&mut state, &rotate);
        assert!((state.wheel.rotation() - WHEEL_ROTATE_STEP).abs() < 1e-6);

        // Unpausing resumes with no backlog
        tick(&mut state, &pause);
        assert_eq!(state.phase, SimPhase::Running);
        assert_eq!(state.sim_ticks, sim_ticks + 1);
    }

    #[test]
    fn test_pause_button_long_press() {
        let mut state = SimState::new(&open_layout(), 1).unwrap();
        let center = state.wheel.center;
        let down = TickInput {
            pointer: Some(Pointer::Down(center)),
            ..Default::default()
        };

        tick(&mut state, &down);
        assert!(state.pause_button.is_armed());
        for _ in 0..(PAUSE_CONFIRM_TICKS - 1) {
            tick(&mut state, &TickInput::default());
            assert_eq!(state.phase, SimPhase::Running);
        }
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, SimPhase::Paused);
        assert!(!state.pause_button.is_armed());

        // The same gesture while paused resumes
        tick(&mut state, &down);
        for _ in 0..PAUSE_CONFIRM_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, SimPhase::Running);
    }

    #[test]
    fn test_pause_button_rejects_tap_and_drift() {
        let mut state = SimState::new(&open_layout(), 1).unwrap();
        let center = state.wheel.center;
        let pointer = |p: Pointer| TickInput {
            pointer: Some(p),
            ..Default::default()
        };

        // Released after a single tick
        tick(&mut state, &pointer(Pointer::Down(center)));
        tick(&mut state, &pointer(Pointer::Up));
        for _ in 0..PAUSE_CONFIRM_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, SimPhase::Running);

        // Held but dragged across the button
        let dragged = center + Vec2::new(PAUSE_MAX_DRIFT + 5.0, 0.0);
        tick(&mut state, &pointer(Pointer::Down(center)));
        tick(&mut state, &pointer(Pointer::Move(dragged)));
        for _ in 0..PAUSE_CONFIRM_TICKS {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.phase, SimPhase::Running);

        // Leaving the button cancels the press
        tick(&mut state, &pointer(Pointer::Down(center)));
        tick(&mut state, &pointer(Pointer::Move(Vec2::ZERO)));
        assert!(!state.pause_button.is_armed());
    }

    #[test]
    fn test_body_on_pin_center_stays_finite() {
        let mut layout = open_layout();
        layout.pins = vec![PinConfig::at(Vec2::new(100.0, 100.0))];
        let mut state = SimState::new(&layout, 7).unwrap();
        if let Some(body) = &mut state.body {
            body.pos = Vec2::new(100.0, 100.0);
        }

        tick(&mut state, &TickInput::default());

        assert!(state.is_finite());
        let body = state.body.as_ref().unwrap();
        assert!(body.pos.is_finite() && body.vel.is_finite());
    }

    #[test]
    fn test_body_below_world_loses() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        let height = state.world.height;
        if let Some(body) = &mut state.body {
            body.pos = Vec2::new(40.0, height - 1.0);
            body.vel = Vec2::new(0.0, 5.0);
        }

        tick(&mut state, &TickInput::default());

        assert_eq!(state.phase, SimPhase::Lost);
        assert!(state.body.is_none());
        assert!(state.drain_events().contains(&SimEvent::Lost));

        // Terminal: nothing moves any more
        let clock = state.clock_ticks;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.clock_ticks, clock);
    }

    #[test]
    fn test_last_match_wins() {
        let mut state = SimState::new(&single_slot_layout(&[-FRAC_PI_2]), 3).unwrap();
        let slot = state.wheel.slot_position(0);
        if let Some(body) = &mut state.body {
            body.pos = slot;
        }

        tick(&mut state, &TickInput::default());

        assert_eq!(state.phase, SimPhase::Won);
        assert_eq!(state.score, 1);
        assert!(state.body.is_none());
        assert!(state.wheel.is_complete());
        let pose = state.match_animation.unwrap();
        assert_eq!(pose.slot, 0);

        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::Matched { slot: 0, .. })));
        assert_eq!(events.last(), Some(&SimEvent::Won));
    }

    #[test]
    fn test_match_respawns_in_same_tick() {
        let mut state = SimState::new(&single_slot_layout(&[-FRAC_PI_2, FRAC_PI_2]), 3).unwrap();
        let first = state.body.as_ref().unwrap().id;
        let slot = state.wheel.slot_position(0);
        if let Some(body) = &mut state.body {
            body.pos = slot;
        }

        tick(&mut state, &TickInput::default());

        assert_eq!(state.phase, SimPhase::Running);
        let next = state.body.as_ref().unwrap();
        assert_ne!(next.id, first);
        assert_eq!(next.pos.y, 0.0);
        assert_eq!(state.last_spawn_tick, Some(state.sim_ticks));
        assert_eq!(state.wheel.filled_indices().collect::<Vec<_>>(), vec![0]);

        // The pose keeps animating on later ticks
        tick(&mut state, &TickInput::default());
        assert!(state.match_animation.unwrap().scale > 0.8);
    }

    #[test]
    fn test_spawn_waits_for_cooldown() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        state.body = None;
        state.last_spawn_tick = Some(state.sim_ticks);

        for _ in 0..(SPAWN_COOLDOWN_TICKS - 1) {
            tick(&mut state, &TickInput::default());
            assert!(state.body.is_none());
        }
        tick(&mut state, &TickInput::default());
        assert!(state.body.is_some());
    }

    #[test]
    fn test_fish_spawn_and_cull() {
        let mut layout = open_layout();
        layout.fish.enabled = true;
        layout.fish.spawn_chance = 1.0;
        layout.fish.spawn_interval_ticks = 10;
        let mut state = SimState::new(&layout, 8).unwrap();
        // Keep the body alive and away from everything
        for _ in 0..10 {
            if let Some(body) = &mut state.body {
                body.pos = Vec2::new(20.0, 20.0);
                body.vel = Vec2::ZERO;
            }
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.fish.len(), 1);

        for _ in 0..60 {
            if let Some(body) = &mut state.body {
                body.pos = Vec2::new(20.0, 20.0);
                body.vel = Vec2::ZERO;
            }
            tick(&mut state, &TickInput::default());
        }
        // Every fish leaves within 50 ticks of spawning
        assert!(state.fish.iter().all(|f| f.jump_progress < 1.0));
        assert!(state.fish.len() <= 5);
    }

    #[test]
    fn test_flipper_commands() {
        let mut state = SimState::new(&LayoutConfig::default(), 3).unwrap();
        let first_on = TickInput {
            flippers: vec![FlipperCommand {
                target: FlipperTarget::Index(0),
                active: true,
            }],
            ..Default::default()
        };
        tick(&mut state, &first_on);
        assert!(state.flippers[0].active);
        assert!(!state.flippers[1].active);

        let all_off = TickInput {
            flippers: vec![
                FlipperCommand {
                    target: FlipperTarget::All,
                    active: false,
                },
                FlipperCommand {
                    target: FlipperTarget::Index(9),
                    active: true,
                },
            ],
            ..Default::default()
        };
        tick(&mut state, &all_off);
        assert!(state.flippers.iter().all(|f| !f.active));
    }

    #[test]
    fn test_every_pin_checked_each_tick() {
        let mut layout = open_layout();
        layout.pins = vec![
            PinConfig::at(Vec2::new(88.0, 101.0)),
            PinConfig::at(Vec2::new(122.0, 101.0)),
        ];
        let mut state = SimState::new(&layout, 7).unwrap();
        if let Some(body) = &mut state.body {
            body.pos = Vec2::new(105.0, 100.0);
            body.vel = Vec2::ZERO;
        }

        tick(&mut state, &TickInput::default());

        // Pushed off the first pin straight into the second
        let hits: Vec<SimEvent> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::PinHit { .. }))
            .collect();
        assert_eq!(hits, vec![SimEvent::PinHit { pin: 0 }, SimEvent::PinHit { pin: 1 }]);
    }

    #[test]
    fn test_first_platform_wins_and_landing_clears() {
        let mut layout = open_layout();
        let platform = |y: f32| PlatformConfig {
            pos: Vec2::new(50.0, y),
            width: 100.0,
            height: 8.0,
            speed: 0.0,
            direction: 1.0,
        };
        layout.platforms = vec![platform(200.0), platform(205.0)];
        let mut state = SimState::new(&layout, 7).unwrap();
        if let Some(body) = &mut state.body {
            body.pos = Vec2::new(100.0, 184.0);
            body.vel = Vec2::new(0.0, 2.0);
        }

        tick(&mut state, &TickInput::default());

        let landings: Vec<SimEvent> = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, SimEvent::PlatformHit { .. }))
            .collect();
        assert_eq!(landings, vec![SimEvent::PlatformHit { platform: 0 }]);
        let body = state.body.as_ref().unwrap();
        assert!(body.on_platform);
        assert_eq!(body.pos.y, 185.0);
        assert!(body.vel.y < 0.0);

        // Bounced clear: the flag drops on the next tick
        tick(&mut state, &TickInput::default());
        let events = state.drain_events();
        assert!(!events.iter().any(|e| matches!(e, SimEvent::PlatformHit { .. })));
        assert!(!state.body.as_ref().unwrap().on_platform);
    }

    #[test]
    fn test_flipper_hit_after_integration() {
        let mut layout = open_layout();
        layout.flippers = vec![spawn_flipper()];
        let mut state = SimState::new(&layout, 7).unwrap();
        let vy = state.body.as_ref().unwrap().vel.y;

        tick(&mut state, &TickInput::default());

        assert!(state.drain_events().contains(&SimEvent::FlipperHit { flipper: 0 }));
        // Lofted by the boost
        assert!(state.body.as_ref().unwrap().vel.y < vy);
    }

    #[test]
    fn test_match_skips_flippers() {
        let mut layout = single_slot_layout(&[-FRAC_PI_2, FRAC_PI_2]);
        layout.flippers = vec![spawn_flipper()];
        let mut state = SimState::new(&layout, 3).unwrap();
        let first = state.body.as_ref().unwrap().id;
        let slot = state.wheel.slot_position(0);
        if let Some(body) = &mut state.body {
            body.pos = slot;
        }

        tick(&mut state, &TickInput::default());

        // The replacement spawns on the paddle but is not hit this tick
        let events = state.drain_events();
        assert!(events.iter().any(|e| matches!(e, SimEvent::Matched { slot: 0, .. })));
        assert!(!events.iter().any(|e| matches!(e, SimEvent::FlipperHit { .. })));
        let next = state.body.as_ref().unwrap();
        assert_ne!(next.id, first);
        assert_eq!(next.pos, Vec2::new(state.world.width / 2.0, 0.0));
    }

    #[test]
    fn test_events_hold_only_latest_tick() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        let rotate = TickInput {
            rotate: Some(Turn::Right),
            ..Default::default()
        };

        tick(&mut state, &rotate);
        tick(&mut state, &TickInput::default());

        // Neither the spawn nor the turn is still buffered
        assert!(state.drain_events().is_empty());

        tick(&mut state, &rotate);
        let events = state.drain_events();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SimEvent::WheelRotated { .. }));
    }

    #[test]
    fn test_same_seed_same_run() {
        let layout = LayoutConfig::generate(WorldBounds::default(), 99);
        let mut a = SimState::new(&layout, 99).unwrap();
        let mut b = SimState::new(&layout, 99).unwrap();

        for i in 0..600u32 {
            let input = TickInput {
                rotate: (i % 7 == 0).then_some(Turn::Left),
                fast: Some(i % 90 > 45),
                ..Default::default()
            };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_fixed_step_runs_whole_ticks() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        let mut driver = FixedStep::new();
        let mut input = TickInput {
            rotate: Some(Turn::Right),
            ..Default::default()
        };

        assert_eq!(driver.advance(&mut state, &mut input, 0.04), 2);
        // Rotate is one-shot
        assert!((state.wheel.rotation() - WHEEL_ROTATE_STEP).abs() < 1e-6);
        assert!(input.rotate.is_none());
        // The first substep's events survive the second
        let events = driver.drain_events();
        assert!(matches!(events.as_slice(), [SimEvent::WheelRotated { .. }]));
        assert!(state.drain_events().is_empty());

        // A long stall is clamped
        let ran = driver.advance(&mut state, &mut input, 5.0);
        assert!((5..=6).contains(&ran));
        assert_eq!(driver.advance(&mut state, &mut input, f32::NAN), 0);
    }

    #[test]
    fn test_autopilot_steers_toward_matching_slot() {
        let mut state = SimState::new(&single_slot_layout(&[0.0]), 3).unwrap();
        // Slot sits at 3 o'clock; the body falls at the wheel's centre line
        let input = autopilot_input(&state);
        assert_eq!(input.rotate, Some(Turn::Left));

        for _ in 0..40 {
            state.rotate_wheel(Turn::Left);
            if autopilot_input(&state).rotate.is_none() {
                break;
            }
        }
        let aligned = autopilot_input(&state);
        assert_eq!(aligned.rotate, None);
        assert_eq!(aligned.fast, Some(true));
    }

    #[test]
    fn test_autopilot_session_runs_clean() {
        let layout = LayoutConfig::generate(WorldBounds::default(), 5);
        let mut state = SimState::new(&layout, 5).unwrap();
        for _ in 0..20_000 {
            if state.phase.is_terminal() {
                break;
            }
            let input = autopilot_input(&state);
            tick(&mut state, &input);
            assert!(state.is_finite());
        }
        assert!(state.score as usize <= state.wheel.total_slots());
        assert_eq!(state.score as usize, state.wheel.filled_count());
    }

    fn arb_input() -> impl Strategy<Value = TickInput> {
        (
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
            prop::option::of(any::<bool>()),
            0u8..40,
        )
            .prop_map(|(rotate, fast, flip, pause_roll)| TickInput {
                rotate: rotate.map(|right| if right { Turn::Right } else { Turn::Left }),
                fast,
                flippers: flip
                    .map(|active| {
                        vec![FlipperCommand {
                            target: FlipperTarget::All,
                            active,
                        }]
                    })
                    .unwrap_or_default(),
                pause: pause_roll == 0,
                pointer: None,
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_tick_never_produces_nan(
            seed in any::<u64>(),
            inputs in prop::collection::vec(arb_input(), 1..400),
        ) {
            let layout = LayoutConfig::generate(WorldBounds::default(), seed);
            let mut state = SimState::new(&layout, seed).unwrap();
            for input in &inputs {
                tick(&mut state, input);
                prop_assert!(state.is_finite());
                prop_assert!(state.wheel.filled_count() <= state.wheel.total_slots());
            }
        }
    }
}
