//! Simulation state and command surface
//!
//! All state that must be persisted for determinism lives here. Commands
//! mutate it directly; `sim::tick` advances it.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, MatchPose};
use super::obstacles::{Fish, Flipper, Pin, Platform};
use super::shapes::ShapeKind;
use super::wheel::{Turn, Wheel};
use crate::config::{BodyParams, FishParams, LayoutConfig, WorldBounds};
use crate::consts::*;
use crate::error::ConfigError;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    Running,
    Paused,
    /// Every slot filled (terminal)
    Won,
    /// Body fell out of the world (terminal)
    Lost,
}

impl SimPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, SimPhase::Won | SimPhase::Lost)
    }
}

/// Something observable that happened during a tick or command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Spawned { body: u32, kind: ShapeKind },
    Matched { body: u32, kind: ShapeKind, slot: usize },
    PinHit { pin: usize },
    PlatformHit { platform: usize },
    FlipperHit { flipper: usize },
    FishHit { fish: u32 },
    FishSpawned { fish: u32 },
    WheelRotated { rotation: f32 },
    Paused,
    Resumed,
    Won,
    Lost,
}

/// An in-flight press on the pause button
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Press {
    started: u64,
    origin: Vec2,
    last: Vec2,
    released: Option<u64>,
}

/// Long-press debounce for the on-wheel pause button
///
/// A press arms the button; the toggle is decided a fixed number of ticks
/// later from how long the press was held and how far it drifted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PauseButton {
    press: Option<Press>,
}

impl PauseButton {
    pub fn is_armed(&self) -> bool {
        self.press.is_some()
    }

    /// Square touch target centred on the wheel
    pub fn contains(wheel: &Wheel, pos: Vec2) -> bool {
        let half = wheel.radius * PAUSE_BUTTON_FACTOR;
        let d = (pos - wheel.center).abs();
        d.x < half && d.y < half
    }

    fn press(&mut self, pos: Vec2, now: u64) {
        let press = self.press.get_or_insert(Press {
            started: now,
            origin: pos,
            last: pos,
            released: None,
        });
        if press.released.is_none() {
            press.last = pos;
        }
    }

    fn release(&mut self, now: u64) {
        if let Some(press) = &mut self.press {
            press.released.get_or_insert(now);
        }
    }

    fn cancel(&mut self) -> bool {
        self.press.take().is_some()
    }

    /// Resolve an armed press once its confirm window has passed
    ///
    /// Returns `Some(true)` when the press should toggle pause, `Some(false)`
    /// when it was rejected, and `None` while still undecided.
    fn poll(&mut self, now: u64) -> Option<bool> {
        let press = self.press?;
        if now.saturating_sub(press.started) < PAUSE_CONFIRM_TICKS {
            return None;
        }
        self.press = None;
        let held = press.released.unwrap_or(now).saturating_sub(press.started);
        Some(held >= PAUSE_MIN_HOLD_TICKS && press.origin.distance(press.last) < PAUSE_MAX_DRIFT)
    }
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Layout the run was built from (kept for restart)
    layout: LayoutConfig,
    pub world: WorldBounds,
    pub body_params: BodyParams,
    pub fish_params: FishParams,
    pub phase: SimPhase,
    /// Ticks seen, including paused ones
    pub clock_ticks: u64,
    /// Ticks actually simulated
    pub sim_ticks: u64,
    pub score: u32,
    /// The single falling body, if any
    pub body: Option<Body>,
    pub pins: Vec<Pin>,
    pub platforms: Vec<Platform>,
    pub flippers: Vec<Flipper>,
    pub fish: Vec<Fish>,
    pub wheel: Wheel,
    pub pause_button: PauseButton,
    /// Sticky descent boost, inherited by every new body
    pub fast: bool,
    /// `sim_ticks` at the last spawn or match (`None` = spawn immediately)
    pub last_spawn_tick: Option<u64>,
    pub spawn_cooldown_ticks: u64,
    /// Most recent drop-in, animated by the tick for the renderer
    pub match_animation: Option<MatchPose>,
    /// Events from the latest tick, plus commands issued since
    #[serde(skip)]
    events: Vec<SimEvent>,
    next_id: u32,
}

impl SimState {
    /// Validate the layout and start a run with the given seed
    pub fn new(layout: &LayoutConfig, seed: u64) -> Result<Self, ConfigError> {
        layout.validate()?;
        Ok(Self::build(layout.clone(), seed))
    }

    fn build(layout: LayoutConfig, seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            world: layout.world,
            body_params: layout.body,
            fish_params: layout.fish,
            phase: SimPhase::Running,
            clock_ticks: 0,
            sim_ticks: 0,
            score: 0,
            body: None,
            pins: layout.pins.iter().map(Pin::from).collect(),
            platforms: layout.platforms.iter().map(Platform::from).collect(),
            flippers: layout.flippers.iter().map(Flipper::from).collect(),
            fish: Vec::new(),
            wheel: Wheel::from(&layout.wheel),
            pause_button: PauseButton::default(),
            fast: false,
            last_spawn_tick: None,
            spawn_cooldown_ticks: layout.spawn_cooldown_ticks,
            match_animation: None,
            events: Vec::new(),
            next_id: 1,
            layout,
        };

        log::info!(
            "Run started with seed {} ({} slots, {} pins, {} platforms, {} flippers)",
            seed,
            state.wheel.total_slots(),
            state.pins.len(),
            state.platforms.len(),
            state.flippers.len()
        );
        state.spawn_body();
        state
    }

    /// Start over from the same layout with the next seed
    pub fn restart(&mut self) {
        let seed = self.seed.wrapping_add(1);
        *self = Self::build(self.layout.clone(), seed);
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub(crate) fn emit(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    /// Take every event recorded since the last drain
    ///
    /// Each tick that runs starts with an empty buffer, so a host that skips a
    /// drain only ever loses events, never accumulates them.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }

    pub fn is_running(&self) -> bool {
        self.phase == SimPhase::Running
    }

    /// Whether enough simulated time passed since the last spawn
    pub fn spawn_ready(&self) -> bool {
        self.last_spawn_tick
            .is_none_or(|t| self.sim_ticks.saturating_sub(t) >= self.spawn_cooldown_ticks)
    }

    /// Spawn a body whose kind matches one of the unfilled slots
    ///
    /// Returns false (and spawns nothing) once the wheel is complete.
    pub fn spawn_body(&mut self) -> bool {
        let open: Vec<ShapeKind> = self
            .wheel
            .unfilled_indices()
            .map(|i| self.wheel.slots()[i].kind)
            .collect();
        if open.is_empty() {
            return false;
        }

        let kind = open[self.rng.random_range(0..open.len())];
        let id = self.next_entity_id();
        let mut body = Body::new(
            id,
            kind,
            Vec2::new(self.world.width / 2.0, 0.0),
            &self.body_params,
        );
        body.set_speed(self.fast);
        self.body = Some(body);
        self.last_spawn_tick = Some(self.sim_ticks);

        log::info!("Spawned {} body {}", kind, id);
        self.emit(SimEvent::Spawned { body: id, kind });
        true
    }

    /// Spawn a fish just off a random side edge
    pub fn spawn_fish(&mut self) -> u32 {
        let id = self.next_entity_id();
        let fish = Fish::spawn(id, &self.world, &self.fish_params, &mut self.rng);
        log::debug!("Fish {} spawned at ({:.0}, {:.0})", id, fish.pos.x, fish.pos.y);
        self.fish.push(fish);
        self.emit(SimEvent::FishSpawned { fish: id });
        id
    }

    // --- Commands ---

    fn accepts_commands(&self, command: &str) -> bool {
        if self.phase.is_terminal() {
            log::warn!("Ignoring {} after the run ended ({:?})", command, self.phase);
            return false;
        }
        true
    }

    /// Turn the wheel one step; returns the new rotation
    pub fn rotate_wheel(&mut self, turn: Turn) -> Option<f32> {
        if !self.accepts_commands("rotate") {
            return None;
        }
        let rotation = self.wheel.rotate(turn);
        self.emit(SimEvent::WheelRotated { rotation });
        Some(rotation)
    }

    /// Toggle the descent boost (persists across spawns)
    pub fn set_speed(&mut self, fast: bool) {
        if !self.accepts_commands("speed change") {
            return;
        }
        if self.fast != fast {
            log::debug!("Fast drop {}", if fast { "on" } else { "off" });
        }
        self.fast = fast;
        if let Some(body) = &mut self.body {
            body.set_speed(fast);
        }
    }

    fn flipper_mut(&mut self, index: usize) -> Option<&mut Flipper> {
        if !self.accepts_commands("flipper command") {
            return None;
        }
        let count = self.flippers.len();
        let flipper = self.flippers.get_mut(index);
        if flipper.is_none() {
            log::warn!("Ignoring command for flipper {} ({} flippers)", index, count);
        }
        flipper
    }

    pub fn activate_flipper(&mut self, index: usize) {
        if let Some(f) = self.flipper_mut(index) {
            f.activate();
        }
    }

    pub fn deactivate_flipper(&mut self, index: usize) {
        if let Some(f) = self.flipper_mut(index) {
            f.deactivate();
        }
    }

    pub fn activate_flippers(&mut self) {
        if self.accepts_commands("flipper command") {
            self.flippers.iter_mut().for_each(Flipper::activate);
        }
    }

    pub fn deactivate_flippers(&mut self) {
        if self.accepts_commands("flipper command") {
            self.flippers.iter_mut().for_each(Flipper::deactivate);
        }
    }

    /// Flip between Running and Paused; terminal phases are left alone
    pub fn toggle_pause(&mut self) {
        match self.phase {
            SimPhase::Running => {
                self.phase = SimPhase::Paused;
                log::info!("Paused at tick {}", self.sim_ticks);
                self.emit(SimEvent::Paused);
            }
            SimPhase::Paused => {
                self.phase = SimPhase::Running;
                log::info!("Resumed at tick {}", self.sim_ticks);
                self.emit(SimEvent::Resumed);
            }
            SimPhase::Won | SimPhase::Lost => {
                log::warn!("Ignoring pause after the run ended ({:?})", self.phase)
            }
        }
    }

    /// Pointer down (or moved while down) at `pos`
    ///
    /// Inside the button this arms or updates the press; outside it cancels
    /// any armed press. Returns whether the pointer is on the button.
    pub fn press_pause_button(&mut self, pos: Vec2) -> bool {
        if PauseButton::contains(&self.wheel, pos) {
            self.pause_button.press(pos, self.clock_ticks);
            true
        } else {
            if self.pause_button.cancel() {
                log::debug!("Pause press cancelled (pointer left the button)");
            }
            false
        }
    }

    /// Pointer lifted
    pub fn release_pause_button(&mut self) {
        self.pause_button.release(self.clock_ticks);
    }

    /// Decide an armed pause press against the tick clock
    pub(crate) fn poll_pause_button(&mut self) {
        match self.pause_button.poll(self.clock_ticks) {
            Some(true) => self.toggle_pause(),
            Some(false) => log::debug!("Pause press rejected (too short or drifted)"),
            None => {}
        }
    }

    // --- Terminal transitions ---

    pub(crate) fn win(&mut self) {
        if self.phase == SimPhase::Won {
            return;
        }
        self.phase = SimPhase::Won;
        self.body = None;
        log::info!("Wheel complete after {} ticks, score {}", self.sim_ticks, self.score);
        self.emit(SimEvent::Won);
    }

    pub(crate) fn lose(&mut self) {
        self.phase = SimPhase::Lost;
        if let Some(body) = self.body.take() {
            log::info!(
                "Body {} ({}) fell out at x={:.1}, score {}",
                body.id,
                body.kind,
                body.pos.x,
                self.score
            );
        }
        self.emit(SimEvent::Lost);
    }

    /// Any NaN/inf in the moving parts (used by tests)
    pub fn is_finite(&self) -> bool {
        let body_ok = self
            .body
            .as_ref()
            .is_none_or(|b| b.pos.is_finite() && b.vel.is_finite() && b.rotation.is_finite());
        body_ok
            && self.fish.iter().all(|f| f.pos.is_finite() && f.vel.is_finite())
            && self.flippers.iter().all(|f| f.angle.is_finite())
            && self.wheel.rotation().is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;

    fn open_layout() -> LayoutConfig {
        let mut layout = LayoutConfig::default();
        layout.pins.clear();
        layout.platforms.clear();
        layout.fish.enabled = false;
        layout
    }

    #[test]
    fn test_new_spawns_matching_body() {
        let state = SimState::new(&LayoutConfig::default(), 42).unwrap();
        assert_eq!(state.phase, SimPhase::Running);
        let body = state.body.as_ref().unwrap();
        assert!(state.wheel.slots().iter().any(|s| s.kind == body.kind));
        assert_eq!(body.pos, Vec2::new(state.world.width / 2.0, 0.0));
        assert_eq!(state.last_spawn_tick, Some(0));
    }

    #[test]
    fn test_new_rejects_bad_layout() {
        let mut layout = LayoutConfig::default();
        layout.wheel.slots.clear();
        assert!(matches!(
            SimState::new(&layout, 1),
            Err(ConfigError::EmptyWheel)
        ));
    }

    #[test]
    fn test_spawn_draws_only_unfilled_kinds() {
        let mut layout = open_layout();
        layout.wheel.slots = vec![
            SlotConfig {
                kind: ShapeKind::Star,
                angle: 0.0,
            },
            SlotConfig {
                kind: ShapeKind::Moon,
                angle: std::f32::consts::PI,
            },
        ];
        let mut state = SimState::new(&layout, 9).unwrap();

        // Fill the star slot
        let star_pos = state.wheel.slot_position(0);
        let mut star = Body::new(99, ShapeKind::Star, star_pos, &state.body_params);
        assert!(state.wheel.check_collision(&mut star).is_some());

        for _ in 0..20 {
            assert!(state.spawn_body());
            assert_eq!(state.body.as_ref().unwrap().kind, ShapeKind::Moon);
        }

        let moon_pos = state.wheel.slot_position(1);
        let mut moon = Body::new(100, ShapeKind::Moon, moon_pos, &state.body_params);
        assert!(state.wheel.check_collision(&mut moon).is_some());
        state.body = None;
        assert!(!state.spawn_body());
        assert!(state.body.is_none());
    }

    #[test]
    fn test_fast_flag_is_sticky_across_spawns() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        state.set_speed(true);
        assert!(state.body.as_ref().unwrap().fast);
        state.body = None;
        state.spawn_body();
        assert!(state.body.as_ref().unwrap().fast);
    }

    #[test]
    fn test_bad_flipper_index_is_ignored() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        let before: Vec<bool> = state.flippers.iter().map(|f| f.active).collect();
        state.activate_flipper(17);
        let after: Vec<bool> = state.flippers.iter().map(|f| f.active).collect();
        assert_eq!(before, after);

        state.activate_flipper(1);
        assert!(state.flippers[1].active);
        assert!(!state.flippers[0].active);
        state.deactivate_flippers();
        assert!(state.flippers.iter().all(|f| !f.active));
    }

    #[test]
    fn test_toggle_pause_and_terminal() {
        let mut state = SimState::new(&open_layout(), 3).unwrap();
        state.toggle_pause();
        assert_eq!(state.phase, SimPhase::Paused);
        state.toggle_pause();
        assert_eq!(state.phase, SimPhase::Running);

        state.lose();
        assert!(state.body.is_none());
        state.toggle_pause();
        assert_eq!(state.phase, SimPhase::Lost);
        assert_eq!(state.rotate_wheel(Turn::Left), None);

        let events = state.drain_events();
        assert!(events.contains(&SimEvent::Paused));
        assert!(events.contains(&SimEvent::Resumed));
        assert_eq!(events.last(), Some(&SimEvent::Lost));
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_pause_button_target() {
        let state = SimState::new(&open_layout(), 3).unwrap();
        let wheel = &state.wheel;
        let half = wheel.radius * PAUSE_BUTTON_FACTOR;
        assert!(PauseButton::contains(wheel, wheel.center));
        assert!(PauseButton::contains(wheel, wheel.center + Vec2::new(half - 1.0, -(half - 1.0))));
        assert!(!PauseButton::contains(wheel, wheel.center + Vec2::new(half + 1.0, 0.0)));
    }

    #[test]
    fn test_restart_uses_next_seed() {
        let mut state = SimState::new(&open_layout(), 10).unwrap();
        state.score = 4;
        state.rotate_wheel(Turn::Right);
        state.lose();
        state.restart();

        assert_eq!(state.seed, 11);
        assert_eq!(state.phase, SimPhase::Running);
        assert_eq!(state.score, 0);
        assert_eq!(state.wheel.rotation(), 0.0);
        assert!(state.body.is_some());
    }
}
