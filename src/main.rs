//! Wheel Drop entry point
//!
//! Headless native runner: loads a layout (or builds the stock one), then lets
//! the autopilot play a run through the fixed-step driver and logs the result.
//!
//! Usage: `wheel-drop [layout.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), wheel_drop::ConfigError> {
    use wheel_drop::config::WorldBounds;
    use wheel_drop::consts::SIM_DT;
    use wheel_drop::sim::{FixedStep, SimEvent, SimState, autopilot_input};
    use wheel_drop::LayoutConfig;

    /// Give up after ten simulated minutes
    const MAX_FRAMES: u32 = 60 * 60 * 10;

    env_logger::init();
    log::info!("Wheel Drop (headless) starting...");

    let mut args = std::env::args().skip(1);
    let layout_arg = args.next();
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0x5eed);

    let layout = match layout_arg.as_deref() {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::generate(WorldBounds::default(), seed),
    };

    let mut state = SimState::new(&layout, seed)?;
    let mut driver = FixedStep::new();
    let (mut pins, mut flips, mut fish) = (0u32, 0u32, 0u32);

    for _ in 0..MAX_FRAMES {
        if state.phase.is_terminal() {
            break;
        }
        let mut input = autopilot_input(&state);
        driver.advance(&mut state, &mut input, SIM_DT);

        for event in driver.drain_events() {
            match event {
                SimEvent::PinHit { .. } => pins += 1,
                SimEvent::FlipperHit { .. } => flips += 1,
                SimEvent::FishHit { .. } => fish += 1,
                _ => {}
            }
        }
    }

    log::info!(
        "Run finished: {:?} after {} ticks, score {}/{} (hits: pin {}, flipper {}, fish {})",
        state.phase,
        state.sim_ticks,
        state.score,
        state.wheel.total_slots(),
        pins,
        flips,
        fish
    );
    println!(
        "{:?}: score {}/{} in {} ticks",
        state.phase,
        state.score,
        state.wheel.total_slots(),
        state.sim_ticks
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page; there is no standalone wasm binary
}
