//! Billiards Sim headless runner
//!
//! Racks a game, breaks, and runs the simulation until the shot has been
//! evaluated. Usage: `billiards-sim [settings.json] [snapshot-out.json]`.
//! Set `RUST_LOG=debug` for per-contact detail.

#[cfg(not(target_arch = "wasm32"))]
use billiards_sim::{
    Settings,
    consts::SIM_DT,
    persistence,
    sim::{CueStrike, SimEvent, Simulation, TurnEvent},
};
#[cfg(not(target_arch = "wasm32"))]
use glam::{Vec2, Vec3};

/// Give up on a shot that hasn't settled after this many frames
#[cfg(not(target_arch = "wasm32"))]
const MAX_FRAMES: u32 = 60 * 120;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Billiards Sim (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is driven by the host page; nothing to run here
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> billiards_sim::Result<()> {
    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let snapshot_path = args.next();

    let mut sim = Simulation::new(settings);
    let shot = CueStrike::new(Vec3::X, 6.0).with_offset(Vec2::new(0.0, -0.1));
    if !sim.strike(shot) {
        log::warn!("Break shot was not taken");
        return Ok(());
    }

    // Feed 60 Hz frames the way a render loop would
    let frame_dt = 1.0 / 60.0;
    let mut frames = 0;
    while sim.is_turn_in_progress() && frames < MAX_FRAMES {
        sim.advance(frame_dt);
        frames += 1;
        for event in sim.drain_events() {
            report(&event);
        }
    }

    if sim.is_turn_in_progress() {
        log::warn!("Shot still running after {frames} frames");
    }
    log::info!(
        "Shot settled after {} ticks ({:.2} s simulated)",
        sim.time_ticks(),
        sim.time_ticks() as f32 * SIM_DT
    );

    for pose in sim.poses().iter().filter(|p| p.in_play) {
        println!(
            "ball {:>2}  x={:+.3}  z={:+.3}",
            pose.id, pose.position.x, pose.position.z
        );
    }
    println!("team: {:?}", sim.turn_state().current_team);

    if let Some(path) = snapshot_path {
        persistence::save(path, &sim.snapshot())?;
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn report(event: &SimEvent) {
    match event {
        SimEvent::Pocketed { ball, pocket, .. } => log::info!("Ball {ball} dropped in pocket {pocket}"),
        SimEvent::OffTable { ball } => log::warn!("Ball {ball} jumped the table"),
        SimEvent::Turn(TurnEvent::Foul(kind)) => log::warn!("Foul: {kind:?}"),
        SimEvent::Turn(TurnEvent::GameOver { won, reason }) => {
            log::info!("{} {reason}", if *won { "Won:" } else { "Lost:" })
        }
        SimEvent::Turn(turn) => log::info!("{turn:?}"),
        other => log::debug!("{other:?}"),
    }
}
