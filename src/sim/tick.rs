//! Fixed timestep simulation tick
//!
//! [`Simulation`] owns every ball plus the injected turn machine and snapshot
//! store. Collaborators feed it frame time through [`Simulation::advance`],
//! which runs zero or more fixed [`Simulation::tick`]s.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::ball::{Ball, BallId, BallPose, CUE_BALL};
use super::collision::{Contact, ball_cushion_collision, handle_ball_collisions, resolve_residual_overlaps};
use super::cue::{CueStrike, apply_cue_strike};
use super::events::{HIT_SOUND_VARIANTS, POCKET_VOLUME, SimEvent, hit_volume};
use super::friction::update_ball_velocity;
use super::history::{HistoryOutcome, Snapshot, SnapshotStore};
use super::rules::{TurnMachine, TurnPhase, TurnState};
use super::table::Table;
use crate::consts::*;
use crate::error::PlacementError;
use crate::settings::Settings;

/// Turns frame time into a whole number of fixed ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStepper {
    accumulator: f32,
}

impl FixedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank `frame_dt` and return how many ticks are now due
    ///
    /// A single frame never banks more than [`MAX_CATCH_UP`], so a stall
    /// can't snowball into a long burst of catch-up ticks.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.clamp(0.0, MAX_CATCH_UP);
        let mut steps = 0;
        while self.accumulator >= SIM_DT {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        steps
    }

    /// Fraction of a tick left in the accumulator, for render interpolation
    pub fn alpha(&self) -> f32 {
        self.accumulator / SIM_DT
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

/// The billiards simulation
#[derive(Debug, Clone)]
pub struct Simulation {
    settings: Settings,
    table: Table,
    /// Indexed by ball id
    balls: Vec<Ball>,
    turn: TurnMachine,
    history: SnapshotStore,
    stepper: FixedStepper,
    /// Only drives cosmetic choices (hit sound variants)
    rng: Pcg32,
    events: Vec<SimEvent>,
    contacts: Vec<Contact>,
    paused: bool,
    /// Simulated seconds, counting ticks held by a cooldown
    clock: f64,
    /// Ticks are held until the clock reaches this (undo/redo cooldown)
    resume_at: f64,
    time_ticks: u64,
}

impl Simulation {
    /// Rack a new game with the table described by `settings`
    pub fn new(settings: Settings) -> Self {
        let table = Table::new(&settings.table);
        let history = SnapshotStore::new(settings.rules.undo_cooldown_secs);
        Self::with_parts(settings, table, TurnMachine::new(), history)
    }

    /// Build around an existing turn machine and snapshot store
    pub fn with_parts(settings: Settings, table: Table, turn: TurnMachine, history: SnapshotStore) -> Self {
        let rng = Pcg32::seed_from_u64(settings.rules.sound_seed);
        let mut sim = Self {
            settings,
            table,
            balls: Vec::with_capacity(BALL_COUNT),
            turn,
            history,
            stepper: FixedStepper::new(),
            rng,
            events: Vec::new(),
            contacts: Vec::new(),
            paused: false,
            clock: 0.0,
            resume_at: 0.0,
            time_ticks: 0,
        };
        sim.rack_balls();
        sim.save_turn();
        log::info!("Game initialized with {} balls", sim.balls.len());
        sim
    }

    /// Re-rack and start over with an open table and empty history
    pub fn restart(&mut self) {
        self.rack_balls();
        self.turn.reset();
        self.history.clear();
        self.events.clear();
        self.stepper.reset();
        self.paused = false;
        self.resume_at = self.clock;
        self.save_turn();
        log::info!("Game restarted");
    }

    fn rack_balls(&mut self) {
        let r = self.settings.table.ball_radius;
        let m = self.settings.table.ball_mass;

        self.balls.clear();
        self.balls.push(Ball::new(CUE_BALL, self.table.cue_spawn, r, m));
        self.balls
            .extend(self.table.rack_positions().into_iter().map(|(id, pos)| Ball::new(id, pos, r, m)));
        self.balls.sort_by_key(|b| b.id);
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls.iter().find(|b| b.id == id)
    }

    pub fn turn_state(&self) -> &TurnState {
        self.turn.state()
    }

    pub fn turn_phase(&self) -> TurnPhase {
        self.turn.phase()
    }

    pub fn is_turn_in_progress(&self) -> bool {
        self.turn.is_turn_in_progress()
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Render interpolation factor between the last two ticks
    pub fn alpha(&self) -> f32 {
        self.stepper.alpha()
    }

    pub fn any_ball_moving(&self) -> bool {
        self.balls.iter().any(|b| b.in_play && b.is_moving)
    }

    /// Per-ball pose for visual sync
    pub fn poses(&self) -> Vec<BallPose> {
        self.balls.iter().map(BallPose::from).collect()
    }

    /// Take every event emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("Simulation paused");
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            log::debug!("Simulation resumed");
        }
        self.paused = false;
        self.stepper.reset();
    }

    /// Paused by request or held by an undo/redo cooldown
    pub fn is_paused(&self) -> bool {
        self.paused || self.clock < self.resume_at
    }

    /// Feed elapsed frame time; returns the number of physics ticks run
    ///
    /// Ticks held by an undo/redo cooldown still elapse but are not counted.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if self.paused {
            self.stepper.reset();
            return 0;
        }

        let before = self.time_ticks;
        for _ in 0..self.stepper.advance(frame_dt) {
            self.tick(SIM_DT);
        }
        (self.time_ticks - before) as u32
    }

    /// Strike the cue ball; returns false if the shot was not taken
    pub fn strike(&mut self, strike: CueStrike) -> bool {
        if self.turn.is_turn_in_progress() || self.any_ball_moving() {
            log::warn!("Ignoring cue strike while balls are moving");
            return false;
        }
        if self.turn.state().is_game_over() {
            log::warn!("Ignoring cue strike: game is over");
            return false;
        }

        let physics = &self.settings.physics;
        let Some(cue) = self.balls.iter_mut().find(|b| b.is_cue() && b.in_play) else {
            log::warn!("Ignoring cue strike: cue ball not in play");
            return false;
        };
        if !apply_cue_strike(cue, &strike, physics, SIM_DT) {
            return false;
        }

        self.turn.begin_turn();
        true
    }

    /// Advance the simulation by one fixed timestep
    ///
    /// While an undo/redo cooldown holds the table the step only advances the
    /// clock.
    pub fn tick(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let held = self.clock < self.resume_at;
        self.clock += f64::from(dt.max(0.0));
        if held {
            return;
        }
        self.time_ticks += 1;

        let physics = &self.settings.physics;
        let table = &self.table;

        for ball in self.balls.iter_mut().filter(|b| b.in_play) {
            ball.position += ball.velocity * dt;
        }

        for ball in self.balls.iter_mut().filter(|b| b.in_play) {
            if let Some(speed) = ball_cushion_collision(ball, table, physics) {
                self.events.push(SimEvent::CushionHit { ball: ball.id, speed });
            }
        }

        self.contacts.clear();
        handle_ball_collisions(&mut self.balls, dt, physics, &mut self.contacts);
        for contact in &self.contacts {
            let cue_contact = match (contact.a, contact.b) {
                (CUE_BALL, other) | (other, CUE_BALL) => Some(other),
                _ => None,
            };
            if let Some(other) = cue_contact {
                if self.turn.is_turn_in_progress() {
                    self.turn.report_ball_collision(other);
                }
                self.events.push(SimEvent::CueContact { other });
            }
            if let Some(impact) = contact.impact {
                self.events.push(SimEvent::BallHit {
                    ball: impact.louder,
                    volume: hit_volume(impact.speed),
                    variant: self.rng.random_range(0..HIT_SOUND_VARIANTS),
                });
            }
        }

        let corrected = resolve_residual_overlaps(&mut self.balls);
        if corrected > 0 {
            log::trace!("Separated {corrected} overlapping pairs");
        }

        for ball in self.balls.iter_mut().filter(|b| b.in_play) {
            if let Some(pocket) = table.pocket_at(ball.position, ball.radius) {
                ball.in_play = false;
                ball.place(table.parking_spot(ball.id));
                self.turn.on_ball_pocketed(ball.id);
                self.events.push(SimEvent::Pocketed {
                    ball: ball.id,
                    pocket,
                    volume: POCKET_VOLUME,
                });
                continue;
            }

            update_ball_velocity(ball, table.surface_y, physics, dt);

            if table.is_off_table(ball.position, ball.radius) {
                log::warn!("Ball {} left the table at {:?}", ball.id, ball.position);
                if ball.is_cue() {
                    ball.place(table.cue_spawn);
                } else {
                    ball.in_play = false;
                    ball.place(table.parking_spot(ball.id));
                }
                self.turn.on_ball_pocketed(ball.id);
                self.events.push(SimEvent::OffTable { ball: ball.id });
            }
        }

        if self.turn.is_turn_in_progress() && !self.any_ball_moving() {
            self.finish_turn();
        }
    }

    fn finish_turn(&mut self) {
        let events = self
            .turn
            .end_turn(&mut self.balls, &self.table, &self.settings.rules);
        self.events.extend(events.into_iter().map(SimEvent::Turn));
        self.save_turn();
    }

    /// Capture the current state onto the undo stack; false if unchanged
    pub fn save_turn(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.history.save_turn(snapshot)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.balls, self.turn.state())
    }

    /// Load a previously captured state and record it as the latest turn
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) {
        self.apply_snapshot(snapshot);
        self.save_turn();
    }

    fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        let restored = snapshot.restore(&mut self.balls);
        self.turn.restore(snapshot.turn.clone());
        self.stepper.reset();
        log::debug!("Restored {restored} balls from snapshot");
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &SnapshotStore {
        &self.history
    }

    /// Return to the previous turn
    pub fn undo(&mut self) -> HistoryOutcome {
        let snapshot = match self.history.undo(self.clock) {
            Ok(snapshot) => snapshot.clone(),
            Err(outcome) => {
                log_refused(outcome);
                return outcome;
            }
        };
        self.apply_snapshot(&snapshot);
        self.hold_for_cooldown();
        log::info!("Undo applied");
        HistoryOutcome::Applied
    }

    /// Re-apply the most recently undone turn
    pub fn redo(&mut self) -> HistoryOutcome {
        let snapshot = match self.history.redo(self.clock) {
            Ok(snapshot) => snapshot.clone(),
            Err(outcome) => {
                log_refused(outcome);
                return outcome;
            }
        };
        self.apply_snapshot(&snapshot);
        self.hold_for_cooldown();
        log::info!("Redo applied");
        HistoryOutcome::Applied
    }

    fn hold_for_cooldown(&mut self) {
        self.resume_at = self.clock + f64::from(self.settings.rules.undo_cooldown_secs.max(0.0));
    }

    /// Reposition a ball by hand (ball-in-hand or training mode)
    ///
    /// Only the x/z of `position` are used; the ball is set to rest on the felt.
    pub fn place_ball(&mut self, id: BallId, position: Vec3) -> Result<(), PlacementError> {
        let index = self
            .balls
            .iter()
            .position(|b| b.id == id)
            .ok_or(PlacementError::UnknownBall(id))?;
        if self.turn.is_turn_in_progress() || self.any_ball_moving() {
            return Err(PlacementError::BallsMoving);
        }

        let rules = &self.settings.rules;
        let ball = &self.balls[index];
        if !ball.in_play {
            return Err(PlacementError::NotInPlay(id));
        }
        let in_hand = ball.is_cue() && self.turn.state().ball_in_hand;
        if !rules.training_mode && !in_hand {
            return Err(PlacementError::NotAllowed(id));
        }

        let target = Vec3::new(position.x, self.table.rest_height(ball.radius), position.z);
        if !self.table.contains(target) {
            return Err(PlacementError::OutOfBounds);
        }
        if rules.kitchen_rule && ball.is_cue() && target.x > self.table.kitchen_line() {
            return Err(PlacementError::OutsideKitchen);
        }
        if let Some(other) = self
            .balls
            .iter()
            .find(|o| o.id != id && o.in_play && o.position.distance(target) < o.radius + ball.radius)
        {
            return Err(PlacementError::Overlaps(other.id));
        }

        self.balls[index].place(target);
        log::debug!("Ball {id} placed at {target:?}");
        Ok(())
    }
}

fn log_refused(outcome: HistoryOutcome) {
    match outcome {
        HistoryOutcome::Locked => log::info!("Undo/redo still cooling down"),
        HistoryOutcome::NothingToUndo => log::warn!("Nothing to undo"),
        HistoryOutcome::NothingToRedo => log::warn!("Nothing to redo"),
        HistoryOutcome::Applied => {}
    }
}
