//! Eight-ball turn state machine
//!
//! ```text
//! Idle ──strike──▶ TurnInProgress ──all balls stopped──▶ Evaluating ──▶ Idle
//! ```
//!
//! During a turn the machine only records facts (pocketed balls, the cue
//! ball's first contact, fouls). Everything is judged in [`TurnMachine::end_turn`].

use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallId, BallKind, CUE_BALL, EIGHT_BALL};
use super::events::{FoulKind, TurnEvent};
use super::table::Table;
use crate::settings::RuleSettings;

/// Which group of object balls the shooter is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Team {
    /// Open table: nobody has claimed a group yet
    #[default]
    Neutral,
    Solids,
    Stripes,
}

impl Team {
    /// Group a ball belongs to; None for the cue and eight-ball
    pub fn of_ball(id: BallId) -> Option<Team> {
        match BallKind::of(id) {
            BallKind::Solid => Some(Team::Solids),
            BallKind::Stripe => Some(Team::Stripes),
            BallKind::Cue | BallKind::Eight => None,
        }
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Neutral => Team::Neutral,
            Team::Solids => Team::Stripes,
            Team::Stripes => Team::Solids,
        }
    }

    pub fn owns(self, id: BallId) -> bool {
        self != Team::Neutral && Team::of_ball(id) == Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    TurnInProgress,
    Evaluating,
}

/// Rule state carried between turns and captured in snapshots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnState {
    pub current_team: Team,
    /// Reset at the end of every turn
    pub foul_occurred: bool,
    pub eight_ball_pocketed: bool,
    /// First ball the cue ball touched this turn, latched once set
    pub first_collision: Option<BallId>,
    /// Pocketed balls in the order they dropped, cleared each turn
    pub balls_pocketed_this_turn: Vec<BallId>,
    /// The incoming shooter may reposition the cue ball
    pub ball_in_hand: bool,
}

impl TurnState {
    /// The game ends as soon as the eight-ball goes down
    pub fn is_game_over(&self) -> bool {
        self.eight_ball_pocketed
    }
}

/// Drives turn phases and judges each finished turn
#[derive(Debug, Clone)]
pub struct TurnMachine {
    state: TurnState,
    phase: TurnPhase,
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            state: TurnState::default(),
            phase: TurnPhase::Idle,
        }
    }

    pub fn state(&self) -> &TurnState {
        &self.state
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn is_turn_in_progress(&self) -> bool {
        self.phase == TurnPhase::TurnInProgress
    }

    /// Replace the rule state (snapshot restore); any turn in flight is dropped
    pub fn restore(&mut self, state: TurnState) {
        self.state = state;
        self.phase = TurnPhase::Idle;
    }

    /// Back to an open table
    pub fn reset(&mut self) {
        self.restore(TurnState::default());
    }

    /// A cue strike starts a turn
    pub fn begin_turn(&mut self) {
        self.phase = TurnPhase::TurnInProgress;
        self.state.first_collision = None;
        self.state.ball_in_hand = false;
    }

    pub fn on_ball_pocketed(&mut self, id: BallId) {
        self.state.balls_pocketed_this_turn.push(id);
        match id {
            CUE_BALL => {
                self.state.foul_occurred = true;
                log::warn!("Foul: cue ball pocketed");
            }
            EIGHT_BALL => {
                self.state.eight_ball_pocketed = true;
                log::info!("Eight-ball pocketed");
            }
            _ => log::debug!("Ball {id} pocketed"),
        }
    }

    /// Record a cue-ball contact with `other`; returns true if it was the first
    pub fn report_ball_collision(&mut self, other: BallId) -> bool {
        if self.state.first_collision.is_some() {
            return false;
        }
        self.state.first_collision = Some(other);
        log::debug!("First contact: cue ball hit ball {other}");
        true
    }

    /// Judge the finished turn once every ball has stopped
    pub fn end_turn(&mut self, balls: &mut [Ball], table: &Table, rules: &RuleSettings) -> Vec<TurnEvent> {
        self.phase = TurnPhase::Evaluating;
        let mut events = Vec::new();
        let pocketed = std::mem::take(&mut self.state.balls_pocketed_this_turn);

        if pocketed.contains(&CUE_BALL) {
            self.state.foul_occurred = true;
            events.push(TurnEvent::Foul(FoulKind::CueBallPocketed));
            if let Some(cue) = balls.iter_mut().find(|b| b.is_cue()) {
                cue.in_play = true;
                cue.place(table.cue_spawn);
            }
        }

        let object_pocketed = pocketed.iter().any(|&id| BallKind::of(id).is_object_ball());
        if !object_pocketed && !pocketed.contains(&EIGHT_BALL) {
            log::warn!("Foul: no ball pocketed");
            self.state.foul_occurred = true;
            events.push(TurnEvent::Foul(FoulKind::NoBallPocketed));
        }

        if self.state.current_team == Team::Neutral && !self.state.foul_occurred {
            let solids = pocketed.iter().any(|&id| Team::of_ball(id) == Some(Team::Solids));
            let stripes = pocketed.iter().any(|&id| Team::of_ball(id) == Some(Team::Stripes));
            let claimed = match (solids, stripes) {
                (true, false) => Some(Team::Solids),
                (false, true) => Some(Team::Stripes),
                _ => None,
            };
            if let Some(team) = claimed {
                log::info!("Team claimed: {team:?}");
                self.state.current_team = team;
                events.push(TurnEvent::TeamAssigned(team));
            }
        }

        if self.state.eight_ball_pocketed {
            let (won, reason) = self.judge_eight_ball(balls);
            log::info!("Game over ({}): {reason}", if won { "win" } else { "loss" });
            events.push(TurnEvent::GameOver {
                won,
                reason: reason.to_string(),
            });
        } else {
            let team = self.state.current_team;
            if team != Team::Neutral && pocketed.iter().any(|&id| team.opponent().owns(id)) {
                log::warn!("Foul: pocketed an opponent ball");
                self.state.foul_occurred = true;
                events.push(TurnEvent::Foul(FoulKind::OpponentBallPocketed));
            }

            if self.state.foul_occurred {
                self.state.current_team = team.opponent();
                events.push(TurnEvent::PossessionSwitched {
                    to: self.state.current_team,
                });
            }
        }

        self.state.ball_in_hand = self.state.foul_occurred && rules.ball_in_hand_on_foul;
        self.state.foul_occurred = false;
        self.phase = TurnPhase::Idle;
        events.push(TurnEvent::TurnEnded);
        events
    }

    fn judge_eight_ball(&self, balls: &[Ball]) -> (bool, &'static str) {
        let team = self.state.current_team;
        if team == Team::Neutral {
            return (false, "pocketed the 8 ball without claiming a team.");
        }
        if balls.iter().any(|b| b.in_play && team.owns(b.id)) {
            return (false, "pocketed the 8 ball too early.");
        }
        if self.state.foul_occurred {
            return (false, "pocketed the cue ball on the 8 ball.");
        }
        (true, "pocketed the 8 ball.")
    }
}
