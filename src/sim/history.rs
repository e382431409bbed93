//! Turn snapshots and the undo/redo store

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::ball::{Ball, BallId};
use super::rules::TurnState;

/// Per-ball state captured in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub id: BallId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub in_play: bool,
    pub is_moving: bool,
}

impl From<&Ball> for BallSnapshot {
    fn from(ball: &Ball) -> Self {
        Self {
            id: ball.id,
            position: ball.position,
            velocity: ball.velocity,
            angular_velocity: ball.angular_velocity,
            in_play: ball.in_play,
            is_moving: ball.is_moving,
        }
    }
}

/// Full copy of ball and rule state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub balls: Vec<BallSnapshot>,
    pub turn: TurnState,
}

impl Snapshot {
    pub fn capture(balls: &[Ball], turn: &TurnState) -> Self {
        Self {
            balls: balls.iter().map(BallSnapshot::from).collect(),
            turn: turn.clone(),
        }
    }

    /// Write the captured ball state back; returns how many balls were restored
    ///
    /// Entries whose id has no matching ball are skipped.
    pub fn restore(&self, balls: &mut [Ball]) -> usize {
        let mut restored = 0;
        for saved in &self.balls {
            let Some(ball) = balls.iter_mut().find(|b| b.id == saved.id) else {
                log::warn!("Snapshot references unknown ball {}, skipping", saved.id);
                continue;
            };
            ball.position = saved.position;
            ball.velocity = saved.velocity;
            ball.angular_velocity = saved.angular_velocity;
            ball.in_play = saved.in_play;
            ball.is_moving = saved.is_moving;
            restored += 1;
        }
        restored
    }
}

/// Result of an undo or redo request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOutcome {
    Applied,
    NothingToUndo,
    NothingToRedo,
    /// A previous undo/redo is still cooling down
    Locked,
}

/// Undo/redo stacks of turn snapshots
///
/// The top of `undo` is always the most recently saved (or restored) state.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    cooldown_secs: f64,
    locked_until: f64,
}

impl SnapshotStore {
    pub fn new(cooldown_secs: f32) -> Self {
        Self {
            cooldown_secs: f64::from(cooldown_secs.max(0.0)),
            ..Default::default()
        }
    }

    /// Push a snapshot unless it equals the last saved one; returns true if stored
    pub fn save_turn(&mut self, snapshot: Snapshot) -> bool {
        if self.undo.last() == Some(&snapshot) {
            log::debug!("Skipping duplicate snapshot");
            return false;
        }
        self.undo.push(snapshot);
        self.redo.clear();
        true
    }

    /// Step back one turn; on success returns the state to restore
    pub fn undo(&mut self, now: f64) -> Result<&Snapshot, HistoryOutcome> {
        if self.is_locked(now) {
            return Err(HistoryOutcome::Locked);
        }
        if self.undo.len() < 2 {
            return Err(HistoryOutcome::NothingToUndo);
        }
        if let Some(top) = self.undo.pop() {
            self.redo.push(top);
        }
        self.locked_until = now + self.cooldown_secs;
        self.undo.last().ok_or(HistoryOutcome::NothingToUndo)
    }

    /// Step forward one undone turn; on success returns the state to restore
    ///
    /// The redone snapshot itself goes back onto `undo`, keeping the top of
    /// `undo` equal to the live state so a following undo lands on the turn
    /// before it.
    pub fn redo(&mut self, now: f64) -> Result<&Snapshot, HistoryOutcome> {
        if self.is_locked(now) {
            return Err(HistoryOutcome::Locked);
        }
        let Some(next) = self.redo.pop() else {
            return Err(HistoryOutcome::NothingToRedo);
        };
        self.undo.push(next);
        self.locked_until = now + self.cooldown_secs;
        self.undo.last().ok_or(HistoryOutcome::NothingToRedo)
    }

    pub fn is_locked(&self, now: f64) -> bool {
        now < self.locked_until
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.undo.last()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.locked_until = 0.0;
    }
}
