//! Pose-hold confirmation protocol.
//!
//! Instantaneous pose matching is too noisy for hand tracking, so a pose
//! only confirms after being held inside a listener's region for a fixed
//! window with bounded drift: snapshot the tracked landmarks when they
//! first enter bounds, let a timer run, and accept only if no landmark
//! drifted farther than the tolerance from its snapshot. Leaving bounds at
//! any point aborts the cycle; a confirmation is followed by a cooldown so
//! residual motion cannot re-trigger immediately.
//!
//! The same machine serves one-hand and two-hand listeners: multi-hand
//! variants simply put both hands' landmarks into one [`PosePosition`], so
//! entry requires every landmark in bounds and acceptance requires every
//! displacement within tolerance.

use thiserror::Error;

use crate::frame::Hand;
use crate::geom::{self, Point, TrackedPoint};
use crate::timer::Timer;

/// Raised only on contract violations: positions that were admitted into a
/// hold (i.e. claimed visible by the caller's bounds check) turning out
/// incomplete, or snapshot/current key sets diverging mid-cycle. Expected
/// incompleteness (a hand not visible this frame) never reaches these —
/// callers pass `None` to [`PoseHold::observe`] instead.
#[derive(Debug, Error, PartialEq)]
pub enum HoldError {
    #[error("{stage}: landmark {landmark} on {hand:?} hand has no position despite passing the bounds check")]
    MissingCoordinate {
        hand: Hand,
        landmark: usize,
        stage: &'static str,
    },
    #[error("hold snapshot keys diverged at entry {index}: expected {expected:?}, found {found:?}")]
    KeyMismatch {
        index: usize,
        expected: (Hand, usize),
        found: (Hand, usize),
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEntry {
    pub hand: Hand,
    pub landmark: usize,
    pub point: TrackedPoint,
}

/// Mapping from (hand, landmark id) to a tracked position. Used both as the
/// snapshot taken when a hold begins and as the continuously overwritten
/// "most recent" position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosePosition {
    entries: Vec<PoseEntry>,
}

impl PosePosition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hand: Hand, landmark: usize, point: TrackedPoint) {
        self.entries.push(PoseEntry {
            hand,
            landmark,
            point,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, hand: Hand, landmark: usize) -> Option<TrackedPoint> {
        self.entries
            .iter()
            .find(|e| e.hand == hand && e.landmark == landmark)
            .map(|e| e.point)
    }

    /// Resolve every entry to a concrete point, failing loudly on any entry
    /// that has lost a coordinate.
    pub fn points(&self, stage: &'static str) -> Result<Vec<Point>, HoldError> {
        self.entries
            .iter()
            .map(|e| {
                e.point.resolved().ok_or(HoldError::MissingCoordinate {
                    hand: e.hand,
                    landmark: e.landmark,
                    stage,
                })
            })
            .collect()
    }

    /// Per-landmark Euclidean displacement from `self` (the snapshot) to
    /// `later`. Keys must line up entry for entry.
    pub fn displacements(&self, later: &PosePosition) -> Result<Vec<f32>, HoldError> {
        if self.entries.len() != later.entries.len() {
            return Err(HoldError::KeyMismatch {
                index: self.entries.len().min(later.entries.len()),
                expected: self
                    .entries
                    .last()
                    .map(|e| (e.hand, e.landmark))
                    .unwrap_or((Hand::Left, 0)),
                found: later
                    .entries
                    .last()
                    .map(|e| (e.hand, e.landmark))
                    .unwrap_or((Hand::Left, 0)),
            });
        }
        let anchors = self.points("hold displacement (snapshot)")?;
        let latest = later.points("hold displacement (current)")?;
        let mut out = Vec::with_capacity(anchors.len());
        for (i, (a, b)) in self.entries.iter().zip(later.entries.iter()).enumerate() {
            if a.hand != b.hand || a.landmark != b.landmark {
                return Err(HoldError::KeyMismatch {
                    index: i,
                    expected: (a.hand, a.landmark),
                    found: (b.hand, b.landmark),
                });
            }
            out.push(geom::distance(anchors[i], latest[i]));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldSettings {
    /// How long the pose must be held before the accept test runs.
    pub hold_ms: u64,
    /// Refractory period after a successful confirmation.
    pub cooldown_ms: u64,
    /// Maximum per-landmark drift from the snapshot.
    pub tolerance_px: f32,
}

impl Default for HoldSettings {
    fn default() -> Self {
        Self {
            hold_ms: 1000,
            cooldown_ms: 1000,
            tolerance_px: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldPhase {
    Idle,
    Holding,
    Cooldown,
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Holding {
        timer: Timer,
        anchor: PosePosition,
        current: PosePosition,
    },
    Cooldown {
        timer: Timer,
    },
}

/// A confirmed hold: the snapshot taken at entry and the final position.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldConfirm {
    pub anchor: PosePosition,
    pub last: PosePosition,
}

#[derive(Debug)]
pub struct PoseHold {
    settings: HoldSettings,
    phase: Phase,
}

impl PoseHold {
    pub fn new(settings: HoldSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> HoldPhase {
        match self.phase {
            Phase::Idle => HoldPhase::Idle,
            Phase::Holding { .. } => HoldPhase::Holding,
            Phase::Cooldown { .. } => HoldPhase::Cooldown,
        }
    }

    /// Drop any pending cycle: snapshot, current position, and timer go
    /// together.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
    }

    /// Feed one frame. `sample` is `Some` only when every required landmark
    /// is visible and inside the listener's region this frame; anything
    /// less is `None` and treated as out-of-bounds.
    pub fn observe(
        &mut self,
        sample: Option<PosePosition>,
        now_ms: u64,
    ) -> Result<Option<HoldConfirm>, HoldError> {
        // leave cooldown first so a steady pose can re-arm on the same frame
        if let Phase::Cooldown { timer } = &self.phase {
            if timer.fired(now_ms) {
                self.phase = Phase::Idle;
            } else {
                return Ok(None);
            }
        }

        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => {
                if let Some(snapshot) = sample {
                    self.phase = Phase::Holding {
                        timer: Timer::after(now_ms, self.settings.hold_ms),
                        current: snapshot.clone(),
                        anchor: snapshot,
                    };
                }
                Ok(None)
            }
            Phase::Holding {
                timer,
                anchor,
                mut current,
            } => {
                let Some(sample) = sample else {
                    // left bounds: abort, timer dies with the phase
                    return Ok(None);
                };
                current = sample;
                if !timer.fired(now_ms) {
                    self.phase = Phase::Holding {
                        timer,
                        anchor,
                        current,
                    };
                    return Ok(None);
                }
                let drifts = anchor.displacements(&current)?;
                if drifts.iter().all(|d| *d <= self.settings.tolerance_px) {
                    self.phase = Phase::Cooldown {
                        timer: Timer::after(now_ms, self.settings.cooldown_ms),
                    };
                    Ok(Some(HoldConfirm {
                        anchor,
                        last: current,
                    }))
                } else {
                    // drifted: silent reject, back to Idle
                    Ok(None)
                }
            }
            Phase::Cooldown { timer } => {
                // handled above; restore
                self.phase = Phase::Cooldown { timer };
                Ok(None)
            }
        }
    }
}
