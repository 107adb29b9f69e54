//! [`PoseRelay`] – change-suppressed pose republishing.
//!
//! The simulation reports its pose at a high rate; re-emitting every
//! sample would churn the UI with redundant redraws. The relay rounds
//! both coordinates to two decimals and emits a state patch only when
//! at least one rounded coordinate actually changed.

use turtleweb_types::StatePatch;

/// Decimal precision applied before comparison and emission.
const PRECISION: f64 = 100.0;

fn round2(v: f64) -> f64 {
    (v * PRECISION).round() / PRECISION
}

pub struct PoseRelay {
    last_x: f64,
    last_y: f64,
}

impl PoseRelay {
    /// Seed the relay with the last emitted coordinates, normally the
    /// current state snapshot.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            last_x: round2(x),
            last_y: round2(y),
        }
    }

    /// Observe one pose sample. Returns the patch to apply when the
    /// rounded position moved, `None` otherwise.
    pub fn observe(&mut self, x: f64, y: f64) -> Option<StatePatch> {
        let x = round2(x);
        let y = round2(y);
        if x == self.last_x && y == self.last_y {
            return None;
        }
        self.last_x = x;
        self.last_y = y;
        Some(StatePatch {
            x: Some([x]),
            y: Some([y]),
            ..Default::default()
        })
    }
}
