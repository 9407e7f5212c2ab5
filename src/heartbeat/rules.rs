//! Pure decision rules for the autonomous loop.

/// What one tick should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Restock,
    RefreshScore,
    Idle,
}

/// Map a uniform roll in `[0, 1)` to a decision.
///
/// Below `restock_below` restocks, above `score_above` refreshes the score,
/// anything in between does nothing.
pub fn decide(roll: f64, restock_below: f64, score_above: f64) -> Decision {
    if roll < restock_below {
        Decision::Restock
    } else if roll > score_above {
        Decision::RefreshScore
    } else {
        Decision::Idle
    }
}

/// Whether a refresh adding `step` keeps the score within `ceiling`.
pub fn within_ceiling(score: u128, step: u128, ceiling: u128) -> bool {
    score.checked_add(step).is_some_and(|next| next <= ceiling)
}
