use bigdecimal::{BigDecimal, One, Zero};
use serde::{Deserialize, Serialize};

use crate::events::Event;

/// Value the running total starts from, anchored at a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub block_number: u64,
    pub value: BigDecimal,
}

impl Baseline {
    /// Share count starts at one: the summoner's share.
    pub fn shares(block_number: u64) -> Self {
        Self { block_number, value: BigDecimal::one() }
    }

    pub fn balance(block_number: u64) -> Self {
        Self { block_number, value: BigDecimal::zero() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningPoint {
    pub block_number: u64,
    pub cumulative: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    pub baseline: Baseline,
    pub points: Vec<RunningPoint>,
}

impl Series {
    /// Series with no activity: a single point at the baseline.
    pub fn flat(baseline: Baseline) -> Self {
        let point = RunningPoint { block_number: baseline.block_number, cumulative: baseline.value.clone() };
        Self { baseline, points: vec![point] }
    }

    pub fn latest(&self) -> &BigDecimal {
        self.points.last().map_or(&self.baseline.value, |p| &p.cumulative)
    }
}

/// Merges both event lists, orders them by block and folds them into a
/// running total. Events sharing a block keep their input order, additive
/// events first.
pub fn running_total(additive: &[Event], subtractive: &[Event], baseline: Baseline) -> Series {
    let mut merged: Vec<&Event> = additive.iter().chain(subtractive.iter()).collect();
    if merged.is_empty() {
        return Series::flat(baseline);
    }
    // stable
    merged.sort_by_key(|e| e.block_number);

    let points = merged
        .into_iter()
        .scan(baseline.value.clone(), |total, event| {
            *total += &event.amount;
            Some(RunningPoint { block_number: event.block_number, cumulative: total.clone() })
        })
        .collect();
    Series { baseline, points }
}
