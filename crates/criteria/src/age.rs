use serde::{Deserialize, Serialize};

use crate::{AgeInput, CriteriaError};

/// Youngest age any discovery screen may ask for.
pub const MIN_AGE: i64 = 18;
/// Oldest age any discovery screen may ask for.
pub const MAX_AGE: i64 = 99;

/// Validated inclusive age window. Always `18 ≤ min < max ≤ 99`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgeRange {
    min: i64,
    max: i64,
}

impl AgeRange {
    pub fn new(min: i64, max: i64) -> Result<Self, CriteriaError> {
        if min < MIN_AGE || max > MAX_AGE {
            return Err(CriteriaError::InvalidCriteria(format!(
                "age range {min}-{max} outside {MIN_AGE}-{MAX_AGE}"
            )));
        }
        if min >= max {
            return Err(CriteriaError::InvalidCriteria(format!(
                "age min {min} must be below max {max}"
            )));
        }
        Ok(Self { min, max })
    }

    /// The 18–99 window used when nothing usable was entered.
    pub const fn widest() -> Self {
        Self {
            min: MIN_AGE,
            max: MAX_AGE,
        }
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, age: i64) -> bool {
        (self.min..=self.max).contains(&age)
    }
}

impl Default for AgeRange {
    fn default() -> Self {
        Self::widest()
    }
}

fn parse_bound(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Apply the stepper rules to raw bounds.
///
/// Missing or non-numeric bounds take the 18/99 defaults. Max is confined to
/// `[19, 99]` first so the min clamp `[18, max-1]` is never empty; the final
/// max clamp `[min+1, 99]` then holds by construction.
pub fn normalize_age(input: &AgeInput) -> (i64, i64) {
    let min = parse_bound(input.min.as_deref()).unwrap_or(MIN_AGE);
    let max = parse_bound(input.max.as_deref()).unwrap_or(MAX_AGE);

    let max = max.clamp(MIN_AGE + 1, MAX_AGE);
    let min = min.clamp(MIN_AGE, max - 1);
    let max = max.clamp(min + 1, MAX_AGE);
    (min, max)
}
