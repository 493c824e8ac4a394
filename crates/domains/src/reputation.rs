//! # Reputation
//!
//! Folds over the rating ledger and completion history of a volunteer.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Sum of all rating values; the coarse reputation score. May be negative.
pub fn total_rating(values: &[i32]) -> i64 {
    values.iter().map(|v| i64::from(*v)).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Arithmetic mean rounded to one decimal place
    pub average: f64,
    pub total: usize,
}

impl RatingSummary {
    pub fn from_values(values: &[i32]) -> Self {
        if values.is_empty() {
            return Self { average: 0.0, total: 0 };
        }
        let mean = total_rating(values) as f64 / values.len() as f64;
        Self {
            average: (mean * 10.0).round() / 10.0,
            total: values.len(),
        }
    }
}

/// Number of consecutive calendar months, ending at the most recent month with
/// a completion, in which the volunteer completed at least one engagement.
pub fn monthly_streak(completions: &[DateTime<Utc>]) -> u32 {
    // months since year 0, so December -> January is just +1
    let months: BTreeSet<i64> = completions
        .iter()
        .map(|at| i64::from(at.year()) * 12 + i64::from(at.month0()))
        .collect();

    let mut iter = months.iter().rev();
    let Some(mut latest) = iter.next().copied() else {
        return 0;
    };

    let mut streak = 1;
    for &month in iter {
        if latest - month != 1 {
            break;
        }
        streak += 1;
        latest = month;
    }
    streak
}
