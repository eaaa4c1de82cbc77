//! Air quality index engine
//!
//! Converts pollutant concentrations into sub-indices (`concentration / limit × 100`),
//! takes the worst sub-index as the aggregate index, and classifies it into a
//! severity category. Every function here is pure: no I/O, no logging, no
//! shared mutable state.

use crate::error::IndexError;
use crate::models::{
    AggregateResult, Category, LimitOverrides, LimitSet, Pollutant, PollutantMap,
    PollutantReadings, SubIndexSet,
};

/// Default limits (µg/m³)
pub const DEFAULT_LIMITS: LimitSet = PollutantMap {
    pm25: 50.0,  // 24-hour mean
    pm10: 300.0, // 24-hour mean
    no2: 400.0,  // 1-hour mean
    so2: 200.0,  // 24-hour mean
    o3: 150.0,   // 8-hour mean
};

/// Upper band edge (inclusive) per category, ascending severity.
///
/// Each band covers `(previous edge, edge]`, so the table is contiguous over
/// `[0, ∞)`.
const CATEGORY_BANDS: [(f64, Category); 6] = [
    (50.0, Category::Good),
    (100.0, Category::Moderate),
    (150.0, Category::UnhealthySensitive),
    (200.0, Category::Unhealthy),
    (300.0, Category::VeryUnhealthy),
    (f64::INFINITY, Category::Hazardous),
];

/// Sub-index for one pollutant.
///
/// Returns `Ok(None)` when the concentration is missing or not finite.
/// Fails with `InvalidLimit` when the limit is not a positive number, whether
/// or not a concentration is present.
pub fn compute_sub_index(concentration: Option<f64>, limit: f64) -> Result<Option<f64>, IndexError> {
    if !(limit > 0.0) {
        return Err(IndexError::InvalidLimit {
            pollutant: None,
            limit,
        });
    }

    Ok(concentration
        .filter(|c| c.is_finite())
        .map(|c| (c / limit) * 100.0))
}

/// Category for a non-negative aggregate index
pub fn classify(index: f64) -> Category {
    CATEGORY_BANDS
        .iter()
        .find(|(upper, _)| index <= *upper)
        .map(|(_, category)| *category)
        // NaN compares false against every edge
        .unwrap_or(Category::Hazardous)
}

/// Merge overrides into the default limits, rejecting non-positive values
pub fn effective_limits(overrides: Option<&LimitOverrides>) -> Result<LimitSet, IndexError> {
    let mut limits = DEFAULT_LIMITS;

    if let Some(overrides) = overrides {
        for (pollutant, value) in overrides.iter() {
            if let Some(value) = value {
                *limits.get_mut(pollutant) = *value;
            }
        }
    }

    for (pollutant, limit) in limits.iter() {
        if !(*limit > 0.0) {
            return Err(IndexError::InvalidLimit {
                pollutant: Some(pollutant),
                limit: *limit,
            });
        }
    }

    Ok(limits)
}

/// Aggregate index for a reading set using the worst-pollutant rule
pub fn compute_aggregate(
    readings: &PollutantReadings,
    overrides: Option<&LimitOverrides>,
) -> Result<AggregateResult, IndexError> {
    let limits = effective_limits(overrides)?;

    let mut sub_indices = SubIndexSet::empty();
    for pollutant in Pollutant::ALL {
        let sub_index = compute_sub_index(*readings.get(pollutant), *limits.get(pollutant))
            .map_err(|err| match err {
                IndexError::InvalidLimit { limit, .. } => IndexError::InvalidLimit {
                    pollutant: Some(pollutant),
                    limit,
                },
                other => other,
            })?;
        *sub_indices.get_mut(pollutant) = sub_index;
    }

    let valid: Vec<f64> = sub_indices.iter().filter_map(|(_, v)| *v).collect();
    let index = valid
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(IndexError::InsufficientData)?;

    // Classify the unrounded value so rounding never moves a band edge
    let category = classify(index);

    Ok(AggregateResult {
        sub_indices,
        index: round_to(index, 2),
        category,
        category_label: category.label().to_string(),
        color: category.color().to_string(),
        limits,
        valid_measurements: valid.len(),
        total_pollutants: Pollutant::ALL.len(),
    })
}

/// Round half away from zero to `decimals` places
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
