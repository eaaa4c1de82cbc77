//! Sample history seeding
//!
//! Fills the record store with synthetic calculations for a handful of
//! stations, spaced two hours apart going back from a reference time.

use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::config::SeedSettings;
use crate::engine::compute_aggregate;
use crate::models::{AirIndexRecord, Category};
use crate::state::AppState;
use crate::synthetic::{generate_synthetic, SyntheticOptions};

/// Spacing between consecutive records of one station
const SEED_STEP_HOURS: i64 = 2;

/// Generate seed records for every configured station
pub fn generate_seed_records<R: Rng + ?Sized>(
    rng: &mut R,
    now: DateTime<Utc>,
    settings: &SeedSettings,
) -> Vec<AirIndexRecord> {
    let mut records = Vec::with_capacity(settings.stations * settings.records_per_station);

    for station in 1..=settings.stations {
        let station_id = format!("station-{:03}", station);

        for i in 0..settings.records_per_station {
            let datetime = now - Duration::hours(i as i64 * SEED_STEP_HOURS);
            let options = SyntheticOptions {
                hour: datetime.hour() as u8,
                include_missing: true,
                missing_probability: settings.missing_probability,
            };
            let pollutants = generate_synthetic(rng, &options);

            match compute_aggregate(&pollutants, None) {
                Ok(result) => records.push(AirIndexRecord::new(
                    station_id.clone(),
                    datetime,
                    pollutants,
                    &result,
                )),
                Err(e) => {
                    warn!(
                        station_id = %station_id,
                        datetime = %datetime,
                        error = %e,
                        "Failed to compute seed record"
                    );
                }
            }
        }
    }

    records
}

/// Insert seed records into the state and log per-category statistics
pub fn seed_state<R: Rng + ?Sized>(
    state: &mut AppState,
    rng: &mut R,
    now: DateTime<Utc>,
    settings: &SeedSettings,
) -> usize {
    info!(
        stations = settings.stations,
        records_per_station = settings.records_per_station,
        "Seeding air index records"
    );

    let records = generate_seed_records(rng, now, settings);
    let inserted = records.len();

    let mut by_category: BTreeMap<Category, (usize, f64)> = BTreeMap::new();
    for record in records {
        let entry = by_category.entry(record.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.index;
        state.add_record(record);
    }

    for (category, (count, sum)) in &by_category {
        info!(
            category = %category,
            count = count,
            avg_index = sum / *count as f64,
            "Seed statistics"
        );
    }

    info!(inserted = inserted, "Seed completed");
    inserted
}
