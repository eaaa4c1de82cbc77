//! Synthetic Pollutant Data Generator
//!
//! Produces plausible pollutant reading sets with a daily cycle: a morning
//! and an evening traffic peak, a clean night, and moderate daytime levels.
//! The output is meant for demos, seeding and tests, not for statistical
//! modelling.
//!
//! Randomness is always injected as a `rand::Rng`, so callers can pass a
//! seeded or mock generator and get reproducible readings.
//!
//! `SyntheticFeed` wraps the generator into a background task that keeps
//! adding fresh calculations to the application state.

use chrono::{DateTime, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::engine::{compute_aggregate, round_to};
use crate::error::IndexError;
use crate::models::{AirIndexRecord, PollutantMap, PollutantReadings};
use crate::state::AppState;

/// Default chance that a single pollutant reading is dropped
pub const DEFAULT_MISSING_PROBABILITY: f64 = 0.2;

/// Generation constants for one pollutant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollutantProfile {
    /// Level at a pollution factor of 0
    pub base: f64,
    /// Added on top of `base` at a pollution factor of 1
    pub spread: f64,
    /// Width of the symmetric noise band, before the 0.2 scale
    pub noise_range: f64,
}

impl PollutantProfile {
    /// Largest value the generator can produce for this pollutant
    pub fn max_value(&self) -> f64 {
        self.base + self.spread + self.noise_range * 0.1
    }
}

/// Per-pollutant generation constants (µg/m³)
pub const PROFILES: PollutantMap<PollutantProfile> = PollutantMap {
    pm25: PollutantProfile { base: 20.0, spread: 80.0, noise_range: 145.0 },
    pm10: PollutantProfile { base: 50.0, spread: 150.0, noise_range: 290.0 },
    no2: PollutantProfile { base: 50.0, spread: 200.0, noise_range: 390.0 },
    so2: PollutantProfile { base: 20.0, spread: 100.0, noise_range: 195.0 },
    o3: PollutantProfile { base: 40.0, spread: 120.0, noise_range: 240.0 },
};

/// Daily pollution regime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    /// 07:00-09:59
    MorningPeak,
    /// 17:00-19:59
    EveningPeak,
    /// 23:00-05:59
    Night,
    Daytime,
}

impl DayPeriod {
    /// Regime for an hour of day; hours past 23 wrap around
    pub fn from_hour(hour: u8) -> Self {
        match hour % 24 {
            7..=9 => DayPeriod::MorningPeak,
            17..=19 => DayPeriod::EveningPeak,
            23 | 0..=5 => DayPeriod::Night,
            _ => DayPeriod::Daytime,
        }
    }

    /// Range `[low, high)` of the pollution factor
    pub fn factor_range(&self) -> (f64, f64) {
        match self {
            DayPeriod::MorningPeak => (0.8, 1.0),
            DayPeriod::EveningPeak => (0.7, 1.0),
            DayPeriod::Night => (0.3, 0.5),
            DayPeriod::Daytime => (0.5, 0.8),
        }
    }
}

/// Options for one synthetic reading set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticOptions {
    pub hour: u8,
    pub include_missing: bool,
    pub missing_probability: f64,
}

impl SyntheticOptions {
    /// Options for `hour` with missing values enabled at the default probability
    pub fn at_hour(hour: u8) -> Self {
        Self {
            hour,
            include_missing: true,
            missing_probability: DEFAULT_MISSING_PROBABILITY,
        }
    }
}

/// Generate one reading set.
///
/// Draw order is fixed: the pollution factor first, then for each pollutant
/// its noise followed by its missing-value coin flip (only when missing
/// values are enabled).
pub fn generate_synthetic<R: Rng + ?Sized>(
    rng: &mut R,
    options: &SyntheticOptions,
) -> PollutantReadings {
    let (low, high) = DayPeriod::from_hour(options.hour).factor_range();
    let factor = low + rng.gen::<f64>() * (high - low);

    PollutantMap::from_fn(|pollutant| {
        let profile = *PROFILES.get(pollutant);
        let noise = (rng.gen::<f64>() - 0.5) * profile.noise_range * 0.2;
        let value = (profile.base + factor * profile.spread + noise).max(0.0);

        if options.include_missing && rng.gen::<f64>() < options.missing_probability {
            None
        } else {
            Some(round_to(value, 1))
        }
    })
}

/// Background producer of synthetic air index records
pub struct SyntheticFeed {
    /// Interval between records in milliseconds
    interval_ms: u64,
    missing_probability: f64,
    /// Number of stations records rotate over
    stations: usize,
    tick_count: u64,
}

impl SyntheticFeed {
    pub fn new(interval_ms: u64, missing_probability: f64, stations: usize) -> Self {
        info!(
            interval_ms = interval_ms,
            missing_probability = missing_probability,
            stations = stations,
            "Initializing synthetic data feed"
        );

        Self {
            interval_ms,
            missing_probability,
            stations: stations.max(1),
            tick_count: 0,
        }
    }

    /// Produce the next record for the hour of `now`
    pub fn next_record<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<AirIndexRecord, IndexError> {
        let station = (self.tick_count % self.stations as u64) + 1;
        self.tick_count += 1;

        let options = SyntheticOptions {
            hour: now.hour() as u8,
            include_missing: true,
            missing_probability: self.missing_probability,
        };
        let pollutants = generate_synthetic(rng, &options);
        let result = compute_aggregate(&pollutants, None)?;

        Ok(AirIndexRecord::new(
            format!("station-{:03}", station),
            now,
            pollutants,
            &result,
        ))
    }

    /// Run the feed continuously. A zero interval disables the feed.
    pub async fn run(mut self, state: Arc<RwLock<AppState>>) {
        if self.interval_ms == 0 {
            warn!("Synthetic data feed interval is 0, feed disabled");
            return;
        }

        info!("Starting synthetic data feed loop");

        let mut tick_interval = interval(Duration::from_millis(self.interval_ms));
        let mut rng = StdRng::from_entropy();

        loop {
            tick_interval.tick().await;

            let record = match self.next_record(&mut rng, Utc::now()) {
                Ok(record) => record,
                Err(e) => {
                    warn!(tick = self.tick_count, error = %e, "Skipping synthetic record");
                    continue;
                }
            };

            debug!(
                tick = self.tick_count,
                station_id = %record.station_id,
                index = record.index,
                category = %record.category,
                "Generated synthetic air index record"
            );

            let mut app_state = state.write().await;
            app_state.add_record(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pollutant;
    use rand::rngs::mock::StepRng;

    /// Every `gen::<f64>()` yields 0.0
    fn zeros() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Every `gen::<f64>()` yields 0.5
    fn halves() -> StepRng {
        StepRng::new(1 << 63, 0)
    }

    #[test]
    fn test_day_periods() {
        assert_eq!(DayPeriod::from_hour(7), DayPeriod::MorningPeak);
        assert_eq!(DayPeriod::from_hour(9), DayPeriod::MorningPeak);
        assert_eq!(DayPeriod::from_hour(10), DayPeriod::Daytime);
        assert_eq!(DayPeriod::from_hour(17), DayPeriod::EveningPeak);
        assert_eq!(DayPeriod::from_hour(19), DayPeriod::EveningPeak);
        assert_eq!(DayPeriod::from_hour(22), DayPeriod::Daytime);
        assert_eq!(DayPeriod::from_hour(23), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Night);
        assert_eq!(DayPeriod::from_hour(6), DayPeriod::Daytime);
        assert_eq!(DayPeriod::from_hour(31), DayPeriod::MorningPeak);
    }

    #[test]
    fn test_exact_output_at_lowest_draws() {
        let options = SyntheticOptions {
            hour: 8,
            include_missing: false,
            missing_probability: DEFAULT_MISSING_PROBABILITY,
        };

        // factor 0.8, noise -0.1 × noise_range
        let readings = generate_synthetic(&mut zeros(), &options);

        assert_eq!(readings.pm25, Some(69.5));
        assert_eq!(readings.pm10, Some(141.0));
        assert_eq!(readings.no2, Some(171.0));
        assert_eq!(readings.so2, Some(80.5));
        assert_eq!(readings.o3, Some(112.0));
    }

    #[test]
    fn test_exact_output_at_midpoint_draws() {
        // Night: factor 0.4, zero noise, 0.5 never below 0.2
        let readings = generate_synthetic(&mut halves(), &SyntheticOptions::at_hour(3));

        assert_eq!(readings.pm25, Some(52.0));
        assert_eq!(readings.pm10, Some(110.0));
        assert_eq!(readings.no2, Some(130.0));
        assert_eq!(readings.so2, Some(60.0));
        assert_eq!(readings.o3, Some(88.0));
    }

    #[test]
    fn test_missing_probability_bounds() {
        let all_missing = generate_synthetic(&mut zeros(), &SyntheticOptions::at_hour(12));
        assert_eq!(all_missing, PollutantReadings::empty());

        let options = SyntheticOptions {
            hour: 12,
            include_missing: true,
            missing_probability: 1.0,
        };
        assert_eq!(generate_synthetic(&mut halves(), &options).present_count(), 0);

        let options = SyntheticOptions {
            missing_probability: 0.0,
            ..options
        };
        assert_eq!(generate_synthetic(&mut zeros(), &options).present_count(), 5);
    }

    #[test]
    fn test_no_missing_values_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);

        for hour in 0..24u8 {
            for _ in 0..50 {
                let options = SyntheticOptions {
                    hour,
                    include_missing: false,
                    missing_probability: DEFAULT_MISSING_PROBABILITY,
                };
                let readings = generate_synthetic(&mut rng, &options);

                for pollutant in Pollutant::ALL {
                    let value = readings.get(pollutant).expect("value must be present");
                    let max = PROFILES.get(pollutant).max_value();
                    assert!(
                        (0.0..=max).contains(&value),
                        "{pollutant} = {value} outside [0, {max}] at hour {hour}"
                    );
                    assert_eq!(value, round_to(value, 1));
                }
            }
        }
    }

    #[test]
    fn test_missing_flips_are_per_pollutant() {
        let mut rng = StdRng::seed_from_u64(7);

        let partial = (0..500)
            .map(|_| generate_synthetic(&mut rng, &SyntheticOptions::at_hour(12)))
            .filter(|r| (1..=4).contains(&r.present_count()))
            .count();

        assert!(partial > 0, "expected some partially missing reading sets");
    }

    #[test]
    fn test_feed_rotates_stations() {
        let mut feed = SyntheticFeed::new(1000, 0.0, 3);
        let mut rng = StdRng::seed_from_u64(1);
        let now = Utc::now();

        let stations: Vec<String> = (0..4)
            .map(|_| feed.next_record(&mut rng, now).unwrap().station_id)
            .collect();

        assert_eq!(
            stations,
            vec!["station-001", "station-002", "station-003", "station-001"]
        );
    }

    #[test]
    fn test_feed_skips_empty_reading_sets() {
        let mut feed = SyntheticFeed::new(1000, 1.0, 1);
        let result = feed.next_record(&mut halves(), Utc::now());

        assert_eq!(result.unwrap_err(), IndexError::InsufficientData);
    }

    #[tokio::test]
    async fn test_feed_with_zero_interval_returns() {
        use tokio::time::timeout;

        let state = Arc::new(RwLock::new(AppState::new()));
        let feed = SyntheticFeed::new(0, 0.0, 1);

        timeout(Duration::from_millis(1000), feed.run(state.clone()))
            .await
            .expect("Feed with zero interval should return");

        assert!(state.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_feed_stores_records() {
        use tokio::time::timeout;

        let state = Arc::new(RwLock::new(AppState::new()));
        let feed = SyntheticFeed::new(10, 0.0, 2);

        let handle = tokio::spawn(feed.run(state.clone()));

        timeout(Duration::from_millis(1000), async {
            loop {
                if !state.read().await.is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timeout waiting for synthetic record");

        handle.abort();

        let state = state.read().await;
        assert!(state.total_records() >= 1);
    }
}
