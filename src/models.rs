//! Data models for pollutant readings and air quality index records
//!
//! Defines the domain values consumed and produced by the index engine, the
//! stored record shape, and the request/response DTOs of the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Pollutants tracked by the index, in fixed evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    /// Fine particulate matter (≤ 2.5 µm)
    #[serde(rename = "PM25")]
    Pm25,
    /// Coarse particulate matter (≤ 10 µm)
    #[serde(rename = "PM10")]
    Pm10,
    /// Nitrogen dioxide
    #[serde(rename = "NO2")]
    No2,
    /// Sulphur dioxide
    #[serde(rename = "SO2")]
    So2,
    /// Ozone
    #[serde(rename = "O3")]
    O3,
}

impl Pollutant {
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::So2,
        Pollutant::O3,
    ];

    /// Wire key used in JSON payloads
    pub fn key(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM25",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::So2 => "SO2",
            Pollutant::O3 => "O3",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value per pollutant.
///
/// Every pollutant always has a slot; absence of a measurement is expressed
/// through `T = Option<f64>`, never through a sentinel number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantMap<T> {
    #[serde(rename = "PM25", default)]
    pub pm25: T,
    #[serde(rename = "PM10", default)]
    pub pm10: T,
    #[serde(rename = "NO2", default)]
    pub no2: T,
    #[serde(rename = "SO2", default)]
    pub so2: T,
    #[serde(rename = "O3", default)]
    pub o3: T,
}

impl<T> PollutantMap<T> {
    /// Build a map by evaluating `f` once per pollutant, in `Pollutant::ALL` order
    pub fn from_fn(mut f: impl FnMut(Pollutant) -> T) -> Self {
        Self {
            pm25: f(Pollutant::Pm25),
            pm10: f(Pollutant::Pm10),
            no2: f(Pollutant::No2),
            so2: f(Pollutant::So2),
            o3: f(Pollutant::O3),
        }
    }

    pub fn get(&self, pollutant: Pollutant) -> &T {
        match pollutant {
            Pollutant::Pm25 => &self.pm25,
            Pollutant::Pm10 => &self.pm10,
            Pollutant::No2 => &self.no2,
            Pollutant::So2 => &self.so2,
            Pollutant::O3 => &self.o3,
        }
    }

    pub fn get_mut(&mut self, pollutant: Pollutant) -> &mut T {
        match pollutant {
            Pollutant::Pm25 => &mut self.pm25,
            Pollutant::Pm10 => &mut self.pm10,
            Pollutant::No2 => &mut self.no2,
            Pollutant::So2 => &mut self.so2,
            Pollutant::O3 => &mut self.o3,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, &T)> {
        Pollutant::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

impl PollutantMap<Option<f64>> {
    /// Map with every pollutant missing
    pub fn empty() -> Self {
        Self::from_fn(|_| None)
    }

    /// Count of pollutants carrying a value
    pub fn present_count(&self) -> usize {
        self.iter().filter(|(_, v)| v.is_some()).count()
    }
}

/// Measured concentrations (µg/m³); `None` means "not measured"
pub type PollutantReadings = PollutantMap<Option<f64>>;

/// Reference concentrations mapping to a sub-index of 100
pub type LimitSet = PollutantMap<f64>;

/// Per-call limit overrides; `None` falls back to the default limit
pub type LimitOverrides = PollutantMap<Option<f64>>;

/// Per-pollutant sub-indices; `None` mirrors a missing reading
pub type SubIndexSet = PollutantMap<Option<f64>>;

/// Air quality severity category, ascending severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Good,
    Moderate,
    UnhealthySensitive,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Good,
        Category::Moderate,
        Category::UnhealthySensitive,
        Category::Unhealthy,
        Category::VeryUnhealthy,
        Category::Hazardous,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Good => "good",
            Category::Moderate => "moderate",
            Category::UnhealthySensitive => "unhealthy-sensitive",
            Category::Unhealthy => "unhealthy",
            Category::VeryUnhealthy => "very-unhealthy",
            Category::Hazardous => "hazardous",
        }
    }

    /// Display label shown to end users
    pub fn label(&self) -> &'static str {
        match self {
            Category::Good => "Добре",
            Category::Moderate => "Помірно",
            Category::UnhealthySensitive => "Погано для чутливих",
            Category::Unhealthy => "Погано",
            Category::VeryUnhealthy => "Дуже погано",
            Category::Hazardous => "Небезпечно",
        }
    }

    /// Hex color used when rendering the category
    pub fn color(&self) -> &'static str {
        match self {
            Category::Good => "#00E400",
            Category::Moderate => "#FFFF00",
            Category::UnhealthySensitive => "#FF7E00",
            Category::Unhealthy => "#FF0000",
            Category::VeryUnhealthy => "#8F3F97",
            Category::Hazardous => "#7E0023",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid category: {}. Valid categories: {}",
                    s,
                    Category::ALL.map(|c| c.name()).join(", ")
                )
            })
    }
}

/// Result of one aggregate index calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub sub_indices: SubIndexSet,
    /// Aggregate index, rounded to 2 decimal places
    pub index: f64,
    pub category: Category,
    pub category_label: String,
    pub color: String,
    /// Effective limits after merging overrides
    pub limits: LimitSet,
    pub valid_measurements: usize,
    pub total_pollutants: usize,
}

/// Stored air quality calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirIndexRecord {
    pub id: Uuid,
    pub station_id: String,
    pub datetime: DateTime<Utc>,
    pub pollutants: PollutantReadings,
    pub sub_indices: SubIndexSet,
    pub index: f64,
    pub category: Category,
    pub color: String,
    pub limits: LimitSet,
    pub created_at: DateTime<Utc>,
}

impl AirIndexRecord {
    /// Create a record from a calculation result, stamped with a fresh ID
    pub fn new(
        station_id: String,
        datetime: DateTime<Utc>,
        pollutants: PollutantReadings,
        result: &AggregateResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            station_id,
            datetime,
            pollutants,
            sub_indices: result.sub_indices,
            index: result.index,
            category: result.category,
            color: result.color.clone(),
            limits: result.limits,
            created_at: Utc::now(),
        }
    }
}

/// Pollutant concentrations as submitted by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PollutantsInput {
    #[serde(rename = "PM25", default)]
    #[validate(range(min = 0.0, message = "PM25 must be non-negative"))]
    pub pm25: Option<f64>,

    #[serde(rename = "PM10", default)]
    #[validate(range(min = 0.0, message = "PM10 must be non-negative"))]
    pub pm10: Option<f64>,

    #[serde(rename = "NO2", default)]
    #[validate(range(min = 0.0, message = "NO2 must be non-negative"))]
    pub no2: Option<f64>,

    #[serde(rename = "SO2", default)]
    #[validate(range(min = 0.0, message = "SO2 must be non-negative"))]
    pub so2: Option<f64>,

    #[serde(rename = "O3", default)]
    #[validate(range(min = 0.0, message = "O3 must be non-negative"))]
    pub o3: Option<f64>,
}

impl From<PollutantsInput> for PollutantReadings {
    fn from(input: PollutantsInput) -> Self {
        PollutantMap {
            pm25: input.pm25,
            pm10: input.pm10,
            no2: input.no2,
            so2: input.so2,
            o3: input.o3,
        }
    }
}

/// Custom limits as submitted by clients
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LimitsInput {
    #[serde(rename = "PM25", default)]
    #[validate(range(exclusive_min = 0.0, message = "PM25 limit must be positive"))]
    pub pm25: Option<f64>,

    #[serde(rename = "PM10", default)]
    #[validate(range(exclusive_min = 0.0, message = "PM10 limit must be positive"))]
    pub pm10: Option<f64>,

    #[serde(rename = "NO2", default)]
    #[validate(range(exclusive_min = 0.0, message = "NO2 limit must be positive"))]
    pub no2: Option<f64>,

    #[serde(rename = "SO2", default)]
    #[validate(range(exclusive_min = 0.0, message = "SO2 limit must be positive"))]
    pub so2: Option<f64>,

    #[serde(rename = "O3", default)]
    #[validate(range(exclusive_min = 0.0, message = "O3 limit must be positive"))]
    pub o3: Option<f64>,
}

impl From<LimitsInput> for LimitOverrides {
    fn from(input: LimitsInput) -> Self {
        PollutantMap {
            pm25: input.pm25,
            pm10: input.pm10,
            no2: input.no2,
            so2: input.so2,
            o3: input.o3,
        }
    }
}

/// Input DTO for `POST /api/airindex/calc`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AirIndexCalcInput {
    #[validate(length(min = 1, max = 100, message = "stationId must be 1-100 characters"))]
    pub station_id: String,

    pub datetime: DateTime<Utc>,

    #[validate(nested)]
    pub pollutants: PollutantsInput,

    #[validate(nested)]
    pub limits: Option<LimitsInput>,
}

/// Query parameters for synthetic data generation
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuery {
    #[validate(range(max = 23, message = "hour must be between 0 and 23"))]
    pub hour: Option<u8>,

    #[serde(alias = "includeNulls")]
    pub include_missing: Option<bool>,

    #[serde(alias = "nullProbability")]
    #[validate(range(min = 0.0, max = 1.0, message = "missingProbability must be between 0 and 1"))]
    pub missing_probability: Option<f64>,
}

/// Query parameters for record listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub station_id: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub skip: Option<u32>,
    pub sort: Option<String>,
}

/// Query parameters for statistics
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub station_id: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Query parameters for the calculation endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalcQuery {
    pub save: Option<bool>,
}

/// Success envelope for API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    pub total_records: u64,
}
