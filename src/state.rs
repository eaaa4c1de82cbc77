//! Application state management
//!
//! In-memory record store for air quality calculations. Stands in for a
//! database: records are kept in insertion order and the oldest are evicted
//! once the store is full.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{AirIndexRecord, Category};

/// Maximum number of records to keep in memory
pub const MAX_RECORDS: usize = 10_000;

/// Sort order for record listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    DatetimeAsc,
    #[default]
    DatetimeDesc,
    IndexAsc,
    IndexDesc,
}

impl SortOrder {
    /// Parse `datetime`, `-datetime`, `index` or `-index`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "datetime" => Some(SortOrder::DatetimeAsc),
            "-datetime" => Some(SortOrder::DatetimeDesc),
            "index" => Some(SortOrder::IndexAsc),
            "-index" => Some(SortOrder::IndexDesc),
            _ => None,
        }
    }

    fn compare(&self, a: &AirIndexRecord, b: &AirIndexRecord) -> Ordering {
        match self {
            SortOrder::DatetimeAsc => a.datetime.cmp(&b.datetime),
            SortOrder::DatetimeDesc => b.datetime.cmp(&a.datetime),
            SortOrder::IndexAsc => a.index.total_cmp(&b.index),
            SortOrder::IndexDesc => b.index.total_cmp(&a.index),
        }
    }
}

/// Record filter shared by listings and statistics
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub station_id: Option<String>,
    pub category: Option<Category>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RecordFilter {
    fn matches(&self, record: &AirIndexRecord) -> bool {
        self.station_id
            .as_deref()
            .map_or(true, |id| record.station_id == id)
            && self.category.map_or(true, |c| record.category == c)
            && self.start.map_or(true, |start| record.datetime >= start)
            && self.end.map_or(true, |end| record.datetime <= end)
    }
}

/// One page of a record listing
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub records: Vec<AirIndexRecord>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: usize,
    pub limit: usize,
    pub skip: usize,
    pub has_more: bool,
}

/// Central application state
#[derive(Debug)]
pub struct AppState {
    records: VecDeque<AirIndexRecord>,
    /// Application start time
    start_time: DateTime<Utc>,
    /// Total records stored since start
    total_records: u64,
}

impl AppState {
    /// Create new application state
    pub fn new() -> Self {
        info!("Initializing application state");
        Self {
            records: VecDeque::new(),
            start_time: Utc::now(),
            total_records: 0,
        }
    }

    /// Store a record, evicting the oldest when at capacity
    pub fn add_record(&mut self, record: AirIndexRecord) {
        self.total_records += 1;

        if self.records.len() >= MAX_RECORDS {
            self.records.pop_front();
        }

        debug!(
            record_id = %record.id,
            station_id = %record.station_id,
            index = record.index,
            total = self.total_records,
            "Adding air index record to state"
        );

        self.records.push_back(record);
    }

    /// Look up a record by ID
    pub fn get(&self, id: Uuid) -> Option<&AirIndexRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Filtered, sorted and paged listing
    pub fn query(
        &self,
        filter: &RecordFilter,
        sort: SortOrder,
        skip: usize,
        limit: usize,
    ) -> RecordPage {
        let mut matching: Vec<&AirIndexRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();
        matching.sort_by(|a, b| sort.compare(a, b));

        let total = matching.len();
        let records = matching
            .into_iter()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect();

        RecordPage {
            records,
            pagination: Pagination {
                total,
                limit,
                skip,
                has_more: total > skip + limit,
            },
        }
    }

    /// Index statistics over the filtered records
    pub fn statistics(&self, filter: &RecordFilter) -> IndexStatistics {
        let matching: Vec<&AirIndexRecord> =
            self.records.iter().filter(|r| filter.matches(r)).collect();

        if matching.is_empty() {
            return IndexStatistics::empty();
        }

        let count = matching.len();
        let sum: f64 = matching.iter().map(|r| r.index).sum();

        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        for record in &matching {
            *by_category.entry(record.category).or_default() += 1;
        }

        IndexStatistics {
            overall: OverallStatistics {
                count,
                avg_index: sum / count as f64,
                min_index: matching.iter().map(|r| r.index).fold(f64::INFINITY, f64::min),
                max_index: matching.iter().map(|r| r.index).fold(f64::NEG_INFINITY, f64::max),
            },
            by_category: by_category
                .into_iter()
                .map(|(category, count)| CategoryCount { category, count })
                .collect(),
        }
    }

    /// Get uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (Utc::now() - self.start_time).num_seconds() as u64
    }

    /// Get total records stored since start
    pub fn total_records(&self) -> u64 {
        self.total_records
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistical summary of stored records
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStatistics {
    pub overall: OverallStatistics,
    /// Per-category counts, ascending severity
    pub by_category: Vec<CategoryCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStatistics {
    pub count: usize,
    pub avg_index: f64,
    pub min_index: f64,
    pub max_index: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

impl IndexStatistics {
    pub fn empty() -> Self {
        Self {
            overall: OverallStatistics {
                count: 0,
                avg_index: 0.0,
                min_index: 0.0,
                max_index: 0.0,
            },
            by_category: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::compute_aggregate;
    use crate::models::{PollutantMap, PollutantReadings};
    use chrono::Duration;

    fn record(station: &str, hours_ago: i64, pm25: f64) -> AirIndexRecord {
        let readings: PollutantReadings = PollutantMap {
            pm25: Some(pm25),
            ..PollutantReadings::empty()
        };
        let result = compute_aggregate(&readings, None).unwrap();
        AirIndexRecord::new(
            station.to_string(),
            Utc::now() - Duration::hours(hours_ago),
            readings,
            &result,
        )
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.is_empty());
        assert_eq!(state.total_records(), 0);
    }

    #[test]
    fn test_add_and_get() {
        let mut state = AppState::new();
        let rec = record("station-001", 0, 25.0);
        let id = rec.id;

        state.add_record(rec);

        assert_eq!(state.total_records(), 1);
        assert_eq!(state.get(id).unwrap().index, 50.0);
        assert!(state.get(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_bounded_store() {
        let mut state = AppState::new();

        for i in 0..(MAX_RECORDS + 10) {
            state.add_record(record("station-001", 0, i as f64 % 100.0));
        }

        assert_eq!(state.len(), MAX_RECORDS);
        assert_eq!(state.total_records(), (MAX_RECORDS + 10) as u64);
    }

    #[test]
    fn test_query_filter_sort_and_page() {
        let mut state = AppState::new();
        state.add_record(record("station-001", 3, 10.0)); // index 20, good
        state.add_record(record("station-002", 2, 60.0)); // index 120
        state.add_record(record("station-001", 1, 40.0)); // index 80
        state.add_record(record("station-001", 0, 200.0)); // index 400

        let filter = RecordFilter {
            station_id: Some("station-001".into()),
            ..Default::default()
        };

        let page = state.query(&filter, SortOrder::default(), 0, 2);
        assert_eq!(page.pagination.total, 3);
        assert!(page.pagination.has_more);
        assert_eq!(page.records[0].index, 400.0);
        assert_eq!(page.records[1].index, 80.0);

        let page = state.query(&filter, SortOrder::IndexAsc, 2, 2);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].index, 400.0);
        assert!(!page.pagination.has_more);

        let hazardous = RecordFilter {
            category: Some(Category::Hazardous),
            ..Default::default()
        };
        assert_eq!(state.query(&hazardous, SortOrder::default(), 0, 50).pagination.total, 1);
    }

    #[test]
    fn test_date_range_filter() {
        let mut state = AppState::new();
        state.add_record(record("station-001", 10, 10.0));
        state.add_record(record("station-001", 1, 10.0));

        let filter = RecordFilter {
            start: Some(Utc::now() - Duration::hours(5)),
            ..Default::default()
        };

        assert_eq!(state.query(&filter, SortOrder::default(), 0, 50).pagination.total, 1);
    }

    #[test]
    fn test_statistics() {
        let mut state = AppState::new();
        state.add_record(record("station-001", 1, 10.0)); // 20
        state.add_record(record("station-001", 0, 20.0)); // 40
        state.add_record(record("station-002", 0, 100.0)); // 200

        let stats = state.statistics(&RecordFilter::default());
        assert_eq!(stats.overall.count, 3);
        assert!((stats.overall.avg_index - 260.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.overall.min_index, 20.0);
        assert_eq!(stats.overall.max_index, 200.0);
        assert_eq!(stats.by_category.len(), 2);
        assert_eq!(stats.by_category[0].category, Category::Good);
        assert_eq!(stats.by_category[0].count, 2);
        assert_eq!(stats.by_category[1].category, Category::Unhealthy);

        let empty = state.statistics(&RecordFilter {
            station_id: Some("station-404".into()),
            ..Default::default()
        });
        assert_eq!(empty.overall.count, 0);
    }

    #[test]
    fn test_statistics_single_record() {
        let mut state = AppState::new();
        state.add_record(record("station-001", 0, 25.0)); // 50

        let stats = state.statistics(&RecordFilter::default());
        assert_eq!(stats.overall.count, 1);
        assert_eq!(stats.overall.min_index, 50.0);
        assert_eq!(stats.overall.max_index, 50.0);
        assert_eq!(stats.overall.avg_index, 50.0);
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::default(), SortOrder::DatetimeDesc);
        assert_eq!(SortOrder::parse("-datetime"), Some(SortOrder::DatetimeDesc));
        assert_eq!(SortOrder::parse("index"), Some(SortOrder::IndexAsc));
        assert_eq!(SortOrder::parse("station"), None);
    }
}
