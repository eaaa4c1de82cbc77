//! Input validation module
//!
//! Checks request payloads and query strings before they reach the index
//! engine, and turns them into engine inputs.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{AppError, AppResult};
use crate::models::{
    AggregateResult, AirIndexCalcInput, Category, GenerateQuery, LimitOverrides, PollutantReadings, RecordQuery,
    StatsQuery,
};
use crate::state::{RecordFilter, SortOrder};
use crate::synthetic::SyntheticOptions;

/// Listing page size bounds
pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// Validated calculation request
#[derive(Debug, Clone)]
pub struct CalcRequest {
    pub station_id: String,
    pub datetime: DateTime<Utc>,
    pub pollutants: PollutantReadings,
    pub limits: Option<LimitOverrides>,
}

/// Validate a calculation payload
pub fn validate_calc_input(mut input: AirIndexCalcInput) -> AppResult<CalcRequest> {
    input.station_id = input.station_id.trim().to_string();

    if let Err(validation_errors) = input.validate() {
        let error_messages = collect_messages("", &validation_errors);
        warn!(errors = ?error_messages, "Air index input validation failed");
        return Err(AppError::ValidationError(error_messages.join("; ")));
    }

    let pollutants: PollutantReadings = input.pollutants.into();
    for (pollutant, value) in pollutants.iter() {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(AppError::ValidationError(format!(
                "pollutants.{}: must be a finite number",
                pollutant
            )));
        }
    }

    debug!("Air index input validation passed");
    Ok(CalcRequest {
        station_id: input.station_id,
        datetime: input.datetime,
        pollutants,
        limits: input.limits.map(Into::into),
    })
}

/// Reject results whose sub-indices overflowed `f64`, as with a huge reading
/// or a tiny limit override
pub fn validate_aggregate(result: &AggregateResult) -> AppResult<()> {
    for (pollutant, sub_index) in result.sub_indices.iter() {
        if sub_index.is_some_and(|v| !v.is_finite()) {
            warn!(pollutant = %pollutant, "Sub-index out of range");
            return Err(AppError::ValidationError(format!(
                "pollutants.{}: concentration is too large for its limit",
                pollutant
            )));
        }
    }

    Ok(())
}

/// Flatten nested validator errors into `path: message` strings
fn collect_messages(prefix: &str, errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();

    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = match (prefix.is_empty(), field.as_str()) {
            (_, "__all__") => prefix.to_string(),
            (true, _) => field,
            (false, _) => format!("{}.{}", prefix, field),
        };

        match kind {
            ValidationErrorsKind::Field(errs) => {
                let msgs: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                messages.push(format!("{}: {}", path, msgs.join(", ")));
            }
            ValidationErrorsKind::Struct(nested) => {
                messages.extend(collect_messages(&path, nested));
            }
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    messages.extend(collect_messages(&format!("{}[{}]", path, idx), nested));
                }
            }
        }
    }

    messages.sort();
    messages
}

/// Validate generation parameters, filling in defaults
pub fn validate_generate_query(
    query: &GenerateQuery,
    current_hour: u8,
    default_missing_probability: f64,
) -> AppResult<SyntheticOptions> {
    if let Err(validation_errors) = query.validate() {
        let error_messages = collect_messages("", &validation_errors);
        return Err(AppError::ValidationError(error_messages.join("; ")));
    }

    Ok(SyntheticOptions {
        hour: query.hour.unwrap_or(current_hour),
        include_missing: query.include_missing.unwrap_or(true),
        missing_probability: query
            .missing_probability
            .unwrap_or(default_missing_probability),
    })
}

/// Validate pagination parameters, returning `(skip, limit)`
pub fn validate_pagination(skip: Option<u32>, limit: Option<u32>) -> AppResult<(usize, usize)> {
    let skip = skip.unwrap_or(0);
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(AppError::ValidationError(format!(
            "Limit must be between 1 and {}",
            MAX_PAGE_LIMIT
        )));
    }

    Ok((skip as usize, limit as usize))
}

fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> AppResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::ValidationError(
                "startDate must not be after endDate".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validate listing parameters
pub fn validate_record_query(
    query: &RecordQuery,
) -> AppResult<(RecordFilter, SortOrder, usize, usize)> {
    let (skip, limit) = validate_pagination(query.skip, query.limit)?;
    validate_date_range(query.start_date, query.end_date)?;

    let category = query
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let sort = match query.sort.as_deref() {
        None => SortOrder::default(),
        Some(value) => SortOrder::parse(value).ok_or_else(|| {
            AppError::BadRequest(format!(
                "Invalid sort: {}. Valid values: datetime, -datetime, index, -index",
                value
            ))
        })?,
    };

    let filter = RecordFilter {
        station_id: query.station_id.clone(),
        category,
        start: query.start_date,
        end: query.end_date,
    };

    Ok((filter, sort, skip, limit))
}

/// Validate statistics parameters
pub fn validate_stats_query(query: &StatsQuery) -> AppResult<RecordFilter> {
    validate_date_range(query.start_date, query.end_date)?;

    Ok(RecordFilter {
        station_id: query.station_id.clone(),
        category: None,
        start: query.start_date,
        end: query.end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LimitsInput, PollutantsInput};

    fn input() -> AirIndexCalcInput {
        AirIndexCalcInput {
            station_id: "  station-001 ".to_string(),
            datetime: Utc::now(),
            pollutants: PollutantsInput {
                pm25: Some(25.0),
                so2: Some(100.0),
                ..Default::default()
            },
            limits: None,
        }
    }

    #[test]
    fn test_valid_calc_input() {
        let request = validate_calc_input(input()).unwrap();

        assert_eq!(request.station_id, "station-001");
        assert_eq!(request.pollutants.pm25, Some(25.0));
        assert_eq!(request.pollutants.pm10, None);
        assert!(request.limits.is_none());
    }

    #[test]
    fn test_blank_station_id() {
        let mut blank = input();
        blank.station_id = "   ".to_string();

        let result = validate_calc_input(blank);
        if let Err(AppError::ValidationError(msg)) = result {
            assert!(msg.contains("stationId must be 1-100 characters"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_negative_concentration() {
        let mut negative = input();
        negative.pollutants.no2 = Some(-5.0);

        let result = validate_calc_input(negative);
        if let Err(AppError::ValidationError(msg)) = result {
            assert!(msg.contains("NO2 must be non-negative"));
        } else {
            panic!("expected validation error");
        }
    }

    #[test]
    fn test_non_positive_limit() {
        let mut bad_limit = input();
        bad_limit.limits = Some(LimitsInput {
            pm10: Some(-1.0),
            ..Default::default()
        });

        assert!(matches!(
            validate_calc_input(bad_limit),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_no_pollutants_passes_through() {
        let mut empty = input();
        empty.pollutants = PollutantsInput::default();

        let request = validate_calc_input(empty).unwrap();
        assert_eq!(request.pollutants.present_count(), 0);
    }

    #[test]
    fn test_generate_query_defaults() {
        let options = validate_generate_query(&GenerateQuery::default(), 14, 0.2).unwrap();

        assert_eq!(options.hour, 14);
        assert!(options.include_missing);
        assert_eq!(options.missing_probability, 0.2);

        let query = GenerateQuery {
            hour: Some(24),
            ..Default::default()
        };
        assert!(validate_generate_query(&query, 14, 0.2).is_err());

        let query = GenerateQuery {
            missing_probability: Some(1.5),
            ..Default::default()
        };
        assert!(validate_generate_query(&query, 14, 0.2).is_err());
    }

    #[test]
    fn test_pagination_validation() {
        assert_eq!(validate_pagination(None, None).unwrap(), (0, 50));
        assert_eq!(validate_pagination(Some(20), Some(10)).unwrap(), (20, 10));

        assert!(validate_pagination(Some(0), Some(0)).is_err());
        assert!(validate_pagination(None, Some(2000)).is_err());
    }

    #[test]
    fn test_record_query_validation() {
        let query = RecordQuery {
            category: Some("hazardous".to_string()),
            sort: Some("-index".to_string()),
            ..Default::default()
        };
        let (filter, sort, _, _) = validate_record_query(&query).unwrap();
        assert_eq!(filter.category, Some(Category::Hazardous));
        assert_eq!(sort, SortOrder::IndexDesc);

        let query = RecordQuery {
            category: Some("awful".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate_record_query(&query),
            Err(AppError::BadRequest(_))
        ));

        let query = RecordQuery {
            start_date: Some(Utc::now()),
            end_date: Some(Utc::now() - chrono::Duration::days(1)),
            ..Default::default()
        };
        assert!(validate_record_query(&query).is_err());
    }
}
