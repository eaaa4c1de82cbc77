//! Air Quality Index Service
//!
//! Computes air quality indices from pollutant concentrations: per-pollutant
//! sub-indices against reference limits, an aggregate index governed by the
//! worst pollutant, and its severity category. Also produces synthetic
//! pollutant data with a daily cycle for demos and seeding, and exposes all
//! of it over a small REST API.
//!
//! The index engine (`engine`) and the generator (`synthetic::generate_synthetic`)
//! are pure and can be used without the HTTP layer.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod state;
pub mod synthetic;
pub mod validation;

pub use engine::{classify, compute_aggregate, compute_sub_index, DEFAULT_LIMITS};
pub use error::IndexError;
pub use models::{
    AggregateResult, Category, LimitOverrides, LimitSet, Pollutant, PollutantMap,
    PollutantReadings, SubIndexSet,
};
pub use synthetic::{generate_synthetic, SyntheticOptions};
