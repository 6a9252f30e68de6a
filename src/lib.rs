//! Chart data source for the seriesly time-series store.
//!
//! [`source`] turns a chart's `(start, stop, step)` polls into `_query`
//! requests and dense, NaN-padded series. [`client`] covers the rest of the
//! store's HTTP API, and [`api`] serves series to browser charts.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod source;
pub mod timelib;
pub mod tools;
pub mod window;

pub use error::{Result, SerieslyError};
pub use source::{Metric, MetricSource, SerieslySource, MISSING};
pub use window::Window;
