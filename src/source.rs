//! Chart data source backed by a seriesly store.
//!
//! A [`SerieslySource`] hands out [`Metric`]s. Each metric answers a chart's
//! periodic "N samples between start and stop at this step" request with a
//! single `_query` against the store, then reshapes the sparse,
//! timestamp-keyed response into a dense series where every step without an
//! entry is [`MISSING`].

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{
    metrics::{self, RequestTimer},
    window::Window,
    Result, SerieslyError,
};

/// Sentinel for a step the store had no sample for.
pub const MISSING: f64 = f64::NAN;

/// What a chart polls for data.
#[async_trait]
pub trait MetricSource: Send + Sync {
    fn label(&self) -> &str;

    async fn fetch(&self, window: &Window) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone)]
pub struct SerieslySource {
    base_url: String,
    client: Client,
}

impl SerieslySource {
    /// `base_url` is joined to database names verbatim, so it normally ends in `/`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metric(&self, dbname: &str, ptr: &str, reducer: &str, label: Option<&str>) -> Metric {
        let label = match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => format!("{} - {}@{}", dbname, reducer, ptr),
        };
        Metric {
            source: self.clone(),
            dbname: dbname.to_string(),
            ptr: ptr.to_string(),
            reducer: reducer.to_string(),
            label,
        }
    }

    /// Fetches every metric over the same window concurrently.
    /// Results come back in input order and fail independently.
    pub async fn fetch_all(&self, metrics: &[Metric], window: &Window) -> Vec<Result<Vec<f64>>> {
        join_all(metrics.iter().map(|m| m.fetch(window))).await
    }
}

impl fmt::Display for SerieslySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base_url)
    }
}

#[derive(Debug, Clone)]
pub struct Metric {
    source: SerieslySource,
    dbname: String,
    ptr: String,
    reducer: String,
    label: String,
}

impl Metric {
    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn ptr(&self) -> &str {
        &self.ptr
    }

    pub fn reducer(&self) -> &str {
        &self.reducer
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn query_url(&self, window: &Window) -> Result<Url> {
        let raw = format!("{}{}/_query", self.source.base_url, self.dbname);
        let mut url =
            Url::parse(&raw).map_err(|e| SerieslyError::InvalidUrl(format!("{}: {}", raw, e)))?;
        url.query_pairs_mut()
            .append_pair("ptr", &self.ptr)
            .append_pair("reducer", &self.reducer)
            .append_pair("from", &window.start().to_string())
            .append_pair("to", &window.stop().to_string())
            .append_pair("group", &window.step().to_string());
        Ok(url)
    }

    pub async fn fetch(&self, window: &Window) -> Result<Vec<f64>> {
        let url = self.query_url(window)?;
        debug!("Fetching {} over {:?}", self.label, window);

        let timer = RequestTimer::new("series");
        let body = timer.observe(self.get_body(url.clone()).await)?;

        let data = match parse_body(&body)? {
            Some(data) => data,
            None => {
                metrics::record_empty_response();
                warn!("Empty response for {} from {}", self.label, url);
                return Err(SerieslyError::NoData(url.to_string()));
            }
        };

        let values = densify(window, &data);
        let missing = values.iter().filter(|v| v.is_nan()).count();
        metrics::record_missing_samples(missing);
        debug!("{}: {} samples, {} missing", self.label, values.len(), missing);

        Ok(values)
    }

    /// Polls in the shape a chart's refresh loop expects: `(start, stop, step, callback)`.
    ///
    /// The fetch runs on the current tokio runtime and `callback` is invoked
    /// exactly once, with the series or the reason there is none.
    pub fn poll<F>(&self, start: i64, stop: i64, step: i64, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<f64>>) + Send + 'static,
    {
        let metric = self.clone();
        tokio::spawn(async move {
            let result = match Window::new(start, stop, step) {
                Ok(window) => metric.fetch(&window).await,
                Err(e) => Err(e),
            };
            callback(result);
        })
    }

    async fn get_body(&self, url: Url) -> Result<String> {
        let res = self.source.client.get(url).send().await?;
        if res.status() != StatusCode::OK {
            return Err(SerieslyError::Http(res.status()));
        }
        Ok(res.text().await?)
    }
}

#[async_trait]
impl MetricSource for Metric {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, window: &Window) -> Result<Vec<f64>> {
        Metric::fetch(self, window).await
    }
}

/// Parses a response body, returning `None` for the falsy bodies
/// (empty, `null`, `false`, `0`, `""`) that carry no data at all.
pub fn parse_body(body: &str) -> Result<Option<Value>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: Value = serde_json::from_str(body)?;
    let falsy = match &value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    };
    Ok(if falsy { None } else { Some(value) })
}

/// Lays the response out over the window: one sample per step, taken from
/// the first element of the entry keyed by that step's timestamp.
pub fn densify(window: &Window, data: &Value) -> Vec<f64> {
    window
        .timestamps()
        .map(|t| data.get(t.to_string()).map_or(MISSING, first_sample))
        .collect()
}

fn first_sample(entry: &Value) -> f64 {
    match entry.get(0) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(MISSING),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(MISSING),
        _ => MISSING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn source() -> SerieslySource {
        SerieslySource::new("http://db/")
    }

    #[test]
    fn test_default_label() {
        let metric = source().metric("metrics", "cpu", "avg", None);
        assert_eq!(metric.label(), "metrics - avg@cpu");

        let metric = source().metric("metrics", "cpu", "avg", Some(""));
        assert_eq!(metric.label(), "metrics - avg@cpu");

        let metric = source().metric("metrics", "cpu", "avg", Some("CPU"));
        assert_eq!(metric.label(), "CPU");
    }

    #[test]
    fn test_display_is_base_url() {
        assert_eq!(source().to_string(), "http://db/");
        assert_eq!(SerieslySource::new("http://db:3133").to_string(), "http://db:3133");
    }

    #[test]
    fn test_query_url() {
        let metric = source().metric("metrics", "cpu", "avg", None);
        let window = Window::new(0, 3, 1).unwrap();
        assert_eq!(
            metric.query_url(&window).unwrap().as_str(),
            "http://db/metrics/_query?ptr=cpu&reducer=avg&from=0&to=3&group=1"
        );
    }

    #[test]
    fn test_query_url_encodes_pointer() {
        let metric = source().metric("metrics", "/cpu/user", "max", None);
        let window = Window::new(1_000, 2_000, 500).unwrap();
        let url = metric.query_url(&window).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("ptr".to_string(), "/cpu/user".to_string()));
        assert_eq!(pairs[4], ("group".to_string(), "500".to_string()));
    }

    #[test]
    fn test_densify_fills_gaps() {
        let window = Window::new(0, 3, 1).unwrap();
        let values = densify(&window, &json!({"0": [1], "2": [3]}));

        assert_eq!(values.len(), 3);
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }

    #[test]
    fn test_densify_uses_first_element_only() {
        let window = Window::new(100, 300, 100).unwrap();
        let values = densify(&window, &json!({"100": [2.5, 99], "200": ["7", 1]}));
        assert_eq!(values, vec![2.5, 7.0]);
    }

    #[test]
    fn test_densify_odd_entries_are_missing() {
        let window = Window::new(0, 5, 1).unwrap();
        let values = densify(
            &window,
            &json!({"0": [null], "1": [], "2": 4, "3": ["n/a"], "4": [{"v": 1}]}),
        );
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_densify_ignores_out_of_window_keys() {
        let window = Window::new(10, 40, 10).unwrap();
        let values = densify(&window, &json!({"0": [1], "15": [2], "30": [3], "40": [4]}));
        assert_eq!(values.len(), 3);
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
        assert_eq!(values[2], 3.0);
    }

    #[test]
    fn test_parse_body_falsy() {
        for body in ["", "  \n", "null", "false", "0", "\"\""] {
            assert!(parse_body(body).unwrap().is_none(), "body {:?}", body);
        }
        assert_eq!(parse_body("{}").unwrap(), Some(json!({})));
        assert!(parse_body("{not json").is_err());
    }
}
