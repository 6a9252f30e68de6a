use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Database statistics as reported by `GET /{db}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbInfo {
    #[serde(rename = "DBName", default)]
    pub db_name: String,
    #[serde(default)]
    pub space_used: u64,
    #[serde(default)]
    pub last_seq: u64,
    #[serde(default)]
    pub header_pos: u64,
    #[serde(default)]
    pub doc_count: u64,
    #[serde(default)]
    pub deleted_count: u64,
    #[serde(rename = "Error", default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw `_query` result: millisecond timestamp to one value per requested field.
pub type QueryResponse = BTreeMap<i64, Vec<serde_json::Value>>;

/// A dense series as served to browser charts. Missing samples serialise as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesResponse {
    pub label: String,
    pub start: i64,
    pub stop: i64,
    pub step: i64,
    pub values: Vec<Option<f64>>,
}

impl SeriesResponse {
    pub fn new(label: String, start: i64, stop: i64, step: i64, values: &[f64]) -> Self {
        Self {
            label,
            start,
            stop,
            step,
            values: values
                .iter()
                .map(|v| if v.is_nan() { None } else { Some(*v) })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_db_info_from_store() {
        let raw = r#"{
            "space_used": 4096,
            "last_seq": 12,
            "header_pos": 2048,
            "doc_count": 10,
            "deleted_count": 2
        }"#;
        let info: DbInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.space_used, 4096);
        assert_eq!(info.doc_count, 10);
        assert_eq!(info.deleted_count, 2);
        assert_eq!(info.error, None);
    }

    #[test]
    fn test_query_response_keys() {
        let raw = r#"{"1346189075000": [1.5, 3], "1346189076000": [null, 0]}"#;
        let parsed: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&1_346_189_075_000][0], serde_json::json!(1.5));
        assert!(parsed[&1_346_189_076_000][0].is_null());
    }

    #[test]
    fn test_series_response_nulls() {
        let resp = SeriesResponse::new("m".into(), 0, 3, 1, &[1.0, f64::NAN, 3.0]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["values"], serde_json::json!([1.0, null, 3.0]));
    }
}
