use chrono::{DateTime, Duration, SecondsFormat, Utc};

use crate::{Result, SerieslyError};

/// Reducers understood by the store's `_query` endpoint.
pub const REDUCERS: &[&str] = &["identity", "any", "count", "sum", "sumsq", "max", "min", "avg"];

/// A JSON pointer and the reducer applied to it per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub pointer: String,
    pub reducer: String,
}

impl Field {
    pub fn new(pointer: impl Into<String>, reducer: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            reducer: reducer.into(),
        }
    }
}

/// Exact match on the value at `pointer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub pointer: String,
    pub matches: String,
}

impl Filter {
    pub fn new(pointer: impl Into<String>, matches: impl Into<String>) -> Self {
        Self {
            pointer: pointer.into(),
            matches: matches.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Query {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub group: Duration,
    pub fields: Vec<Field>,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new(group: Duration) -> Self {
        Self {
            from: None,
            to: None,
            group,
            fields: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn field(mut self, pointer: &str, reducer: &str) -> Self {
        self.fields.push(Field::new(pointer, reducer));
        self
    }

    pub fn filter(mut self, pointer: &str, matches: &str) -> Self {
        self.filters.push(Filter::new(pointer, matches));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.group.num_milliseconds() < 1 {
            return Err(SerieslyError::InvalidQuery(format!(
                "grouping value must be >0ms, was {}ms",
                self.group.num_milliseconds()
            )));
        }
        if self.fields.is_empty() {
            return Err(SerieslyError::InvalidQuery(
                "need at least one field".to_string(),
            ));
        }
        if let Some(field) = self.fields.iter().find(|f| !REDUCERS.contains(&f.reducer.as_str())) {
            return Err(SerieslyError::InvalidQuery(format!(
                "invalid reducer: {}",
                field.reducer
            )));
        }
        Ok(())
    }

    /// Query-string pairs in the order the store reads them.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("group", self.group.num_milliseconds().to_string())];
        if let Some(from) = self.from {
            params.push(("from", from.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
        }
        if let Some(to) = self.to {
            params.push(("to", to.to_rfc3339_opts(SecondsFormat::AutoSi, true)));
        }
        for field in &self.fields {
            params.push(("ptr", field.pointer.clone()));
            params.push(("reducer", field.reducer.clone()));
        }
        for filter in &self.filters {
            params.push(("f", filter.pointer.clone()));
            params.push(("fv", filter.matches.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate() {
        let ok = Query::new(Duration::seconds(1)).field("/cpu", "avg");
        assert!(ok.validate().is_ok());

        let no_group = Query::new(Duration::zero()).field("/cpu", "avg");
        assert!(matches!(no_group.validate(), Err(SerieslyError::InvalidQuery(_))));

        let no_fields = Query::new(Duration::seconds(1));
        assert!(no_fields.validate().is_err());

        let bad_reducer = Query::new(Duration::seconds(1)).field("/cpu", "median");
        let err = bad_reducer.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid query: invalid reducer: median");
    }

    #[test]
    fn test_params() {
        let from = Utc.with_ymd_and_hms(2012, 8, 28, 21, 0, 0).unwrap();
        let to = from + Duration::milliseconds(1500);
        let query = Query::new(Duration::minutes(5))
            .between(from, to)
            .field("/cpu", "avg")
            .field("/mem", "max")
            .filter("/host", "web1");

        assert_eq!(
            query.params(),
            vec![
                ("group", "300000".to_string()),
                ("from", "2012-08-28T21:00:00Z".to_string()),
                ("to", "2012-08-28T21:00:01.500Z".to_string()),
                ("ptr", "/cpu".to_string()),
                ("reducer", "avg".to_string()),
                ("ptr", "/mem".to_string()),
                ("reducer", "max".to_string()),
                ("f", "/host".to_string()),
                ("fv", "web1".to_string()),
            ]
        );
    }

    #[test]
    fn test_params_without_range() {
        let query = Query::new(Duration::seconds(1)).field("/x", "count");
        let keys: Vec<&str> = query.params().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["group", "ptr", "reducer"]);
    }
}
