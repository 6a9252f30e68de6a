//! Client for the seriesly store's HTTP API.

pub mod query;

use bytes::Bytes;
use reqwest::{Client, Response, StatusCode, Url};
use std::io::Write;
use tracing::{debug, info};

use crate::{
    metrics::RequestTimer,
    models::{DbInfo, QueryResponse},
    timelib, Result, SerieslyError,
};
pub use query::{Field, Filter, Query};

#[derive(Debug, Clone)]
pub struct Seriesly {
    url: Url,
    client: Client,
}

impl Seriesly {
    pub fn new(url: &str) -> Result<Self> {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: &str, client: Client) -> Result<Self> {
        let url = Url::parse(url).map_err(|e| SerieslyError::InvalidUrl(format!("{}: {}", url, e)))?;
        Ok(Self { url, client })
    }

    pub fn url(&self) -> Url {
        self.url.clone()
    }

    /// Lists every database on the server.
    pub async fn list(&self) -> Result<Vec<String>> {
        let timer = RequestTimer::new("list");
        let result = async {
            let mut url = self.url();
            url.set_path("/_all_dbs");
            let res = check_status(self.client.get(url).send().await?)?;
            Ok::<_, SerieslyError>(res.json::<Vec<String>>().await?)
        }
        .await;
        timer.observe(result)
    }

    pub fn db(&self, name: &str) -> SerieslyDb {
        SerieslyDb {
            s: self.clone(),
            db: name.to_string(),
        }
    }
}

/// Per-database operations.
#[derive(Debug, Clone)]
pub struct SerieslyDb {
    s: Seriesly,
    db: String,
}

impl SerieslyDb {
    pub fn name(&self) -> &str {
        &self.db
    }

    pub fn url(&self) -> Url {
        let mut url = self.s.url();
        url.set_path(&format!("/{}", self.db));
        url
    }

    fn url_with(&self, suffix: &str) -> Url {
        let mut url = self.url();
        url.set_path(&format!("/{}/{}", self.db, suffix));
        url
    }

    pub async fn info(&self) -> Result<DbInfo> {
        let timer = RequestTimer::new("info");
        let result = async {
            let res = check_status(self.s.client.get(self.url()).send().await?)?;
            let mut info: DbInfo = res.json().await?;
            if info.db_name.is_empty() {
                info.db_name = self.db.clone();
            }
            Ok::<_, SerieslyError>(info)
        }
        .await;
        timer.observe(result)
    }

    pub async fn compact(&self) -> Result<()> {
        let timer = RequestTimer::new("compact");
        let result = async {
            check_status(self.s.client.post(self.url_with("_compact")).send().await?)?;
            info!("Compacted database {}", self.db);
            Ok::<_, SerieslyError>(())
        }
        .await;
        timer.observe(result)
    }

    /// Streams the database, or the `[from, to]` slice of it, into `w`.
    ///
    /// `from` and `to` accept anything [`timelib::parse_time`] does and are
    /// sent to the server as nanoseconds. Returns the number of bytes written.
    pub async fn dump<W: Write>(&self, w: &mut W, from: Option<&str>, to: Option<&str>) -> Result<u64> {
        let mut params = Vec::new();
        for (name, value) in [("from", from), ("to", to)] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                let t = timelib::parse_time(value)?;
                let nanos = t.timestamp_nanos_opt().ok_or_else(|| {
                    SerieslyError::Timestamp(format!("{} out of range: {}", name, value))
                })?;
                params.push((name, nanos.to_string()));
            }
        }

        let mut url = self.url_with("_dump");
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let timer = RequestTimer::new("dump");
        let result = async {
            let mut res = check_status(self.s.client.get(url).send().await?)?;
            let mut written = 0u64;
            while let Some(chunk) = res.chunk().await? {
                written += write_chunk(w, &chunk)?;
            }
            debug!("Dumped {} bytes from {}", written, self.db);
            Ok::<_, SerieslyError>(written)
        }
        .await;
        timer.observe(result)
    }

    pub async fn query(&self, query: &Query) -> Result<QueryResponse> {
        query.validate()?;

        let mut url = self.url_with("_query");
        url.query_pairs_mut().extend_pairs(query.params());

        let timer = RequestTimer::new("query");
        let result = async {
            let res = check_status(self.s.client.get(url.clone()).send().await?)?;
            let body = res.text().await?;
            if body.trim().is_empty() {
                return Err(SerieslyError::NoData(url.to_string()));
            }
            Ok::<_, SerieslyError>(serde_json::from_str(&body)?)
        }
        .await;
        timer.observe(result)
    }
}

fn check_status(res: Response) -> Result<Response> {
    if res.status() != StatusCode::OK {
        return Err(SerieslyError::Http(res.status()));
    }
    Ok(res)
}

fn write_chunk<W: Write>(w: &mut W, chunk: &Bytes) -> Result<u64> {
    w.write_all(chunk)?;
    Ok(chunk.len() as u64)
}
