//! Store maintenance: compact or dump every database, and summarise them.

pub mod format;
pub mod info;

use chrono::{DateTime, Utc};
use flate2::{write::GzEncoder, Compression};
use futures::stream::{self, StreamExt};
use std::fs::{self, File};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    client::{Seriesly, SerieslyDb},
    timelib, Result,
};

pub const DEFAULT_CONCURRENCY: usize = 2;
pub const DEFAULT_DUMP_FORMAT: &str = "%n.json.gz";

/// Outcome of one database's maintenance job.
#[derive(Debug)]
pub struct Report<T> {
    pub db: String,
    pub result: Result<T>,
}

impl<T> Report<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Compacts every database, `concurrency` at a time.
///
/// Listing failures abort the run. A failed compaction is logged and
/// reported, and the remaining databases still run.
pub async fn compact_all(store: &Seriesly, concurrency: usize, noop: bool) -> Result<Vec<Report<()>>> {
    let dbs = store.list().await?;
    info!("Compacting {} databases", dbs.len());

    let reports = stream::iter(dbs)
        .map(|name| {
            let db = store.db(&name);
            async move {
                let start = Instant::now();
                let result = if noop { Ok(()) } else { db.compact().await };
                match &result {
                    Ok(()) => debug!("Finished compacting {} in {:?}", name, start.elapsed()),
                    Err(e) => warn!("Error compacting {}: {}", name, e),
                }
                Report { db: name, result }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    Ok(reports)
}

#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Only this database; every database when `None`.
    pub db: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// File name pattern, see [`format::dump_name`].
    pub format: String,
    /// Directory the expanded names are relative to.
    pub dir: PathBuf,
    pub concurrency: usize,
    /// List what would be dumped without touching the store or disk.
    pub noop: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            db: None,
            from: None,
            to: None,
            format: DEFAULT_DUMP_FORMAT.to_string(),
            dir: PathBuf::from("."),
            concurrency: DEFAULT_CONCURRENCY,
            noop: false,
        }
    }
}

/// Dumps databases into gzip files named by `opts.format`.
///
/// The range bounds are checked before anything is fetched. Every file of
/// one run is named with the same timestamp.
pub async fn dump_all(store: &Seriesly, opts: &DumpOptions) -> Result<Vec<Report<u64>>> {
    for bound in [&opts.from, &opts.to].into_iter().flatten() {
        if !bound.is_empty() {
            timelib::parse_time(bound)?;
        }
    }

    let dbs = match &opts.db {
        Some(db) => vec![db.clone()],
        None => store.list().await?,
    };
    let now = Utc::now();

    let reports = stream::iter(dbs)
        .map(|name| {
            let db = store.db(&name);
            async move {
                let start = Instant::now();
                let result = dump_one(&db, opts, now).await;
                match &result {
                    Ok(n) if !opts.noop => {
                        info!("Dumped {} of {} in {:?}", info::human_bytes(*n), name, start.elapsed())
                    }
                    Ok(_) => debug!("Would dump {}", name),
                    Err(e) => warn!("Error dumping {}: {}", name, e),
                }
                Report { db: name, result }
            }
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    Ok(reports)
}

async fn dump_one(db: &SerieslyDb, opts: &DumpOptions, now: DateTime<Utc>) -> Result<u64> {
    if opts.noop {
        return Ok(0);
    }

    let path = opts.dir.join(format::dump_name(&opts.format, db.name(), now));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut z = GzEncoder::new(File::create(&path)?, Compression::best());
    let result = db.dump(&mut z, opts.from.as_deref(), opts.to.as_deref()).await;
    let written = match result {
        Ok(n) => n,
        Err(e) => {
            drop(z);
            let _ = fs::remove_file(&path);
            return Err(e);
        }
    };
    z.finish()?;
    Ok(written)
}

/// Summaries of `dbs`, or of every database when `dbs` is empty.
pub async fn describe(store: &Seriesly, dbs: &[String], short: bool) -> Result<String> {
    let dbs = if dbs.is_empty() {
        store.list().await?
    } else {
        dbs.to_vec()
    };

    let mut rows = Vec::with_capacity(dbs.len());
    for name in dbs {
        let db_info = store.db(&name).info().await?;
        rows.push((name, db_info));
    }

    if short {
        return Ok(info::render_short(&rows));
    }
    Ok(rows
        .iter()
        .map(|(name, db_info)| info::render_long(name, db_info))
        .collect())
}
