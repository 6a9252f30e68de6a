use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use seriesly_cubism::{
    api,
    client::Seriesly,
    config::Config,
    logging, metrics,
    tools::{self, DumpOptions, Report},
    Result,
};

#[derive(Parser, Debug)]
#[command(
    name = "seriesly_cubism",
    about = "Chart data source and maintenance tools for the seriesly store",
    version
)]
struct Cli {
    /// Store URL, overrides SERIESLY_URL
    #[arg(short, long)]
    url: Option<String>,

    /// Defaults to `serve`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve dense series over HTTP
    Serve,

    /// Compact every database
    Compact {
        /// Number of concurrent compactions
        #[arg(short = 'j', long, default_value_t = tools::DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Don't actually compact
        #[arg(short = 'n', long)]
        noop: bool,
    },

    /// Dump databases into gzip files
    Dump {
        /// Number of concurrent dumps
        #[arg(short = 'j', long, default_value_t = tools::DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Which db to dump (default: all)
        #[arg(long)]
        db: Option<String>,

        /// Don't actually write dumps
        #[arg(short = 'n', long)]
        noop: bool,

        /// Oldest key to dump
        #[arg(long)]
        from: Option<String>,

        /// Newest key to dump
        #[arg(long)]
        to: Option<String>,

        /// Dump name format (%n %Y %m %d %H %M %S %%)
        #[arg(long, default_value = tools::DEFAULT_DUMP_FORMAT)]
        format: String,

        /// Directory to write dumps into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print database statistics
    Info {
        /// One line per database
        #[arg(long)]
        short: bool,

        /// Databases to describe (default: all)
        dbs: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(url) = cli.url {
        config = config.with_url(url);
    }

    if let Err(e) = logging::init_logger(env!("CARGO_CRATE_NAME"), config.log_json) {
        eprintln!("{}", e);
        process::exit(1);
    }

    metrics::init_metrics();

    if let Err(e) = run(config, cli.command.unwrap_or(Commands::Serve)).await {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

async fn run(config: Config, command: Commands) -> Result<()> {
    let store = || Seriesly::with_client(&config.seriesly_url, config.http_client()?);

    match command {
        Commands::Serve => api::start_server(config.clone()).await?,
        Commands::Compact { concurrency, noop } => {
            let reports = tools::compact_all(&store()?, concurrency, noop).await?;
            exit_on_failures(&reports);
        }
        Commands::Dump {
            concurrency,
            db,
            noop,
            from,
            to,
            format,
            dir,
        } => {
            let opts = DumpOptions {
                db,
                from,
                to,
                format,
                dir,
                concurrency,
                noop,
            };
            let reports = tools::dump_all(&store()?, &opts).await?;
            exit_on_failures(&reports);
        }
        Commands::Info { short, dbs } => {
            print!("{}", tools::describe(&store()?, &dbs, short).await?);
        }
    }
    Ok(())
}

fn exit_on_failures<T>(reports: &[Report<T>]) {
    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    if failed > 0 {
        tracing::error!("{} of {} databases failed", failed, reports.len());
        process::exit(1);
    }
}
