use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use pinyin_translit::Transliterator;
use wordband_db::BandList;

use linguascope::annotate::FallbackAnnotator;
use linguascope::dict::DictService;
use linguascope::rate_limit::RateLimiterLayer;
use linguascope::{AppState, router};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_BANDLIST: &str = "wordlist.csv";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_RATE_LIMIT_RPS: u32 = 5;
const DEFAULT_RATE_LIMIT_BURST: u32 = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = load_config();
    info!("binding to {}:{}", config.host, config.port);
    info!("using band list at {}", config.bandlist_path.display());
    info!("using data dir at {}", config.data_dir.display());
    if config.disable_cache {
        info!("cache headers disabled");
    }
    info!(
        "rate limit: {} req/s (burst {})",
        config.rate_limit_rps, config.rate_limit_burst
    );

    let start = Instant::now();
    let bands = if config.bandlist_path.exists() {
        let list = BandList::load(&config.bandlist_path)?;
        info!(
            "band list loaded: {} rows in {} ms",
            list.len(),
            start.elapsed().as_millis()
        );
        list
    } else {
        warn!(
            "band list {} not found; band classification disabled",
            config.bandlist_path.display()
        );
        BandList::empty()
    };

    let mut translit = Transliterator::load(&config.data_dir)?;
    // Graded rows double as readings for the pronunciation annotator.
    for row in bands.iter() {
        if !row.pinyin.is_empty() {
            translit.add_reading(&row.word, &row.pinyin);
        }
    }
    info!("reading table: {} entries", translit.len());

    let annotator_start = Instant::now();
    let annotator = FallbackAnnotator::new();
    info!(
        "fallback annotator ready in {} ms",
        annotator_start.elapsed().as_millis()
    );

    let state = AppState {
        dict: Arc::new(DictService::new()),
        translit: Arc::new(translit),
        bands: Arc::new(bands),
        annotator: Arc::new(annotator),
        disable_cache: config.disable_cache,
    };

    let rate_limiter = RateLimiterLayer::new(config.rate_limit_rps, config.rate_limit_burst);
    let app = router(state)
        .layer(rate_limiter)
        .layer(TraceLayer::new_for_http());
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("invalid listen address");
    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Clone)]
struct Config {
    host: String,
    port: u16,
    bandlist_path: PathBuf,
    data_dir: PathBuf,
    disable_cache: bool,
    rate_limit_rps: u32,
    rate_limit_burst: u32,
}

fn load_config() -> Config {
    let mut disable_cache = false;
    let mut cli_bandlist: Option<PathBuf> = None;
    let mut cli_data_dir: Option<PathBuf> = None;
    let mut args = env::args().skip(1).peekable();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--no-cache" => disable_cache = true,
            "--bandlist" => {
                if let Some(path) = args.next() {
                    cli_bandlist = Some(PathBuf::from(path));
                }
            }
            _ => {
                if let Some(path) = arg.strip_prefix("--bandlist=") {
                    cli_bandlist = Some(PathBuf::from(path));
                } else if let Some(path) = arg.strip_prefix("--data-dir=") {
                    cli_data_dir = Some(PathBuf::from(path));
                }
            }
        }
    }

    let host = env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);
    let bandlist_path = cli_bandlist
        .or_else(|| env::var("BANDLIST_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BANDLIST));
    let data_dir = cli_data_dir
        .or_else(|| env::var("DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let rate_limit_rps = env::var("RATE_LIMIT_RPS")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_RPS);
    let rate_limit_burst = env::var("RATE_LIMIT_BURST")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_RATE_LIMIT_BURST);

    Config {
        host,
        port,
        bandlist_path,
        data_dir,
        disable_cache,
        rate_limit_rps,
        rate_limit_burst,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
