use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use voicebox_core::app::{AudioCache, AudioEndpoints, CacheBuilder, CacheConfig, UploadRequest};
use voicebox_core::impls::{InMemoryArtifactStore, Mp3Codec, RecordingEventSink};
use voicebox_core::ports::{ArtifactStore, SystemClock, UlidGenerator};

const DEFAULT_LOG_FILTER: &str = "voicebox_core=info,voicebox_cli=info";

#[derive(Debug, Parser)]
#[command(name = "voicebox", version, about = "Bounded cache for uploaded voice recordings")]
struct Cli {
    /// Store directory (overrides VOICEBOX_STORE_ROOT)
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,

    /// Resident artifact limit (overrides VOICEBOX_MAX_CACHE_SIZE)
    #[arg(long, global = true)]
    max_cache_size: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload an audio file under the given name
    Upload {
        #[arg(long)]
        name: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Download an artifact into a local file
    Download {
        #[arg(long)]
        name: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Print cache statistics and resident artifacts
    Stats,
    /// Run an eviction walkthrough against an in-memory store
    Demo,
}

#[derive(Serialize)]
struct StatsReport<'a> {
    stats: voicebox_core::app::CacheStats,
    resident: &'a [voicebox_core::index::EvictionEntry],
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn endpoints<S: ArtifactStore>(cache: Arc<AudioCache<S>>) -> AudioEndpoints<S> {
    AudioEndpoints::new(
        cache,
        Arc::new(Mp3Codec),
        Arc::new(UlidGenerator::new(SystemClock)),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = CacheConfig::from_env()?;
    if let Some(root) = cli.store_root {
        config.store_root = root;
    }
    if let Some(size) = cli.max_cache_size {
        config.max_cache_size = size;
    }
    // 起動のたびに index は空なのでディレクトリから作り直す
    config.reconcile_on_start = true;

    match cli.command {
        Command::Upload { name, file } => {
            let raw = tokio::fs::read(&file).await?;
            let cache = Arc::new(AudioCache::open(&config, Arc::new(RecordingEventSink::new())).await?);
            let api = endpoints(cache);
            let request = UploadRequest {
                bytes: Some(STANDARD.encode(&raw)),
                filename: Some(name),
            };
            match api.upload(request).await {
                Ok(response) => print_json(&response)?,
                Err(e) => {
                    print_json(&e)?;
                    return Err(e.into());
                }
            }
        }
        Command::Download { name, out } => {
            let cache = Arc::new(AudioCache::open(&config, Arc::new(RecordingEventSink::new())).await?);
            let api = endpoints(cache);
            let mut file = match api.download_stream(Some(&name)).await {
                Ok(file) => file,
                Err(e) => {
                    print_json(&e)?;
                    return Err(e.into());
                }
            };
            let mut dest = tokio::fs::File::create(&out).await?;
            let written = tokio::io::copy(&mut file.body, &mut dest).await?;
            tracing::info!(
                file_name = %file.file_name,
                content_type = file.content_type,
                bytes = written,
                out = %out.display(),
                "artifact downloaded"
            );
        }
        Command::Stats => {
            let cache = AudioCache::open(&config, Arc::new(RecordingEventSink::new())).await?;
            let resident = cache.resident().await;
            print_json(&StatsReport {
                stats: cache.stats().await,
                resident: &resident,
            })?;
        }
        Command::Demo => run_demo(cli.max_cache_size.unwrap_or(2)).await?,
    }

    Ok(())
}

/// サイズ違いのクリップを順に入れて、追い出しの様子をイベントで見せる
async fn run_demo(capacity: usize) -> anyhow::Result<()> {
    let sink = Arc::new(RecordingEventSink::new());
    let cache = CacheBuilder::new(InMemoryArtifactStore::new("mp3"))
        .capacity(capacity)
        .event_sink(sink.clone())
        .build()?;
    let api = endpoints(Arc::new(cache));

    for (name, size) in [("a", 100), ("b", 50), ("c", 200), ("a", 100)] {
        let mut clip = b"ID3".to_vec();
        clip.resize(size, 0);
        let response = api
            .upload(UploadRequest {
                bytes: Some(STANDARD.encode(&clip)),
                filename: Some(name.to_string()),
            })
            .await?;
        println!("{name} ({size} bytes): {}", response.message);
    }

    for event in sink.events() {
        println!("{}", serde_json::to_string(&event)?);
    }
    print_json(&api.cache().stats().await)?;
    Ok(())
}
