use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use error::AppError;
use hlsflv_engine::driver::{self, RunOutcome};
use hlsflv_engine::{EngineConfig, HttpTransport, PlaybackSink, StreamingController};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod error;
mod sink;
mod utils;

use cli::CliArgs;
use sink::FlvFileSink;
use utils::{format_bytes, format_duration, parse_time, split_header};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    // RUST_LOG wins unless -v asks for debug output explicitly.
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Initialization(e.to_string()))?;

    let duration_limit = parse_time(&args.duration)?;
    if duration_limit < 0.0 {
        return Err(AppError::InvalidInput(format!(
            "Duration must not be negative: '{}'",
            args.duration
        )));
    }

    let config = build_config(&args);
    info!(
        url = %args.url,
        output = %args.output.display(),
        timeout_s = args.timeout,
        "Starting HLS to FLV playback"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping");
            signal_token.cancel();
        }
    });

    let file = BufWriter::new(File::create(&args.output)?);
    let limit = (duration_limit > 0.0).then_some(duration_limit);
    let sink = FlvFileSink::new(file, limit, shutdown.clone());

    let transport = Arc::new(HttpTransport::new(&config.http)?);
    let mut controller = StreamingController::new(args.url.clone(), &config, sink);

    let start = Instant::now();
    let result = driver::run(&mut controller, transport, &config.streaming, shutdown).await;

    let media_seconds = controller.sink().buffered_end();
    let sink = controller.into_sink();
    let (bytes, tags) = (sink.bytes_written(), sink.tags_written());
    sink.finish()?;

    let outcome = result?;
    match outcome {
        RunOutcome::EndOfStream => info!("Stream ended"),
        RunOutcome::Cancelled => warn!("Stopped before the end of the stream"),
    }
    info!(
        tags,
        "Wrote {} ({} of media) to {} in {}",
        format_bytes(bytes),
        format_duration(media_seconds),
        args.output.display(),
        format_duration(start.elapsed().as_secs_f64())
    );
    Ok(())
}

fn build_config(args: &CliArgs) -> EngineConfig {
    let mut builder = EngineConfig::builder()
        .with_credentials(args.with_credentials)
        .with_timeout(Duration::from_secs(args.timeout));

    for header in &args.headers {
        if let Some((name, value)) = split_header(header) {
            info!("Adding header: {}: {}", name, value);
            builder = builder.with_header(name, value);
        }
    }
    if let Some(bandwidth) = args.max_bandwidth {
        builder = builder.with_max_bandwidth(bandwidth);
    }
    if let Some(bandwidth) = args.initial_bandwidth {
        builder = builder.with_initial_bandwidth(bandwidth);
    }
    if let Some(viewport) = args.viewport {
        builder = builder.with_viewport(viewport);
    }
    builder.build()
}
