//! Edge Scroll - edge-scrolling engine for precision touch pads
//!
//! Replays recorded digitizer traces, inspects report descriptors and
//! manages the engine configuration.

use edge_scroll::app::cli::{Cli, Commands, ConfigAction};
use edge_scroll::app::config::Config;
use edge_scroll::capture::ring_buffer::EventConsumer;
use edge_scroll::capture::sink::RingBufferSink;
use edge_scroll::device::capabilities::{DescriptorQuery, DeviceCapabilityResolver};
use edge_scroll::device::report::ReportDecoder;
use edge_scroll::time::Timebase;
use edge_scroll::workflow::recording::TraceRecording;
use edge_scroll::workflow::session::TouchSession;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Longest wait for an inertia tail after the last replayed frame
const INERTIA_DRAIN_LIMIT: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Pin the epoch before any frame is stamped
    Timebase::init();

    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Replay { input, json, buffer } => {
            run_replay(&input, json, buffer, config)?;
        }
        Commands::Describe {
            descriptor,
            name,
            vendor_id,
            product_id,
        } => {
            run_describe(&descriptor, name, vendor_id, product_id)?;
        }
        Commands::List { detailed } => {
            run_list(detailed)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config)?;
        }
    }

    Ok(())
}

fn run_replay(input: &Path, json: bool, buffer: usize, config: Config) -> anyhow::Result<()> {
    let trace = TraceRecording::load(input)?;
    info!(
        "Replaying {:?}: {} frames from {:?}",
        trace.metadata.name,
        trace.frames.len(),
        trace.device.name
    );

    let (sink, mut consumer) = RingBufferSink::with_capacity(buffer);
    let sink = Arc::new(sink);
    let mut session = TouchSession::new(config, sink.clone());
    let descriptor = session.attach_device(&trace.query())?.clone();
    println!(
        "Surface {:?}: x {}..{}, y {}..{}",
        descriptor.name,
        descriptor.logical_min_x,
        descriptor.logical_max_x,
        descriptor.logical_min_y,
        descriptor.logical_max_y
    );

    let mut printed = 0usize;
    for frame in &trace.frames {
        session.process_report(&frame.report, frame.timestamp);
        printed += print_events(&mut consumer, json)?;
    }

    let started = std::time::Instant::now();
    while session.is_inertia_running() && started.elapsed() < INERTIA_DRAIN_LIMIT {
        std::thread::sleep(Duration::from_millis(16));
        printed += print_events(&mut consumer, json)?;
    }
    session.detach();
    printed += print_events(&mut consumer, json)?;

    let stats = session.stats();
    let buffer_stats = sink.stats();
    println!(
        "\n{} reports ({} empty), {} frames, {} events printed",
        stats.reports, stats.empty_reports, stats.frames, printed
    );
    let dropped = buffer_stats.events_dropped.load(Ordering::Relaxed);
    if dropped > 0 {
        warn!(
            "{} events dropped ({:.1}%); raise --buffer",
            dropped,
            buffer_stats.drop_rate() * 100.0
        );
    }
    Ok(())
}

fn print_events(consumer: &mut EventConsumer, json: bool) -> anyhow::Result<usize> {
    let batch = consumer.pop_batch(usize::MAX);
    for slot in &batch {
        if json {
            println!("{}", serde_json::to_string(&slot.event)?);
        } else {
            println!("  #{:<5} {:?}", slot.sequence, slot.event);
        }
    }
    Ok(batch.len())
}

fn run_describe(path: &Path, name: String, vendor_id: u16, product_id: u16) -> anyhow::Result<()> {
    let bytes = std::fs::read(path)?;
    let query = DescriptorQuery::new(vendor_id, product_id, name, bytes);
    let (descriptor, layout) = DeviceCapabilityResolver::new().resolve(&query)?;
    let decoder = ReportDecoder::new(&layout);

    println!("Device: {:?} ({:04x}:{:04x})", descriptor.name, vendor_id, product_id);
    println!(
        "Logical X: {}..{} ({} units)",
        descriptor.logical_min_x,
        descriptor.logical_max_x,
        descriptor.width()
    );
    println!(
        "Logical Y: {}..{} ({} units)",
        descriptor.logical_min_y,
        descriptor.logical_max_y,
        descriptor.height()
    );
    println!("Contact slots: {}", decoder.slot_count());
    println!("Value fields: {}", layout.values.len());
    println!("Button fields: {}", layout.buttons.len());
    Ok(())
}

fn run_list(detailed: bool) -> anyhow::Result<()> {
    let traces_dir = Cli::traces_dir();

    if !traces_dir.exists() {
        println!("No traces found in {}", traces_dir.display());
        return Ok(());
    }

    println!("Traces in {:?}:", traces_dir);

    let mut entries: Vec<_> = std::fs::read_dir(&traces_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
        .collect();

    entries.sort_by_key(|e| e.path());

    for entry in &entries {
        let path = entry.path();
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();

        if detailed {
            match TraceRecording::load(&path) {
                Ok(trace) => {
                    let m = &trace.metadata;
                    println!(
                        "  {}  ({} frames, {:.1}s, device: {})",
                        file_name,
                        trace.frames.len(),
                        m.duration_ms as f64 / 1000.0,
                        trace.device.name
                    );
                }
                Err(e) => {
                    println!("  {}  (failed to load: {})", file_name, e);
                }
            }
        } else {
            println!("  {}", file_name);
        }
    }

    if entries.is_empty() {
        println!("  (none)");
    }

    Ok(())
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    std::fs::create_dir_all(Cli::traces_dir())?;

    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);
    println!("Traces directory: {:?}", Cli::traces_dir());
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", Config::default_path());
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            let value = config.get(&key)?;
            println!("{} = {}", key, value);
        }
        ConfigAction::Set { key, value } => {
            let config_path = Config::default_path();
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'edge-scroll init' first.");
            }

            let mut stored = Config::load(&config_path)?;
            stored.set(&key, &value)?;
            stored.save(&config_path)?;
            println!("Set {} = {}", key, stored.get(&key)?);
        }
        ConfigAction::Reset { force } => {
            let config_path = Config::default_path();

            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save_default()?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
