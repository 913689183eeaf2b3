//! Drishti node binary.
//!
//! Loads configuration, builds the detection engine, starts the frame and
//! timer threads and optionally replays recorded point clouds.
//!
//! # Usage
//!
//! ```bash
//! drishti --config drishti.toml --replay clouds/ --rate 10 --loop
//! drishti --replay clouds/ --output out/   # JSON-lines output
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clap::Parser;

use drishti::engine::create_engine;
use drishti::io::{CloudReplay, JsonLinesSink, OutputSinks, topics};
use drishti::threads::spawn_replay;
use drishti::{Node, NodeConfig, Result};

#[derive(Parser)]
#[command(name = "drishti")]
#[command(about = "3D perception preprocessing and detection publishing node")]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of point cloud files to replay
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Replay rate in frames per second
    #[arg(long)]
    rate: Option<f32>,

    /// Loop the replay
    #[arg(long = "loop")]
    looping: bool,

    /// Directory for JSON-lines output
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} - {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(args: &Args) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {:?}", path);
            NodeConfig::load(path)?
        }
        None if Path::new("drishti.toml").exists() => {
            log::info!("Loading configuration from drishti.toml");
            NodeConfig::load(Path::new("drishti.toml"))?
        }
        None => {
            log::info!("Using default configuration");
            NodeConfig::default()
        }
    };

    if let Some(dir) = &args.replay {
        config.input.replay_dir = Some(dir.display().to_string());
    }
    if let Some(rate) = args.rate {
        config.input.replay_rate_hz = rate;
    }
    if args.looping {
        config.input.replay_loop = true;
    }
    if let Some(dir) = &args.output {
        config.output.jsonl_dir = Some(dir.display().to_string());
    }

    config.validate()?;
    Ok(config)
}

fn create_sinks(config: &NodeConfig) -> Result<OutputSinks> {
    let Some(dir) = &config.output.jsonl_dir else {
        return Ok(OutputSinks::logging());
    };

    let dir = Path::new(dir);
    fs::create_dir_all(dir)?;
    log::info!("Writing JSON-lines output to {}", dir.display());

    Ok(OutputSinks {
        non_ground: Box::new(JsonLinesSink::create(
            topics::NON_GROUND,
            dir.join("non_ground_points.jsonl"),
        )?),
        detections: Box::new(JsonLinesSink::create(
            topics::DETECTIONS,
            dir.join("detections.jsonl"),
        )?),
        range: Box::new(JsonLinesSink::create(
            topics::RANGE,
            dir.join("range.jsonl"),
        )?),
    })
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;

    log::info!("Drishti v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    // Engine build failure is fatal
    let engine = create_engine(&config.engine)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| drishti::DrishtiError::Thread(format!("Error setting Ctrl-C handler: {}", e)))?;

    let sinks = create_sinks(&config)?;
    let node = Node::new(config.clone(), engine).with_running_flag(Arc::clone(&running));
    let stats = node.stats();

    // Without a replay source the input stays open until shutdown
    let mut idle_input = None;
    let replay_handle = match &config.input.replay_dir {
        Some(dir) => {
            let replay = CloudReplay::open(dir, &config.frames.sensor_frame)?
                .with_rate(config.input.replay_rate_hz)
                .with_loop(config.input.replay_loop);
            Some(spawn_replay(
                replay,
                node.input(),
                Arc::clone(&running),
                Arc::clone(&stats),
            )?)
        }
        None => {
            log::warn!("No replay source configured, waiting for shutdown");
            idle_input = Some(node.input());
            None
        }
    };

    let running_node = node.start(sinks)?;
    log::info!("Waiting for point cloud . . .");

    // Main thread: status reporting until shutdown or end of replay
    let period = Duration::from_millis(config.timer.period_ms);
    let stats_interval = Duration::from_secs(config.output.stats_interval_s);
    let mut last_stats = Instant::now();
    let mut input_closed_at: Option<Instant> = None;

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));

        if !stats_interval.is_zero() && last_stats.elapsed() >= stats_interval {
            log::info!("Stats: {}", running_node.stats());
            last_stats = Instant::now();
        }

        // Let one more tick see the final frame, then stop
        if replay_handle.is_some() && running_node.frame_thread_finished() {
            let closed = *input_closed_at.get_or_insert_with(Instant::now);
            if closed.elapsed() >= period * 2 {
                log::info!("Input exhausted, shutting down");
                break;
            }
        }
    }

    let final_stats = running_node.stop()?;
    drop(idle_input);
    if let Some(handle) = replay_handle
        && handle.join().is_err()
    {
        log::warn!("Replay thread panicked");
    }

    log::info!("Final stats: {}", final_stats);
    log::info!("Drishti shutdown complete");
    Ok(())
}
