// mania: headless player that loads a chart, runs the session loop and prints the score

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info, warn};
use tokio::sync::mpsc;

use mania::{AudioSource, GameSession, LoopConfig, NullRenderer, SessionOptions};
use mania_audio::{AudioClock, SystemTime};
use mania_config::{JsonFileStore, KeyValueStore, MemoryStore};
use mania_rule::JudgeProperty;

#[derive(Parser, Debug)]
#[command(name = "mania", about = "Headless 4K rhythm-game session runner")]
struct Args {
    /// Chart file (.osu)
    chart: PathBuf,

    /// Song audio. Without it the chart plays against silence.
    #[arg(long)]
    audio: Option<PathBuf>,

    /// Number of columns.
    #[arg(long, default_value_t = 4)]
    columns: usize,

    /// Play the chart perfectly instead of waiting for input.
    #[arg(long)]
    autoplay: bool,

    /// Settings JSON file; created on first change.
    #[arg(long, env = "MANIA_SETTINGS")]
    settings: Option<PathBuf>,

    /// Judge property JSON overriding the default windows and weights.
    #[arg(long)]
    judge: Option<PathBuf>,

    /// Logic tick rate, Hz (60..=1000).
    #[arg(long)]
    logic_rate: Option<u32>,

    /// Print the final score as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: Args) -> Result<()> {
    let store: Box<dyn KeyValueStore> = match &args.settings {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(MemoryStore::new()),
    };
    let judge = match &args.judge {
        Some(path) => JudgeProperty::read(path)
            .with_context(|| format!("failed to read judge property {}", path.display()))?,
        None => JudgeProperty::default(),
    };
    let options = SessionOptions {
        column_count: args.columns,
        judge,
        autoplay: args.autoplay,
    };

    let clock = AudioClock::new(Rc::new(SystemTime::new()));
    let mut session = GameSession::new(store, clock, options);
    if let Some(hz) = args.logic_rate {
        session.set_logic_rate(hz)?;
    }

    let chart_text = std::fs::read_to_string(&args.chart)
        .with_context(|| format!("failed to read chart {}", args.chart.display()))?;
    let audio = match &args.audio {
        Some(path) => AudioSource::File(path.clone()),
        None => AudioSource::Silence,
    };
    session
        .init(&chart_text, audio)
        .await
        .context("failed to load audio")?;

    if !args.autoplay {
        warn!("no input source attached; every note will time out");
    }

    // Headless: nothing sends commands or key edges, but the command sender
    // must outlive the loop or it exits immediately.
    let (_command_tx, command_rx) = mpsc::unbounded_channel();
    let (_, input_rx) = mpsc::unbounded_channel();
    let mut renderer = NullRenderer::default();

    session.start();
    let exit = mania::run(
        &mut session,
        &mut renderer,
        command_rx,
        input_rx,
        &LoopConfig::default(),
    )
    .await;
    info!("{exit:?} after {} frames", renderer.frames);

    let score = session.score();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        println!(
            "score {}  acc {:.2}%  rank {}  max combo {}",
            score.score, score.accuracy, score.rank, score.max_combo
        );
        println!(
            "perfect {}  great {}  good {}  miss {}",
            score.perfect, score.great, score.good, score.miss
        );
    }
    Ok(())
}
