mod logic;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use nordic_game::{DEFAULT_TOTAL_TIME, NetworkDef, Settings};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{GameSetup, TesterReport, parse_clicks, replay_file, run_scripted, verify_file};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Play a seeded game with scripted clicks, save the log and replay it
    Run,
    /// Replay a saved log and report the final state
    Replay,
    /// Check that a log re-serializes to the same text
    VerifyLog,
}

#[derive(Debug, Parser)]
#[command(name = "nordic-tester", version = "0.1.0")]
#[command(about = "Headless runner for Nordic Traveller - seeded games, replays and log checks")]
struct Args {
    /// What to do: run, replay, or verify-log
    #[arg(long, value_enum, default_value_t = RunMode::Run)]
    mode: RunMode,

    /// Network definition (JSON); defaults to the bundled Nordic map
    #[arg(long)]
    network: Option<PathBuf>,

    /// Settings file (five lines); defaults to the standard settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Seed for run mode
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Ticks per game
    #[arg(long, default_value_t = DEFAULT_TOTAL_TIME)]
    steps: u32,

    /// Computer players wandering the map alongside the interactive one
    #[arg(long, default_value_t = 3)]
    roamers: usize,

    /// Scripted clicks for run mode: comma-separated `<tick>:<city>`
    #[arg(long, default_value = "")]
    clicks: String,

    /// Log to replay or verify
    #[arg(long)]
    log: Option<PathBuf>,

    /// Where run mode saves the finished game's log
    #[arg(long, default_value = "last.log")]
    save_log: PathBuf,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let start_time = Instant::now();
    let report = execute(&args)?;
    write_report(&args, &report, start_time)?;

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner() {
    println!("{}", "🧳 Nordic Traveller Tester".bright_cyan().bold());
    println!("{}", "==========================".cyan());
}

fn execute(args: &Args) -> Result<TesterReport> {
    match args.mode {
        RunMode::Run => {
            let setup = load_setup(args)?;
            let clicks = parse_clicks(&args.clicks)?;
            run_scripted(&setup, &clicks, &args.save_log)
        }
        RunMode::Replay => {
            let setup = load_setup(args)?;
            replay_file(&setup, required_log(args)?)
        }
        RunMode::VerifyLog => verify_file(required_log(args)?),
    }
}

fn required_log(args: &Args) -> Result<&Path> {
    match &args.log {
        Some(path) => Ok(path.as_path()),
        None => bail!("--log is required in {:?} mode", args.mode),
    }
}

fn load_setup(args: &Args) -> Result<GameSetup> {
    if args.steps == 0 {
        bail!("--steps must be at least 1");
    }
    let network = match &args.network {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("failed to read network {}", path.display()))?;
            NetworkDef::from_json(&json)
                .with_context(|| format!("network {} is malformed", path.display()))?
        }
        None => NetworkDef::nordic().context("bundled network is malformed")?,
    };
    let settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    Ok(GameSetup {
        network,
        settings,
        seed: args.seed,
        steps: args.steps,
        roamers: args.roamers,
    })
}

fn load_settings(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    text.parse()
        .with_context(|| format!("settings {} are malformed", path.display()))
}

fn write_report(args: &Args, report: &TesterReport, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report.as_str() {
        "json" => logic::reports::generate_json_report(output_target.writer(), report)?,
        _ => logic::reports::generate_console_report(
            output_target.writer(),
            report,
            args.verbose,
            start_time.elapsed(),
        )?,
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}
