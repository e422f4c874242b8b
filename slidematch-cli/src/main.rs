use clap::Parser;
use serde::{Deserialize, Serialize};
use slidematch::image::io::{decode_color, load_color, stash_encoded};
use slidematch::{
    ColorImage, Downloader, LocateConfig, MatchResult, Metric, PixelLayout, PlanConfig,
    SliderSolver, Solution, SolveConfig, TrajectoryPlanner, VendorRegistry,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod fetch;

use fetch::{is_url, HttpDownloader};

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "SlideMatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    Solve,
    Plan,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MetricConfig {
    Zncc,
    SqdiffNormed,
}

impl From<MetricConfig> for Metric {
    fn from(value: MetricConfig) -> Self {
        match value {
            MetricConfig::Zncc => Metric::Zncc,
            MetricConfig::SqdiffNormed => Metric::SqDiffNormed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct LocateConfigJson {
    metric: MetricConfig,
    parallel: bool,
    min_var_i: f64,
}

impl Default for LocateConfigJson {
    fn default() -> Self {
        let cfg = LocateConfig::default();
        Self {
            metric: MetricConfig::Zncc,
            parallel: cfg.parallel,
            min_var_i: cfg.min_var_i,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct PlanConfigJson {
    acceleration: f64,
    threshold_ratio: f64,
    max_steps: usize,
}

impl Default for PlanConfigJson {
    fn default() -> Self {
        let cfg = PlanConfig::default();
        Self {
            acceleration: cfg.acceleration,
            threshold_ratio: cfg.threshold_ratio,
            max_steps: cfg.max_steps,
        }
    }
}

impl From<&PlanConfigJson> for PlanConfig {
    fn from(value: &PlanConfigJson) -> Self {
        Self {
            acceleration: value.acceleration,
            threshold_ratio: value.threshold_ratio,
            max_steps: value.max_steps,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SolveConfigJson {
    primary_quantum: f64,
    overflow: i32,
    jitter_distance: i32,
    jitter_quantum: f64,
    cross_check: bool,
}

impl Default for SolveConfigJson {
    fn default() -> Self {
        let cfg = SolveConfig::default();
        Self {
            primary_quantum: cfg.primary_quantum,
            overflow: cfg.overflow,
            jitter_distance: cfg.jitter_distance,
            jitter_quantum: cfg.jitter_quantum,
            cross_check: cfg.cross_check,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrajectoryJson {
    distance: i32,
    time_quantum: f64,
    overflow: i32,
}

impl Default for TrajectoryJson {
    fn default() -> Self {
        Self {
            distance: 0,
            time_quantum: 0.2,
            overflow: 20,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    mode: Mode,
    vendor: String,
    background_path: String,
    piece_path: String,
    /// Overrides the vendor's display scale.
    scale_factor: Option<f64>,
    work_dir: Option<PathBuf>,
    debug_dir: Option<PathBuf>,
    output_path: Option<String>,
    download_timeout_secs: u64,
    locate: LocateConfigJson,
    plan: PlanConfigJson,
    solve: SolveConfigJson,
    trajectory: TrajectoryJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: Mode::Solve,
            vendor: "shumei".to_string(),
            background_path: String::new(),
            piece_path: String::new(),
            scale_factor: None,
            work_dir: None,
            debug_dir: None,
            output_path: None,
            download_timeout_secs: 10,
            locate: LocateConfigJson::default(),
            plan: PlanConfigJson::default(),
            solve: SolveConfigJson::default(),
            trajectory: TrajectoryJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MatchRecord {
    x: i32,
    y: i32,
    score: f32,
}

impl From<MatchResult> for MatchRecord {
    fn from(value: MatchResult) -> Self {
        Self {
            x: value.location.x,
            y: value.location.y,
            score: value.score,
        }
    }
}

#[derive(Debug, Serialize)]
struct BoxRecord {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
}

#[derive(Debug, Serialize)]
struct SolveOutput {
    vendor: String,
    scale_factor: f64,
    gap: MatchRecord,
    cross_check: Option<MatchRecord>,
    piece_bbox: BoxRecord,
    distance: i32,
    primary: Vec<i32>,
    jitter: Vec<i32>,
}

impl SolveOutput {
    fn new(vendor: String, scale_factor: f64, solution: Solution) -> Self {
        let bbox = solution.piece_bbox;
        Self {
            vendor,
            scale_factor,
            gap: solution.gap.into(),
            cross_check: solution.cross_check.map(MatchRecord::from),
            piece_bbox: BoxRecord {
                x: bbox.x(),
                y: bbox.y(),
                width: bbox.width(),
                height: bbox.height(),
            },
            distance: solution.distance,
            primary: solution.primary.into_steps(),
            jitter: solution.jitter.into_steps(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    distance: i32,
    time_quantum: f64,
    overflow: i32,
    steps: Vec<i32>,
}

/// Loads a local image, or downloads it when `path` is an http(s) URL.
///
/// Downloaded bytes are kept as `{stem}.{ext}` inside `work_dir` when set.
fn read_image(
    path: &str,
    layout: PixelLayout,
    downloader: Option<&mut HttpDownloader>,
    work_dir: Option<&Path>,
    stem: &str,
) -> Result<ColorImage, Box<dyn std::error::Error>> {
    if !is_url(path) {
        return Ok(load_color(path, layout)?);
    }
    let Some(client) = downloader else {
        return Err(format!("no HTTP client for {path}").into());
    };
    let bytes = client.download(path)?;
    if let Some(dir) = work_dir {
        stash_encoded(dir, stem, &bytes)?;
    }
    Ok(decode_color(&bytes, layout)?)
}

fn run_solve(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    if config.background_path.is_empty() || config.piece_path.is_empty() {
        return Err("background_path and piece_path must be set in the config".into());
    }
    let registry = VendorRegistry::with_builtin();
    let vendor = registry.get(&config.vendor)?;
    let scale_factor = config.scale_factor.unwrap_or_else(|| vendor.scale_factor());

    for dir in [&config.work_dir, &config.debug_dir].into_iter().flatten() {
        fs::create_dir_all(dir)?;
    }
    let mut downloader = if is_url(&config.background_path) || is_url(&config.piece_path) {
        let timeout = Duration::from_secs(config.download_timeout_secs);
        Some(HttpDownloader::new(timeout)?)
    } else {
        None
    };
    let work_dir = config.work_dir.as_deref();
    let background = read_image(
        &config.background_path,
        PixelLayout::Bgr8,
        downloader.as_mut(),
        work_dir,
        &format!("{}-bg", vendor.name()),
    )?;
    let piece = read_image(
        &config.piece_path,
        PixelLayout::Rgba8,
        downloader.as_mut(),
        work_dir,
        &format!("{}-piece", vendor.name()),
    )?;

    let solver = SliderSolver::new(SolveConfig {
        locate: LocateConfig {
            metric: config.locate.metric.into(),
            parallel: config.locate.parallel,
            min_var_i: config.locate.min_var_i,
            ..LocateConfig::default()
        },
        plan: PlanConfig::from(&config.plan),
        primary_quantum: config.solve.primary_quantum,
        overflow: config.solve.overflow,
        jitter_distance: config.solve.jitter_distance,
        jitter_quantum: config.solve.jitter_quantum,
        cross_check: config.solve.cross_check,
        debug_dir: config.debug_dir.clone(),
    });
    let solution = solver.solve(&background, &piece, scale_factor)?;
    tracing::info!(
        gap_x = solution.gap.location.x,
        distance = solution.distance,
        "solved"
    );

    let output = SolveOutput::new(vendor.name().to_string(), scale_factor, solution);
    Ok(serde_json::to_string_pretty(&output)?)
}

fn run_plan(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let traj = &config.trajectory;
    let planner = TrajectoryPlanner::new(PlanConfig::from(&config.plan));
    let seq = planner.plan(traj.distance, traj.time_quantum, traj.overflow)?;
    let output = PlanOutput {
        distance: traj.distance,
        time_quantum: traj.time_quantum,
        overflow: traj.overflow,
        steps: seq.into_steps(),
    };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("slidematch=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;

    let json = match config.mode {
        Mode::Solve => run_solve(&config)?,
        Mode::Plan => run_plan(&config)?,
    };

    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
