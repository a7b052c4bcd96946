// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! bounce: headless driver for the collision simulation.
//!
//! Builds a [`SimConfig`] from an optional JSON file plus flag overrides,
//! runs the requested number of ticks, and prints a summary. The final body
//! set can be dumped as JSON.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use bounce_core::{Body, Bounds, ContactOrdering, Placement, SimConfig, Simulation, TickReport};
use clap::{Parser, ValueEnum};
use comfy_table::Table;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bounce", author, version, about = "Run a headless bounce simulation", long_about = None)]
struct Args {
    /// JSON config file; the flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of bodies
    #[arg(short = 'n', long)]
    bodies: Option<usize>,

    /// Plane width
    #[arg(long)]
    width: Option<f32>,

    /// Plane height
    #[arg(long)]
    height: Option<f32>,

    /// Placement seed
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads
    #[arg(short, long)]
    workers: Option<usize>,

    /// Contact resolution order
    #[arg(long, value_enum)]
    ordering: Option<OrderingArg>,

    /// Initial layout
    #[arg(long, value_enum)]
    placement: Option<PlacementArg>,

    /// Ticks to run
    #[arg(short, long, default_value_t = 100)]
    ticks: u64,

    /// Step on the calling thread instead of the worker pool
    #[arg(long)]
    serial: bool,

    /// Summary format
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write the final bodies as JSON to this path
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Write the effective config as JSON to this path
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `bounce_core=debug`
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OrderingArg {
    Canonical,
    Eager,
}

impl From<OrderingArg> for ContactOrdering {
    fn from(arg: OrderingArg) -> Self {
        match arg {
            OrderingArg::Canonical => Self::Canonical,
            OrderingArg::Eager => Self::Eager,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PlacementArg {
    Random,
    Grid,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Summary {
    ticks: u64,
    bodies: usize,
    workers: usize,
    ordering: ContactOrdering,
    serial: bool,
    resolved: usize,
    active_contacts: usize,
    peak_rounds: usize,
    last_tick: Option<TickReport>,
    energy_start: f64,
    energy_end: f64,
    elapsed_ms: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_new(&args.log_level).context("invalid --log-level")?)
        .init();

    let config = build_config(&args)?;
    if let Some(path) = &args.save_config {
        config
            .save(path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
    }

    let (summary, bodies) = run(&config, &args)?;
    if let Some(path) = &args.dump {
        dump(path, &bodies)?;
    }

    let mut out = io::stdout().lock();
    match args.format {
        Format::Table => writeln!(out, "{}", summary_table(&summary))?,
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?,
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(n) = args.bodies {
        config.body_count = n;
    }
    config.bounds = Bounds::new(
        args.width.unwrap_or(config.bounds.width),
        args.height.unwrap_or(config.bounds.height),
    );
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(ordering) = args.ordering {
        config.ordering = ordering.into();
    }
    match args.placement {
        Some(PlacementArg::Random) => config.placement = Placement::Random,
        Some(PlacementArg::Grid) => config.placement = Placement::grid(),
        None => {}
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[allow(clippy::cast_precision_loss)]
fn run(config: &SimConfig, args: &Args) -> Result<(Summary, Vec<Body>)> {
    let mut sim = Simulation::new(config).context("failed to start simulation")?;
    let energy_start = sim.kinetic_energy();
    info!(ticks = args.ticks, serial = args.serial, "running");

    let started = Instant::now();
    let mut resolved = 0;
    let mut peak_rounds = 0;
    let mut last_tick = None;
    for _ in 0..args.ticks {
        let report = if args.serial { sim.step_serial() } else { sim.step() };
        resolved += report.new_contacts;
        peak_rounds = peak_rounds.max(report.rounds);
        last_tick = Some(report);
    }
    let elapsed = started.elapsed();

    let summary = Summary {
        ticks: sim.tick(),
        bodies: sim.len(),
        workers: sim.workers(),
        ordering: sim.ordering(),
        serial: args.serial,
        resolved,
        active_contacts: sim.contacts().len(),
        peak_rounds,
        last_tick,
        energy_start,
        energy_end: sim.kinetic_energy(),
        elapsed_ms: elapsed.as_secs_f64() * 1_000.0,
    };
    let bodies = sim.snapshot();
    sim.shutdown();
    Ok((summary, bodies))
}

fn dump(path: &Path, bodies: &[Body]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bodies)?;
    writer.flush()?;
    Ok(())
}

fn summary_table(s: &Summary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["metric", "value"]);
    let rows = [
        ("ticks", s.ticks.to_string()),
        ("bodies", s.bodies.to_string()),
        ("workers", if s.serial { "serial".to_owned() } else { s.workers.to_string() }),
        ("ordering", format!("{:?}", s.ordering).to_lowercase()),
        ("resolved contacts", s.resolved.to_string()),
        ("active contacts", s.active_contacts.to_string()),
        ("peak rounds", s.peak_rounds.to_string()),
        (
            "last tick contacts",
            s.last_tick.map_or_else(|| "-".to_owned(), |t| t.new_contacts.to_string()),
        ),
        ("kinetic energy (start)", format!("{:.3}", s.energy_start)),
        ("kinetic energy (end)", format!("{:.3}", s.energy_end)),
        ("elapsed (ms)", format!("{:.2}", s.elapsed_ms)),
    ];
    for (metric, value) in rows {
        table.add_row(vec![metric.to_owned(), value]);
    }
    table
}
