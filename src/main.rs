use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use defect_judge::config::EngineConfig;
use defect_judge::judge::{self, Judgment};
use defect_judge::measure::{self, MeasurementBag};
use defect_judge::render;
use defect_judge::service;
use defect_judge::spec::{DefectCondition, DefectType, RawDefectCondition, SpecTables};
use std::fs;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "defect-judge")]
#[command(about = "Measurement-based defect judgment engine", long_about = None)]
struct Cli {
    /// Engine config JSON (max_depth, strict_measurements).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Overrides max_depth from the config file.
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Log filter used when RUST_LOG is unset (e.g. "info", "defect_judge=debug").
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Text,
}

#[derive(clap::Args)]
struct MeasurementArgs {
    /// Measurement table: one "name value" per line.
    #[arg(long)]
    measurements: Option<String>,

    /// Single reading, NAME=VALUE. Repeatable; applied after --measurements.
    #[arg(long = "measure")]
    measure: Vec<String>,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,
}

#[derive(Subcommand)]
enum Commands {
    /// Judge one defect condition against a set of measurements.
    Judge {
        #[arg(long)]
        spec: String,

        #[command(flatten)]
        input: MeasurementArgs,
    },

    /// Pick the defect condition of a defect type for a machine, then judge it.
    JudgeType {
        #[arg(long)]
        spec: String,

        #[arg(long)]
        machine_type: String,

        #[command(flatten)]
        input: MeasurementArgs,
    },

    /// Judge a {defect_condition, measurements} request document.
    Request {
        #[arg(long)]
        input: String,
    },

    /// Load a defect condition and list every malformation found.
    Validate {
        #[arg(long)]
        spec: String,
    },

    /// Convert a nested defect condition into relational rows.
    Flatten {
        #[arg(long)]
        spec: String,

        #[arg(short = 'o', long)]
        out: Option<String>,
    },

    /// Rebuild a nested defect condition from relational rows.
    Assemble {
        #[arg(long)]
        tables: String,

        #[arg(long)]
        id: i64,

        #[arg(short = 'o', long)]
        out: Option<String>,
    },
}

fn read(path: &str) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path))
}

fn emit(text: &str, out: Option<&str>) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("write {}", path))?;
            println!("Wrote {}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut cfg = match &cli.config {
        Some(path) => {
            EngineConfig::from_file(path).with_context(|| format!("load config {}", path))?
        }
        None => EngineConfig::default(),
    };
    if let Some(depth) = cli.max_depth {
        cfg = cfg.with_max_depth(depth);
    }
    Ok(cfg)
}

fn load_bag(args: &MeasurementArgs, cfg: &EngineConfig) -> Result<MeasurementBag> {
    let mut values = Vec::new();
    if let Some(path) = &args.measurements {
        values.extend(measure::parse_measurement_file(path).with_context(|| format!("parse measurements {}", path))?);
    }
    for m in &args.measure {
        values.push(measure::parse_assignment(m)?);
    }
    Ok(MeasurementBag::from_values(values, cfg.strict_measurements)?)
}

fn print_judgment(judgment: &Judgment, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", render::render_json(judgment)?),
        Format::Text => print!("{}", render::render_text(judgment)),
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cfg = load_config(&cli)?;

    match &cli.cmd {
        Commands::Judge { spec, input } => {
            let dc = DefectCondition::from_json(&read(spec)?, &cfg)
                .with_context(|| format!("load defect condition {}", spec))?;
            let bag = load_bag(input, &cfg)?;
            info!(defect_condition = dc.id, measurements = bag.len(), "judging");
            print_judgment(&judge::judge(&dc, &bag, &cfg), input.format)?;
        }
        Commands::JudgeType {
            spec,
            machine_type,
            input,
        } => {
            let dt = DefectType::from_json(&read(spec)?, &cfg)
                .with_context(|| format!("load defect type {}", spec))?;
            let bag = load_bag(input, &cfg)?;
            info!(ai_code = %dt.ai_code, machine_type = %machine_type, "judging defect type");
            print_judgment(&judge::judge_defect_type(&dt, machine_type, &bag, &cfg), input.format)?;
        }
        Commands::Request { input } => {
            let response = service::handle_request(&read(input)?, &cfg)
                .with_context(|| format!("cannot evaluate request {}", input))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Validate { spec } => {
            let dc = DefectCondition::from_json(&read(spec)?, &cfg)
                .with_context(|| format!("load defect condition {}", spec))?;
            let issues = dc.issues();
            if issues.is_empty() {
                println!("defect condition {}: {} measurement conditions, no issues", dc.id, dc.conditions.len());
                return Ok(());
            }
            for (mc, issue) in &issues {
                println!("measurement condition {}: {}", mc, issue);
            }
            bail!("{} malformation(s) in {}", issues.len(), spec);
        }
        Commands::Flatten { spec, out } => {
            let raw: RawDefectCondition =
                serde_json::from_str(&read(spec)?).with_context(|| format!("parse {}", spec))?;
            let tables = SpecTables::flatten(&raw)?;
            emit(&serde_json::to_string_pretty(&tables)?, out.as_deref())?;
        }
        Commands::Assemble { tables, id, out } => {
            let rows: SpecTables =
                serde_json::from_str(&read(tables)?).with_context(|| format!("parse {}", tables))?;
            let raw = rows.assemble(*id, cfg.max_depth)?;
            emit(&serde_json::to_string_pretty(&raw)?, out.as_deref())?;
        }
    }

    Ok(())
}
