//! `zonecast`: zone delivery orders, forecast zone-hour demand and plan
//! driver staffing, one batch stage per subcommand.
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries the
//! stage summaries.

mod commands;
mod layout;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use demand::{ModelKind, NegativePredictionPolicy, PipelineConfig};
use tracing_subscriber::EnvFilter;

use layout::Layout;

#[derive(Parser, Debug)]
#[command(name = "zonecast", version)]
#[command(about = "Zone-hour delivery demand forecasting and driver staffing")]
struct Cli {
    /// JSON pipeline configuration; missing fields take their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for input events and intermediate tables
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,

    /// Directory for the staffing plan and hourly profile
    #[arg(long, global = true, default_value = "outputs")]
    out_dir: PathBuf,

    /// Directory for the trained model file
    #[arg(long, global = true, default_value = "models")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate synthetic orders into the data directory
    Simulate {
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        orders_per_day: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Zone the events and build the zone-hour table
    Preprocess {
        /// Events CSV (default: the simulator's output)
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        zones: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        /// Materialise empty zone-hour buckets with zero demand
        #[arg(long)]
        fill_missing: bool,
    },
    /// Fit a demand model and report holdout accuracy
    Train {
        #[arg(long)]
        test_days: Option<usize>,
        #[arg(long, value_enum, default_value_t = ModelArg::Linear)]
        model: ModelArg,
    },
    /// Predict every zone-hour and allocate drivers
    Plan {
        /// Average minutes a driver spends per order
        #[arg(long)]
        service_time: Option<f64>,
        /// Treat negative predictions as zero instead of failing
        #[arg(long)]
        clamp_negative: bool,
    },
    /// Print per-zone demand and drivers for one hour
    Snapshot {
        #[arg(long, default_value_t = 20)]
        hour: u32,
        /// YYYY-MM-DD (default: latest date in the plan)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Simulate if needed, then preprocess, train and plan
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ModelArg::Linear)]
        model: ModelArg,
        #[arg(long)]
        zones: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        fill_missing: bool,
        #[arg(long)]
        test_days: Option<usize>,
        #[arg(long)]
        service_time: Option<f64>,
        #[arg(long)]
        clamp_negative: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelArg {
    Linear,
    HourlyProfile,
}

impl From<ModelArg> for ModelKind {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Linear => ModelKind::Linear,
            ModelArg::HourlyProfile => ModelKind::HourlyProfile,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    PipelineConfig::from_json_str(&json).with_context(|| format!("parsing config {}", path.display()))
}

/// Fold subcommand flags into the file/default configuration.
fn apply_overrides(config: &mut PipelineConfig, command: &Command) {
    match command {
        Command::Simulate {
            days,
            orders_per_day,
            seed,
        } => {
            if let Some(d) = days {
                config.simulation.n_days = *d;
            }
            if let Some(n) = orders_per_day {
                config.simulation.orders_per_day = *n;
            }
            override_seed(config, *seed);
        }
        Command::Preprocess {
            zones,
            seed,
            fill_missing,
            ..
        } => {
            override_zoning(config, *zones, *seed, *fill_missing);
        }
        Command::Train { test_days, .. } => override_test_days(config, *test_days),
        Command::Plan {
            service_time,
            clamp_negative,
        } => override_staffing(config, *service_time, *clamp_negative),
        Command::Run {
            zones,
            seed,
            fill_missing,
            test_days,
            service_time,
            clamp_negative,
            ..
        } => {
            override_zoning(config, *zones, *seed, *fill_missing);
            override_test_days(config, *test_days);
            override_staffing(config, *service_time, *clamp_negative);
        }
        Command::Snapshot { .. } => {}
    }
}

fn override_seed(config: &mut PipelineConfig, seed: Option<u64>) {
    if let Some(s) = seed {
        config.seed = s;
    }
}

fn override_zoning(config: &mut PipelineConfig, zones: Option<usize>, seed: Option<u64>, fill_missing: bool) {
    if let Some(z) = zones {
        config.n_zones = z;
    }
    override_seed(config, seed);
    config.fill_missing_buckets |= fill_missing;
}

fn override_test_days(config: &mut PipelineConfig, test_days: Option<usize>) {
    if let Some(t) = test_days {
        config.test_days = t;
    }
}

fn override_staffing(config: &mut PipelineConfig, service_time: Option<f64>, clamp_negative: bool) {
    if let Some(m) = service_time {
        config.avg_service_time_minutes = m;
    }
    if clamp_negative {
        config.negative_predictions = NegativePredictionPolicy::Clamp;
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.command);
    config.validate().context("invalid configuration")?;

    let layout = Layout {
        data_dir: cli.data_dir,
        out_dir: cli.out_dir,
        model_dir: cli.model_dir,
    };

    match cli.command {
        Command::Simulate { .. } => commands::simulate(&config, &layout),
        Command::Preprocess { input, .. } => {
            commands::preprocess(&config, &layout, input.as_deref()).map(|_| ())
        }
        Command::Train { model, .. } => commands::train(&config, &layout, model.into()),
        Command::Plan { .. } => commands::plan(&config, &layout),
        Command::Snapshot { hour, date } => commands::snapshot(&layout, date, hour),
        Command::Run { input, model, .. } => {
            commands::run(&config, &layout, input.as_deref(), model.into())
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    execute(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zonecast").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_dirs_default() {
        let cli = parse(&["plan"]);
        assert_eq!(cli.data_dir, PathBuf::from("data"));
        assert_eq!(cli.out_dir, PathBuf::from("outputs"));
        assert_eq!(cli.model_dir, PathBuf::from("models"));
    }

    #[test]
    fn test_overrides_fold_into_config() {
        let cli = parse(&["preprocess", "--zones", "5", "--seed", "9", "--fill-missing"]);
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.n_zones, 5);
        assert_eq!(config.seed, 9);
        assert!(config.fill_missing_buckets);

        let cli = parse(&["plan", "--service-time", "30", "--clamp-negative"]);
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.avg_service_time_minutes, 30.0);
        assert_eq!(config.negative_predictions, NegativePredictionPolicy::Clamp);
    }

    #[test]
    fn test_run_accepts_every_stage_override() {
        let cli = parse(&[
            "run",
            "--zones",
            "6",
            "--seed",
            "3",
            "--fill-missing",
            "--test-days",
            "1",
            "--service-time",
            "15",
            "--clamp-negative",
        ]);
        let mut config = PipelineConfig::default();
        apply_overrides(&mut config, &cli.command);
        assert_eq!(config.n_zones, 6);
        assert_eq!(config.seed, 3);
        assert!(config.fill_missing_buckets);
        assert_eq!(config.test_days, 1);
        assert_eq!(config.avg_service_time_minutes, 15.0);
        assert_eq!(config.negative_predictions, NegativePredictionPolicy::Clamp);
    }

    #[test]
    fn test_model_flag_values() {
        match parse(&["train", "--model", "hourly-profile"]).command {
            Command::Train { model, .. } => assert_eq!(ModelKind::from(model), ModelKind::HourlyProfile),
            other => panic!("unexpected {other:?}"),
        }
        assert!(Cli::try_parse_from(["zonecast", "train", "--model", "forest"]).is_err());
    }

    #[test]
    fn test_snapshot_date_parses() {
        match parse(&["snapshot", "--date", "2025-07-14", "--hour", "13"]).command {
            Command::Snapshot { hour, date } => {
                assert_eq!(hour, 13);
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 7, 14));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().to_str().unwrap();
        let cli = parse(&["--data-dir", data, "plan", "--service-time", "0"]);
        let err = execute(cli).unwrap_err();
        assert!(format!("{err:#}").contains("service"), "got: {err:#}");
    }

    #[test]
    fn test_full_run_writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"n_zones": 4, "test_days": 1, "simulation": {"n_days": 3, "orders_per_day": 300}}"#,
        )
        .unwrap();
        let root = dir.path().to_str().unwrap();
        let data = format!("{root}/data");
        let out = format!("{root}/outputs");
        let models = format!("{root}/models");
        let common = [
            "--config",
            config_path.to_str().unwrap(),
            "--data-dir",
            data.as_str(),
            "--out-dir",
            out.as_str(),
            "--model-dir",
            models.as_str(),
        ];

        let mut args = common.to_vec();
        args.extend(["run", "--model", "hourly-profile"]);
        execute(parse(&args)).unwrap();

        let layout = Layout {
            data_dir: PathBuf::from(&data),
            out_dir: PathBuf::from(&out),
            model_dir: PathBuf::from(&models),
        };
        for path in [
            layout.simulated_orders(),
            layout.events_with_zones(),
            layout.zone_centers(),
            layout.zone_hour_table(),
            layout.model(),
            layout.driver_plan(),
            layout.peak_hours(),
        ] {
            assert!(path.exists(), "{} missing", path.display());
        }

        let mut args = common.to_vec();
        args.extend(["snapshot", "--hour", "13"]);
        execute(parse(&args)).unwrap();
    }
}
