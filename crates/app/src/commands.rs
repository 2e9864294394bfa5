//! One function per subcommand. Each reads its inputs from the artifact
//! layout, runs a pipeline stage, and persists its outputs only once the
//! stage has succeeded.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use demand::pipeline::{self, Preprocessed};
use demand::summary::{latest_date, peak_hour_profile, zone_snapshot};
use demand::{ModelKind, PipelineConfig};

use crate::layout::Layout;

pub fn simulate(config: &PipelineConfig, layout: &Layout) -> Result<()> {
    let events = demand::simulate::simulate(&config.simulation, config.seed)
        .context("simulating orders")?;
    let path = layout.simulated_orders();
    artifacts::write_events(&path, &events)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("simulated {} orders -> {}", events.len(), path.display());
    Ok(())
}

pub fn preprocess(config: &PipelineConfig, layout: &Layout, input: Option<&Path>) -> Result<Preprocessed> {
    let input = layout.events_input(input);
    let events = artifacts::read_events(&input)
        .with_context(|| format!("reading events from {}", input.display()))?;
    let pre = pipeline::preprocess(events, config).context("preprocessing events")?;

    let centers = layout.zone_centers();
    artifacts::write_zones(&centers, &pre.zones)
        .with_context(|| format!("writing {}", centers.display()))?;
    let table = layout.zone_hour_table();
    artifacts::write_zone_hours(&table, &pre.records)
        .with_context(|| format!("writing {}", table.display()))?;
    let labelled = layout.events_with_zones();
    artifacts::write_events(&labelled, &pre.events)
        .with_context(|| format!("writing {}", labelled.display()))?;

    println!(
        "{} events -> {} zones, {} zone-hour rows (fingerprint {:016x})",
        pre.events.len(),
        pre.zones.len(),
        pre.records.len(),
        pre.fingerprint
    );
    Ok(pre)
}

pub fn train(config: &PipelineConfig, layout: &Layout, kind: ModelKind) -> Result<()> {
    let table = layout.zone_hour_table();
    let records = artifacts::read_zone_hours(&table)
        .with_context(|| format!("reading {} (run `preprocess` first)", table.display()))?;
    let report = pipeline::train(&records, config, kind).context("training demand model")?;

    let path = layout.model();
    artifacts::save_model(&path, &report.model)
        .with_context(|| format!("writing {}", path.display()))?;

    println!(
        "{:?} model: {} train rows, {} test rows",
        kind, report.train_rows, report.test_rows
    );
    match report.evaluation {
        Some(e) => println!("holdout MAE {:.3}, R² {:.3}", e.mae, e.r2),
        None => println!("holdout is empty; no evaluation"),
    }
    Ok(())
}

pub fn plan(config: &PipelineConfig, layout: &Layout) -> Result<()> {
    let table = layout.zone_hour_table();
    let records = artifacts::read_zone_hours(&table)
        .with_context(|| format!("reading {} (run `preprocess` first)", table.display()))?;
    let model_path = layout.model();
    let model = artifacts::load_model(&model_path)
        .with_context(|| format!("loading {} (run `train` first)", model_path.display()))?;

    let staffing = pipeline::plan(&records, &model, config).context("building staffing plan")?;
    let profile = peak_hour_profile(&staffing);

    let plan_path = layout.driver_plan();
    artifacts::write_staffing_plan(&plan_path, &staffing)
        .with_context(|| format!("writing {}", plan_path.display()))?;
    let peak_path = layout.peak_hours();
    artifacts::write_peak_hours(&peak_path, &profile)
        .with_context(|| format!("writing {}", peak_path.display()))?;

    let driver_hours: u64 = staffing.iter().map(|s| u64::from(s.drivers_needed)).sum();
    println!("{} plan rows, {} driver-hours", staffing.len(), driver_hours);
    if let Some(busiest) = profile
        .iter()
        .max_by(|a, b| a.mean_pred_orders.total_cmp(&b.mean_pred_orders))
    {
        println!(
            "busiest hour {:02}:00 with {:.1} predicted orders citywide",
            busiest.hour, busiest.mean_pred_orders
        );
    }
    Ok(())
}

pub fn snapshot(layout: &Layout, date: Option<NaiveDate>, hour: u32) -> Result<()> {
    if hour >= 24 {
        bail!("hour must be in 0..24, got {hour}");
    }
    let plan_path = layout.driver_plan();
    let staffing = artifacts::read_staffing_plan(&plan_path)
        .with_context(|| format!("reading {} (run `plan` first)", plan_path.display()))?;
    let centers = layout.zone_centers();
    let zones = artifacts::read_zones(&centers)
        .with_context(|| format!("reading {}", centers.display()))?;

    let Some(date) = date.or_else(|| latest_date(&staffing)) else {
        bail!("{} has no rows", plan_path.display());
    };
    println!("zone snapshot for {date} {hour:02}:00");
    println!("{:>7} {:>10} {:>10} {:>11} {:>8}", "zone", "lat", "lon", "pred_orders", "drivers");
    for row in zone_snapshot(&staffing, &zones, date, hour) {
        println!(
            "{:>7} {:>10.5} {:>10.5} {:>11.2} {:>8}",
            row.zone_id,
            row.center_latitude,
            row.center_longitude,
            row.predicted_orders,
            row.drivers_needed
        );
    }
    Ok(())
}

/// Simulate if the input is missing, then preprocess, train and plan.
pub fn run(config: &PipelineConfig, layout: &Layout, input: Option<&Path>, kind: ModelKind) -> Result<()> {
    let events_path = layout.events_input(input);
    if !events_path.exists() {
        if input.is_some() {
            bail!("input {} does not exist", events_path.display());
        }
        tracing::info!("{} not found; simulating orders", events_path.display());
        simulate(config, layout)?;
    }
    preprocess(config, layout, input)?;
    train(config, layout, kind)?;
    plan(config, layout)
}
