//! Artifact files written to a temporary directory and read back.
//!
//! Run: cargo test -p artifacts --test artifact_files

use std::fs;

use artifacts::{
    load_model, read_events, read_staffing_plan, read_zone_hours, read_zones, save_model,
    write_events, write_peak_hours, write_staffing_plan, write_zone_hours, write_zones,
    ArtifactError,
};
use demand::config::PipelineConfig;
use demand::pipeline::{plan, preprocess, train};
use demand::simulate::SimulationParams;
use demand::summary::peak_hour_profile;
use demand::{DemandPredictor, FeatureRow, ModelKind};

fn config() -> PipelineConfig {
    PipelineConfig {
        n_zones: 4,
        test_days: 1,
        simulation: SimulationParams {
            n_days: 3,
            orders_per_day: 300,
            ..Default::default()
        },
        ..Default::default()
    }
}

#[test]
fn test_events_written_with_zones_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config();
    let events = demand::simulate::simulate(&cfg.simulation, cfg.seed).unwrap();
    let pre = preprocess(events, &cfg).unwrap();

    let path = dir.path().join("events_with_zones.csv");
    write_events(&path, &pre.events).unwrap();
    let back = read_events(&path).unwrap();
    assert_eq!(back.len(), pre.events.len());
    for (a, b) in back.iter().zip(&pre.events) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.zone_id, b.zone_id);
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.latitude, b.latitude);
    }

    // Re-running preprocessing on labelled input takes the skip path and
    // reproduces the same modelling table.
    let again = preprocess(back, &cfg).unwrap();
    assert_eq!(again.records, pre.records);
}

#[test]
fn test_tables_survive_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config();
    let events = demand::simulate::simulate(&cfg.simulation, cfg.seed).unwrap();
    let pre = preprocess(events, &cfg).unwrap();

    let zones_path = dir.path().join("data/zone_centers.csv");
    write_zones(&zones_path, &pre.zones).unwrap();
    assert_eq!(read_zones(&zones_path).unwrap(), pre.zones);

    let agg_path = dir.path().join("data/zone_hour_agg.csv");
    write_zone_hours(&agg_path, &pre.records).unwrap();
    let header = fs::read_to_string(&agg_path).unwrap();
    assert!(header.starts_with(
        "zone_id,date,hour,order_count,avg_items,avg_prep,temperature_c,is_rain,is_weekend,is_peak_hour,sin_hour,cos_hour"
    ));
    assert_eq!(read_zone_hours(&agg_path).unwrap(), pre.records);

    let report = train(&pre.records, &cfg, ModelKind::Linear).unwrap();
    let staffing = plan(&pre.records, &report.model, &cfg).unwrap();
    let plan_path = dir.path().join("outputs/driver_plan.csv");
    write_staffing_plan(&plan_path, &staffing).unwrap();
    assert_eq!(read_staffing_plan(&plan_path).unwrap(), staffing);

    let peak_path = dir.path().join("outputs/peak_hours.csv");
    write_peak_hours(&peak_path, &peak_hour_profile(&staffing)).unwrap();
    let peak = fs::read_to_string(&peak_path).unwrap();
    assert!(peak.starts_with("hour,mean_pred_orders\n"));
}

#[test]
fn test_model_file_predicts_like_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config();
    let events = demand::simulate::simulate(&cfg.simulation, cfg.seed).unwrap();
    let pre = preprocess(events, &cfg).unwrap();

    for kind in [ModelKind::Linear, ModelKind::HourlyProfile] {
        let model = train(&pre.records, &cfg, kind).unwrap().model;
        let path = dir.path().join("models/demand_model.bin");
        save_model(&path, &model).unwrap();
        let loaded = load_model(&path).unwrap();
        assert_eq!(loaded.kind(), kind);
        for r in pre.records.iter().take(20) {
            let row = FeatureRow::from(r);
            assert_eq!(loaded.predict(&row).to_bits(), model.predict(&row).to_bits());
        }
    }
}

#[test]
fn test_corrupt_model_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("demand_model.bin");
    fs::write(&path, b"ZCST\x01\x00\x00\x00").unwrap();
    assert!(matches!(load_model(&path), Err(ArtifactError::Corrupt(_))));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_events(&dir.path().join("nope.csv")).unwrap_err();
    assert!(matches!(err, ArtifactError::Io { .. }));
}
