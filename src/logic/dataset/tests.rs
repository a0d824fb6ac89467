use std::fs;

use tempfile::tempdir;

use super::io::CSV_COLUMNS;
use super::{Dataset, DatasetError, DatasetPlan};
use crate::logic::traffic::{DeviceType, TrafficLabel, TrafficSimulator};

fn small_plan() -> DatasetPlan {
    DatasetPlan { normal: 20, ddos: 4, port_scan: 3, mirai: 2 }
}

#[test]
fn test_generate_follows_plan() {
    let mut sim = TrafficSimulator::with_seed(42);
    let plan = small_plan();
    let dataset = Dataset::generate(&mut sim, &plan);

    assert_eq!(dataset.len(), plan.total());
    assert_eq!(dataset.len(), 29 * 5);

    let stats = dataset.stats();
    assert_eq!(stats.label_distribution["Benign"], 100);
    assert_eq!(stats.label_distribution["DDoS"], 20);
    assert_eq!(stats.label_distribution["PortScan"], 15);
    assert_eq!(stats.label_distribution["Mirai"], 10);
    for device in DeviceType::ALL {
        assert_eq!(stats.device_distribution[device.as_str()], 29);
    }
}

#[test]
fn test_default_plan_size() {
    assert_eq!(DatasetPlan::default().total(), 7250);
}

#[test]
fn test_csv_round_trip_keeps_schema() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("traffic.csv");

    let mut sim = TrafficSimulator::with_seed(8);
    let dataset = Dataset::generate(&mut sim, &small_plan());
    dataset.write_csv(&path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    let header = content.lines().next().unwrap();
    assert_eq!(header, CSV_COLUMNS.join(","));
    assert!(content.contains("Smart Thermostat"));
    assert!(content.contains("PortScan"));

    let loaded = Dataset::read_csv(&path).unwrap();
    assert_eq!(loaded, dataset);
}

#[test]
fn test_same_seed_writes_identical_csv() {
    let dir = tempdir().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");

    Dataset::generate(&mut TrafficSimulator::with_seed(8), &small_plan())
        .write_csv(&first)
        .unwrap();
    Dataset::generate(&mut TrafficSimulator::with_seed(8), &small_plan())
        .write_csv(&second)
        .unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_empty_dataset_writes_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");

    Dataset::new().write_csv(&path).unwrap();
    let loaded = Dataset::read_csv(&path).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn test_read_rejects_unknown_label() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        format!(
            "{}\n2024-01-01T00:00:00Z,Smart Lock,0.5,3,3,100,100,10.0,64,64,Worm\n",
            CSV_COLUMNS.join(",")
        ),
    )
    .unwrap();

    assert!(matches!(Dataset::read_csv(&path), Err(DatasetError::Csv(_))));
}

#[test]
fn test_read_missing_file() {
    let dir = tempdir().unwrap();
    assert!(Dataset::read_csv(&dir.path().join("missing.csv")).is_err());
}

#[test]
fn test_sample_is_deterministic() {
    let mut sim = TrafficSimulator::with_seed(4);
    let dataset = Dataset::generate(&mut sim, &small_plan());

    let a = dataset.sample(30, 42);
    let b = dataset.sample(30, 42);
    assert_eq!(a.len(), 30);
    assert_eq!(a, b);

    assert_eq!(dataset.sample(10_000, 1).len(), dataset.len());
}

#[test]
fn test_prepare_features_target() {
    let mut sim = TrafficSimulator::with_seed(4);
    let dataset = Dataset::generate(&mut sim, &small_plan());
    let (x, y) = dataset.prepare_features();

    assert_eq!(x.nrows(), dataset.len());
    let malicious = y.iter().filter(|v| **v == 1.0).count();
    assert_eq!(malicious, 45);
}

#[test]
fn test_stats_feature_summary() {
    let mut sim = TrafficSimulator::with_seed(2);
    let dataset: Dataset = sim
        .generate(DeviceType::SmartLight, TrafficLabel::DDoS, 50)
        .into_iter()
        .collect();

    let stats = dataset.stats();
    let rate = stats.feature_summaries.iter().find(|f| f.name == "rate").unwrap();
    assert!(rate.min >= 500.0);
    assert!(rate.max <= 2000.0);
    assert!(rate.mean >= rate.min && rate.mean <= rate.max);
    assert_eq!(stats.label_share("DDoS"), 1.0);

    assert!(Dataset::new().stats().feature_summaries.is_empty());
}

#[test]
fn test_tail() {
    let mut sim = TrafficSimulator::with_seed(2);
    let dataset: Dataset = sim
        .generate(DeviceType::SmartLock, TrafficLabel::Benign, 5)
        .into_iter()
        .collect();

    assert_eq!(dataset.tail(2), &dataset.records()[3..]);
    assert_eq!(dataset.tail(10).len(), 5);
}
