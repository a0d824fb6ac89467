//! IoT Shield - Command line entry point
//!
//! generate → stats → train → monitor

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use iot_shield_core::constants;
use iot_shield_core::logic::config::AppConfig;
use iot_shield_core::logic::features::FEATURE_COUNT;
use iot_shield_core::logic::monitor::{self, MonitorSettings, MonitorState};
use iot_shield_core::{AnomalyDetector, Dataset, DatasetPlan, ModelBundle, TrafficSimulator};

#[derive(Parser)]
#[command(name = "iot-shield")]
#[command(author, version, about = "Synthetic IoT traffic generator and anomaly detector")]
#[command(propagate_version = true)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a labeled synthetic dataset
    Generate {
        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seed for reproducible datasets
        #[arg(short, long)]
        seed: Option<u64>,

        /// Benign records per device
        #[arg(long, default_value = "1000")]
        normal: usize,

        /// DDoS records per device
        #[arg(long, default_value = "200")]
        ddos: usize,

        /// Port scan records per device
        #[arg(long, default_value = "150")]
        port_scan: usize,

        /// Mirai records per device
        #[arg(long, default_value = "100")]
        mirai: usize,
    },

    /// Show dataset statistics
    Stats {
        /// Dataset CSV path
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Train the detector and save the model bundle
    Train {
        /// Dataset CSV path (generated when missing)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Model bundle directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        #[arg(short, long)]
        epochs: Option<usize>,

        #[arg(short, long)]
        batch_size: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Stream simulated traffic through a saved detector
    Monitor {
        /// Model bundle directory
        #[arg(short, long)]
        model_dir: Option<PathBuf>,

        /// Number of events to simulate
        #[arg(short, long, default_value = "20")]
        ticks: usize,

        /// Probability that an event is an attack
        #[arg(short, long)]
        attack_probability: Option<f64>,

        /// Detection threshold in [0, 1]
        #[arg(long)]
        threshold: Option<f32>,

        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    log::info!("Starting {} v{}", constants::APP_NAME, constants::APP_VERSION);

    let config = AppConfig::from_env();

    match cli.command {
        Commands::Generate { output, seed, normal, ddos, port_scan, mirai } => {
            let path = output.unwrap_or_else(|| config.data_path.clone());
            let plan = DatasetPlan { normal, ddos, port_scan, mirai };
            let mut simulator = simulator_for(seed);
            let dataset = generate_dataset(&mut simulator, &plan, &path)?;
            println!("Wrote {} records to {}", dataset.len(), path.display());
        }

        Commands::Stats { data } => {
            let path = data.unwrap_or_else(|| config.data_path.clone());
            let dataset = Dataset::read_csv(&path)
                .with_context(|| format!("reading dataset {}", path.display()))?;
            print_stats(&dataset);
        }

        Commands::Train { data, model_dir, epochs, batch_size, seed } => {
            let mut config = config;
            if let Some(data) = data {
                config.data_path = data;
            }
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            if let Some(epochs) = epochs {
                config.epochs = epochs;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            train(&config)?;
        }

        Commands::Monitor { model_dir, ticks, attack_probability, threshold, seed } => {
            let bundle = ModelBundle::new(model_dir.unwrap_or_else(|| config.model_dir.clone()));
            let settings = MonitorSettings {
                attack_probability: attack_probability.unwrap_or(config.attack_probability),
                threshold: threshold.unwrap_or(config.threshold),
            };
            run_monitor(&bundle, ticks, &settings, seed)?;
        }
    }

    Ok(())
}

fn simulator_for(seed: Option<u64>) -> TrafficSimulator {
    match seed {
        Some(seed) => TrafficSimulator::with_seed(seed),
        None => TrafficSimulator::new(),
    }
}

fn generate_dataset(simulator: &mut TrafficSimulator, plan: &DatasetPlan, path: &Path) -> Result<Dataset> {
    let dataset = Dataset::generate(simulator, plan);
    dataset
        .write_csv(path)
        .with_context(|| format!("writing dataset {}", path.display()))?;
    Ok(dataset)
}

fn print_stats(dataset: &Dataset) {
    let stats = dataset.stats();

    println!("Records: {}", stats.total_records);
    println!("Features: {}", stats.features.join(", "));

    println!("\nLabels:");
    for (label, count) in &stats.label_distribution {
        println!("  {:<12} {:>8} ({:.1}%)", label, count, stats.label_share(label) * 100.0);
    }

    println!("\nDevices:");
    for (device, count) in &stats.device_distribution {
        println!("  {:<18} {:>8}", device, count);
    }

    println!("\n  {:<8} {:>14} {:>14} {:>14}", "feature", "min", "mean", "max");
    for summary in &stats.feature_summaries {
        println!(
            "  {:<8} {:>14.3} {:>14.3} {:>14.3}",
            summary.name, summary.min, summary.mean, summary.max
        );
    }
}

fn train(config: &AppConfig) -> Result<()> {
    let dataset = if config.data_path.is_file() {
        Dataset::read_csv(&config.data_path)
            .with_context(|| format!("reading dataset {}", config.data_path.display()))?
    } else {
        log::info!("No dataset at {}, generating one", config.data_path.display());
        let mut simulator = TrafficSimulator::with_seed(config.seed);
        generate_dataset(&mut simulator, &DatasetPlan::default(), &config.data_path)?
    };

    let (x, y) = dataset.prepare_features();
    let mut detector = AnomalyDetector::new(FEATURE_COUNT)?;
    let outcome = detector
        .train(&x, Some(&y), &config.train_options())
        .context("training detector")?;

    if let (Some(train), Some(val)) = (outcome.history.final_train(), outcome.history.final_validation()) {
        println!(
            "Final: loss {:.4} acc {:.4} | val_loss {:.4} val_acc {:.4} val_precision {:.4} val_recall {:.4}",
            train.loss, train.accuracy, val.loss, val.accuracy, val.precision, val.recall
        );
    }
    println!("\nHeld-out report ({} rows):\n{}", outcome.test_set.len(), outcome.report);

    let bundle = ModelBundle::new(config.model_dir.clone());
    detector.save(&bundle).context("saving model bundle")?;
    println!("\nModel bundle saved to {}", bundle.dir().display());
    Ok(())
}

fn run_monitor(bundle: &ModelBundle, ticks: usize, settings: &MonitorSettings, seed: Option<u64>) -> Result<()> {
    let detector = AnomalyDetector::restore(FEATURE_COUNT, bundle)
        .with_context(|| format!("loading model bundle {}", bundle.dir().display()))?;
    let mut simulator = simulator_for(seed);
    let mut state = MonitorState::new();

    for _ in 0..ticks {
        let (next, outcome) = monitor::tick(&state, &mut simulator, &detector, settings)?;
        state = next;

        let record = &outcome.record;
        let marker = if outcome.prediction.is_anomaly { "ALERT" } else { "ok" };
        println!(
            "{} {:<17} {:<9} rate={:>9.2} score={:.3} {}",
            record.timestamp.format("%H:%M:%S"),
            record.device.as_str(),
            record.label.as_str(),
            record.rate,
            outcome.prediction.score,
            marker
        );
    }

    let false_alarms = state.alerts.iter().filter(|a| a.is_false_alarm()).count();
    println!(
        "\nProcessed {} events, {} flagged ({:.1}% threat level), {} false alarms in recent alerts",
        state.processed,
        state.anomalies,
        state.threat_level() * 100.0,
        false_alarms
    );
    Ok(())
}
