use std::fs::{self, File};
use std::path::Path;

use super::{Dataset, DatasetError};
use crate::logic::traffic::TrafficRecord;

/// CSV header of the interchange table
pub const CSV_COLUMNS: [&str; 11] = [
    "timestamp", "device", "dur", "spkts", "dpkts", "sbytes",
    "dbytes", "rate", "sttl", "dttl", "label",
];

impl Dataset {
    /// Write the dataset as CSV, creating parent directories.
    /// The header is written even for an empty dataset.
    pub fn write_csv(&self, path: &Path) -> Result<(), DatasetError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(path)?);

        writer.write_record(CSV_COLUMNS)?;
        for record in self.records() {
            writer.serialize(record)?;
        }
        writer.flush()?;

        log::info!("Saved {} records to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a dataset written by `write_csv` (or any table with the same header)
    pub fn read_csv(path: &Path) -> Result<Self, DatasetError> {
        let mut reader = csv::Reader::from_path(path)?;

        let records = reader
            .deserialize::<TrafficRecord>()
            .collect::<Result<Vec<_>, _>>()?;

        log::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(Dataset::from_records(records))
    }
}
