use crate::config::{
    CSV_BUFFER_SIZE, DISTRICT_CSV, PROVINCE_CSV, REGENCY_CSV, VILLAGE_CSV, VILLAGE_FULL_CSV,
};
use crate::models::Dataset;
use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

fn tmp_path(path: &Path) -> PathBuf {
    path.with_extension("csv.tmp")
}

const PROVINCE_HEADER: &[&str] = &["code", "name", "capital"];
const REGENCY_HEADER: &[&str] = &[
    "code",
    "province_code",
    "name",
    "capital",
    "type",
    "is_administrative",
];
const DISTRICT_HEADER: &[&str] = &["code", "regency_code", "name"];
const VILLAGE_HEADER: &[&str] = &["code", "district_code", "name", "type"];
const VILLAGE_FULL_HEADER: &[&str] = &[
    "village_code",
    "village_name",
    "village_type",
    "district_code",
    "district_name",
    "regency_code",
    "regency_name",
    "regency_type",
    "regency_capital",
    "regency_is_administrative",
    "province_code",
    "province_name",
    "province_capital",
];

/// Writes the header row, then one record per row. Null fields become empty.
/// The header is explicit so empty tables still carry one.
fn write_table<T: Serialize>(path: &Path, header: &[&str], rows: &[T]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::with_capacity(CSV_BUFFER_SIZE, file));

    writer
        .write_record(header)
        .with_context(|| format!("Failed to write CSV header to {:?}", path))?;

    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed to write CSV record to {:?}", path))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {:?}", path))?;
    debug!(path = ?path, rows = rows.len(), "CSV table written");
    Ok(())
}

fn remove_quietly(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            warn!(error = %e, path = ?path, "Failed to remove temporary CSV file");
        }
    }
}

/// Publishes the five output tables. Every table is written to a temporary
/// file first; the final names appear only once all of them are complete.
pub fn write_dataset(dataset: &Dataset, output_dir: &str) -> Result<Vec<PathBuf>> {
    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    let targets: Vec<PathBuf> = [
        PROVINCE_CSV,
        REGENCY_CSV,
        DISTRICT_CSV,
        VILLAGE_CSV,
        VILLAGE_FULL_CSV,
    ]
    .iter()
    .map(|name| dir.join(name))
    .collect();
    let tmps: Vec<PathBuf> = targets.iter().map(|p| tmp_path(p)).collect();

    let written = write_table(&tmps[0], PROVINCE_HEADER, &dataset.provinces)
        .and_then(|_| write_table(&tmps[1], REGENCY_HEADER, &dataset.regencies))
        .and_then(|_| write_table(&tmps[2], DISTRICT_HEADER, &dataset.districts))
        .and_then(|_| write_table(&tmps[3], VILLAGE_HEADER, &dataset.villages))
        .and_then(|_| write_table(&tmps[4], VILLAGE_FULL_HEADER, &dataset.joined));

    if let Err(e) = written {
        let existing: Vec<PathBuf> = tmps.iter().filter(|p| p.exists()).cloned().collect();
        remove_quietly(&existing);
        return Err(e);
    }

    for (tmp, target) in tmps.iter().zip(&targets) {
        fs::rename(tmp, target)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp, target))?;
    }

    info!(
        provinces = dataset.provinces.len(),
        regencies = dataset.regencies.len(),
        districts = dataset.districts.len(),
        villages = dataset.villages.len(),
        joined = dataset.joined.len(),
        output_dir,
        "Dataset written"
    );

    Ok(targets)
}
