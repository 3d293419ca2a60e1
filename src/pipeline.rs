use crate::builder::{build_dataset, check_sanity, SanityThresholds};
use crate::cache;
use crate::input::resolve_input;
use crate::models::{Level, PageType, RawRows};
use crate::parsers::{DefaultNamePolicy, RegencyStrategy};
use crate::runner::{classify_pages, run_extraction, ExtractOptions, ProgressFn};
use crate::sink::write_dataset;
use crate::source::PageDump;
use crate::stats::RunStats;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Local path or http(s) URL of the page dump
    pub input: String,
    pub output_dir: String,
    pub expected_sha256: Option<String>,
    pub start_page: usize,
    pub end_page: Option<usize>,
    /// Skip page iteration and build from the raw cache of a previous run
    pub reuse_raw: bool,
    pub regency_strategy: RegencyStrategy,
    pub thresholds: SanityThresholds,
}

impl RunConfig {
    pub fn new(input: impl Into<String>, output_dir: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            expected_sha256: None,
            start_page: 1,
            end_page: None,
            reuse_raw: false,
            regency_strategy: RegencyStrategy::default(),
            thresholds: SanityThresholds::default(),
        }
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            start_page: self.start_page,
            end_page: self.end_page,
            regency_strategy: self.regency_strategy,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: RunStats,
    pub provinces: usize,
    pub regencies: usize,
    pub districts: usize,
    pub villages: usize,
    pub joined: usize,
    pub files: Vec<PathBuf>,
    pub extraction_time: Duration,
    pub build_time: Duration,
}

fn extract_raw(
    config: &RunConfig,
    progress: Option<ProgressFn<'_>>,
) -> Result<(RawRows, RunStats)> {
    let path = resolve_input(
        &config.input,
        &config.output_dir,
        config.expected_sha256.as_deref(),
    )?;
    let mut source = PageDump::open(&path)?;
    let policy = DefaultNamePolicy::default();

    let extraction = run_extraction(
        &mut source,
        &config.extract_options(),
        &policy,
        progress,
    )?;

    cache::save_raw(
        &extraction.raw,
        &config.input,
        config.start_page,
        config.end_page,
        &config.output_dir,
    )?;

    Ok((extraction.raw, extraction.stats))
}

/// Runs extraction (or loads the raw cache), builds and validates the dataset
/// and publishes it.
///
/// The raw cache survives any failure after extraction so the build can be
/// retried with `reuse_raw`; it is removed once the output is written.
pub fn run(config: &RunConfig, progress: Option<ProgressFn<'_>>) -> Result<RunSummary> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create output directory: {}", config.output_dir))?;

    let start_extracting = Instant::now();
    let (raw, stats) = if config.reuse_raw {
        let (raw, manifest) = cache::load_raw(&config.output_dir)?;
        if manifest.input != config.input {
            warn!(
                cached = %manifest.input,
                current = %config.input,
                "Raw cache was produced from a different input"
            );
        }
        let stats = RunStats::from_raw(&raw);
        (raw, stats)
    } else {
        extract_raw(config, progress)?
    };
    let extraction_time = start_extracting.elapsed();

    for level in Level::ALL {
        info!(level = level.as_str(), rows = raw.count(level), "Raw rows");
    }

    let start_building = Instant::now();
    check_sanity(&raw, &config.thresholds)?;
    let dataset = build_dataset(&raw)?;
    let files = write_dataset(&dataset, &config.output_dir)?;
    let build_time = start_building.elapsed();

    if let Err(e) = cache::clear(&config.output_dir) {
        warn!(error = %e, "Failed to clear raw cache");
    }

    Ok(RunSummary {
        stats,
        provinces: dataset.provinces.len(),
        regencies: dataset.regencies.len(),
        districts: dataset.districts.len(),
        villages: dataset.villages.len(),
        joined: dataset.joined.len(),
        files,
        extraction_time,
        build_time,
    })
}

/// Raw page classifications over the configured page range.
pub fn classify(config: &RunConfig) -> Result<Vec<(usize, PageType)>> {
    let path = resolve_input(
        &config.input,
        &config.output_dir,
        config.expected_sha256.as_deref(),
    )?;
    let mut source = PageDump::open(&path)?;
    classify_pages(&mut source, &config.extract_options())
}
