use crate::config::{CACHE_VERSION, RAW_CACHE_DIR, RAW_CACHE_MANIFEST};
use crate::models::{Level, RawRows};
use anyhow::{bail, Context, Result};
use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Describes a complete raw cache. Written last, so a cache directory without a
/// manifest is treated as incomplete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub input: String,
    pub start_page: usize,
    pub end_page: Option<usize>,
    pub provinces: usize,
    pub regencies: usize,
    pub districts: usize,
    pub villages: usize,
}

pub fn raw_cache_dir(output_dir: &str) -> PathBuf {
    Path::new(output_dir).join(RAW_CACHE_DIR)
}

fn level_path(dir: &Path, level: Level) -> PathBuf {
    dir.join(format!("{}.json", level.as_str()))
}

fn write_atomic(path: &Path, write: impl FnOnce(&mut BufWriter<File>) -> Result<()>) -> Result<()> {
    let tmp_path = path.with_extension("tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp cache file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    write(&mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush temp cache file: {:?}", tmp_path))?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename temp cache file to: {:?}", path))
}

fn write_rows<T: Serialize>(dir: &Path, level: Level, rows: &[T]) -> Result<()> {
    let path = level_path(dir, level);
    write_atomic(&path, |writer| {
        serde_json::to_writer_pretty(writer, rows)
            .with_context(|| format!("Failed to serialize {} raw rows", level.as_str()))
    })
}

fn read_rows<T: DeserializeOwned>(dir: &Path, level: Level) -> Result<Vec<T>> {
    let path = level_path(dir, level);
    let file = File::open(&path)
        .with_context(|| format!("Failed to open raw cache file: {:?}", path))?;
    let reader = BufReader::with_capacity(256 * 1024, file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to decode raw cache file: {:?}", path))
}

/// Persists raw rows, one JSON array per level, then the manifest.
pub fn save_raw(
    raw: &RawRows,
    input: &str,
    start_page: usize,
    end_page: Option<usize>,
    output_dir: &str,
) -> Result<PathBuf> {
    let dir = raw_cache_dir(output_dir);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {:?}", dir))?;

    write_rows(&dir, Level::Province, &raw.provinces)?;
    write_rows(&dir, Level::Regency, &raw.regencies)?;
    write_rows(&dir, Level::District, &raw.districts)?;
    write_rows(&dir, Level::Village, &raw.villages)?;

    let manifest = CacheManifest {
        version: CACHE_VERSION,
        input: input.to_string(),
        start_page,
        end_page,
        provinces: raw.provinces.len(),
        regencies: raw.regencies.len(),
        districts: raw.districts.len(),
        villages: raw.villages.len(),
    };
    write_atomic(&dir.join(RAW_CACHE_MANIFEST), |writer| {
        bincode::DefaultOptions::new()
            .serialize_into(writer, &manifest)
            .context("Failed to serialize raw cache manifest")
    })?;

    info!(
        provinces = manifest.provinces,
        regencies = manifest.regencies,
        districts = manifest.districts,
        villages = manifest.villages,
        path = ?dir,
        "Raw cache saved"
    );

    Ok(dir)
}

/// Returns `Ok(None)` if the manifest is missing or unreadable.
pub fn read_manifest(output_dir: &str) -> Result<Option<CacheManifest>> {
    let path = raw_cache_dir(output_dir).join(RAW_CACHE_MANIFEST);
    if !path.exists() {
        return Ok(None);
    }

    let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    let file = File::open(&path).context("Failed to open raw cache manifest")?;
    let reader = BufReader::new(file);
    let options = bincode::options().with_limit(file_size.saturating_add(1024));

    match options.deserialize_from(reader) {
        Ok(manifest) => Ok(Some(manifest)),
        Err(e) => {
            warn!(error = %e, "Raw cache manifest is corrupt or unreadable");
            Ok(None)
        }
    }
}

/// Loads the cached raw rows for the reuse-raw fast path.
pub fn load_raw(output_dir: &str) -> Result<(RawRows, CacheManifest)> {
    let dir = raw_cache_dir(output_dir);
    let Some(manifest) = read_manifest(output_dir)? else {
        bail!(
            "No usable raw cache in {:?}; run without --reuse-raw first",
            dir
        );
    };

    if manifest.version != CACHE_VERSION {
        bail!(
            "Raw cache version {} does not match current version {}; run without --reuse-raw",
            manifest.version,
            CACHE_VERSION
        );
    }

    let raw = RawRows {
        provinces: read_rows(&dir, Level::Province)?,
        regencies: read_rows(&dir, Level::Regency)?,
        districts: read_rows(&dir, Level::District)?,
        villages: read_rows(&dir, Level::Village)?,
    };

    for level in Level::ALL {
        let expected = match level {
            Level::Province => manifest.provinces,
            Level::Regency => manifest.regencies,
            Level::District => manifest.districts,
            Level::Village => manifest.villages,
        };
        if raw.count(level) != expected {
            bail!(
                "Raw cache for {} holds {} rows but the manifest records {}",
                level.as_str(),
                raw.count(level),
                expected
            );
        }
    }

    info!(
        input = %manifest.input,
        provinces = manifest.provinces,
        regencies = manifest.regencies,
        districts = manifest.districts,
        villages = manifest.villages,
        "Raw rows loaded from cache"
    );

    Ok((raw, manifest))
}

/// Removes the raw cache directory. Returns whether anything was deleted.
pub fn clear(output_dir: &str) -> Result<bool> {
    let dir = raw_cache_dir(output_dir);
    if !dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&dir)
        .with_context(|| format!("Failed to remove raw cache: {:?}", dir))?;
    info!(path = ?dir, "Raw cache cleared");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawDistrict, RawProvince, RawRegency, RawVillage, RegencyType, VillageType};
    use tempfile::TempDir;

    fn sample_rows() -> RawRows {
        RawRows {
            provinces: vec![RawProvince {
                code: "11".to_string(),
                name: "ACEH".to_string(),
                island_count: Some("23".to_string()),
                source_page: 16,
            }],
            regencies: vec![RawRegency {
                code: "1101".to_string(),
                province_code: "11".to_string(),
                name: "Kabupaten Aceh Selatan".to_string(),
                kind: RegencyType::Regency,
                source_page: 18,
            }],
            districts: vec![RawDistrict {
                code: "110101".to_string(),
                province_code: "11".to_string(),
                regency_code: "1101".to_string(),
                name: "Bakongan".to_string(),
                province_capital: Some("Banda Aceh".to_string()),
                regency_capital: Some("Tapaktuan".to_string()),
                source_page: 40,
            }],
            villages: vec![
                RawVillage {
                    code: "110101".to_string(),
                    district_code: "110101".to_string(),
                    name: None,
                    kind: None,
                    source_page: 100,
                },
                RawVillage {
                    code: "1101012001".to_string(),
                    district_code: "110101".to_string(),
                    name: Some("Keude Bakongan".to_string()),
                    kind: Some(VillageType::Village),
                    source_page: 100,
                },
            ],
        }
    }

    #[test]
    fn raw_cache_dir_is_under_output() {
        assert_eq!(
            raw_cache_dir("/output/dir"),
            PathBuf::from("/output/dir/.raw_cache")
        );
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let raw = sample_rows();

        save_raw(&raw, "doc.json", 3, Some(90), output_dir).unwrap();
        let (loaded, manifest) = load_raw(output_dir).unwrap();

        assert_eq!(loaded, raw);
        assert_eq!(manifest.version, CACHE_VERSION);
        assert_eq!(manifest.input, "doc.json");
        assert_eq!(manifest.start_page, 3);
        assert_eq!(manifest.end_page, Some(90));
        assert_eq!(manifest.villages, 2);
    }

    #[test]
    fn one_json_file_per_level() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        save_raw(&sample_rows(), "doc.json", 1, None, output_dir).unwrap();

        let cache = raw_cache_dir(output_dir);
        for name in ["province.json", "regency.json", "district.json", "village.json"] {
            assert!(cache.join(name).exists(), "missing {}", name);
        }
        assert!(cache.join(RAW_CACHE_MANIFEST).exists());

        let content = fs::read_to_string(cache.join("regency.json")).unwrap();
        assert!(content.contains(r#""type": "regency""#));
    }

    #[test]
    fn load_without_manifest_fails() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let err = load_raw(output_dir).unwrap_err();
        assert!(err.to_string().contains("No usable raw cache"));
    }

    #[test]
    fn corrupt_manifest_is_unusable() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let cache = raw_cache_dir(output_dir);
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join(RAW_CACHE_MANIFEST), b"\xff\xff\xff\xff\xff").unwrap();

        assert!(read_manifest(output_dir).unwrap().is_none());
        assert!(load_raw(output_dir).is_err());
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        save_raw(&sample_rows(), "doc.json", 1, None, output_dir).unwrap();

        let manifest = CacheManifest {
            version: CACHE_VERSION + 1,
            input: "doc.json".to_string(),
            start_page: 1,
            end_page: None,
            provinces: 1,
            regencies: 1,
            districts: 1,
            villages: 2,
        };
        let bytes = bincode::DefaultOptions::new().serialize(&manifest).unwrap();
        fs::write(raw_cache_dir(output_dir).join(RAW_CACHE_MANIFEST), bytes).unwrap();

        let err = load_raw(output_dir).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn truncated_level_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        save_raw(&sample_rows(), "doc.json", 1, None, output_dir).unwrap();
        fs::write(raw_cache_dir(output_dir).join("village.json"), "[]").unwrap();

        let err = load_raw(output_dir).unwrap_err();
        assert!(err.to_string().contains("village"));
    }

    #[test]
    fn clear_removes_directory() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        save_raw(&sample_rows(), "doc.json", 1, None, output_dir).unwrap();

        assert!(clear(output_dir).unwrap());
        assert!(!raw_cache_dir(output_dir).exists());
        assert!(!clear(output_dir).unwrap());
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        save_raw(&sample_rows(), "doc.json", 1, None, output_dir).unwrap();

        let leftovers: Vec<_> = fs::read_dir(raw_cache_dir(output_dir))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
