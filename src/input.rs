use crate::config::DOWNLOAD_DIR;
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CHUNK_SIZE: usize = 8192;
const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

pub fn is_url(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; CHUNK_SIZE];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Compares hex digests case-insensitively. No expectation always passes.
pub fn verify_sha256(actual: &str, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        bail!("SHA256 mismatch: expected {}, got {}", expected.trim(), actual);
    }
    info!("SHA256 checksum verified");
    Ok(())
}

/// File name for a downloaded URL: its last path segment without query.
fn download_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    match after_scheme.split_once('/') {
        Some((_, rest)) => rest
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("source")
            .to_string(),
        None => "source".to_string(),
    }
}

/// Streams `url` into `target`, hashing while writing. Returns the hex digest.
pub fn download(url: &str, target: &Path) -> Result<String> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    info!(url, target = ?target, "Downloading input");

    let agent = ureq::AgentBuilder::new()
        .timeout_read(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .build();
    let response = match agent.get(url).call() {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            let text = resp.into_string().unwrap_or_default();
            bail!("Download of {} failed with status {}: {}", url, code, text.trim());
        }
        Err(err) => bail!("Download of {} failed: {}", url, err),
    };

    let total = response
        .header("Content-Length")
        .and_then(|v| v.parse::<u64>().ok());
    let pb = match total {
        Some(len) => ProgressBar::new(len),
        None => ProgressBar::new_spinner(),
    };

    let part = target.with_extension("part");
    let file = File::create(&part)
        .with_context(|| format!("Failed to create download file: {:?}", part))?;
    let mut writer = BufWriter::new(file);
    let mut reader = response.into_reader();
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let count = reader
            .read(&mut buf)
            .with_context(|| format!("Failed reading download stream: {}", url))?;
        if count == 0 {
            break;
        }
        writer
            .write_all(&buf[..count])
            .with_context(|| format!("Failed to write download file: {:?}", part))?;
        hasher.update(&buf[..count]);
        written += count as u64;
        pb.inc(count as u64);
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush download file: {:?}", part))?;
    drop(writer);
    pb.finish_and_clear();

    fs::rename(&part, target)
        .with_context(|| format!("Failed to rename {:?} to {:?}", part, target))?;

    info!(bytes = written, "Download complete");
    Ok(format!("{:x}", hasher.finalize()))
}

/// Returns a local path to the input, downloading it first when it is a URL,
/// and checks the digest when one is expected.
pub fn resolve_input(location: &str, output_dir: &str, expected_sha256: Option<&str>) -> Result<PathBuf> {
    if is_url(location) {
        let target = Path::new(output_dir)
            .join(DOWNLOAD_DIR)
            .join(download_name(location));
        let digest = download(location, &target)?;
        debug!(sha256 = %digest, "Downloaded input hashed");
        verify_sha256(&digest, expected_sha256)?;
        return Ok(target);
    }

    let path = PathBuf::from(location);
    if !path.is_file() {
        bail!("Input file does not exist: {}", location);
    }
    if expected_sha256.is_some() {
        let digest = sha256_file(&path)?;
        debug!(sha256 = %digest, "Local input hashed");
        verify_sha256(&digest, expected_sha256)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // sha256("abc")
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn detects_urls() {
        assert!(is_url("https://example.org/doc.json"));
        assert!(is_url("HTTP://example.org/doc.json"));
        assert!(!is_url("/data/doc.json"));
        assert!(!is_url("ftp://example.org/doc.json"));
    }

    #[test]
    fn hashes_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(sha256_file(&path).unwrap(), ABC_SHA256);
    }

    #[test]
    fn verification_is_case_insensitive() {
        assert!(verify_sha256(ABC_SHA256, Some(ABC_SHA256.to_uppercase().as_str())).is_ok());
        assert!(verify_sha256(ABC_SHA256, None).is_ok());
        let err = verify_sha256(ABC_SHA256, Some("00")).unwrap_err();
        assert!(err.to_string().contains("SHA256 mismatch"));
    }

    #[test]
    fn local_input_must_exist() {
        let dir = TempDir::new().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let err = resolve_input("/definitely/missing.json", output_dir, None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn local_input_hash_is_checked() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, "abc").unwrap();
        let location = path.to_str().unwrap();
        let output_dir = dir.path().to_str().unwrap();

        assert_eq!(resolve_input(location, output_dir, Some(ABC_SHA256)).unwrap(), path);
        assert!(resolve_input(location, output_dir, Some("deadbeef")).is_err());
    }

    #[test]
    fn download_name_from_url() {
        assert_eq!(download_name("https://example.org/files/doc.json?x=1"), "doc.json");
        assert_eq!(download_name("https://example.org/files/"), "files");
        assert_eq!(download_name("https://example.org"), "source");
    }
}
