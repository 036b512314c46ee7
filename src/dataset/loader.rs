use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use super::{DatasetConfig, DatasetError, Digits, MAX_PIXEL, N_CLASSES, N_FEATURES};

/// Load the digits, downloading into the cache path on first use.
///
/// A download is only cached once it parses, so a bad response never
/// shadows later retries.
pub fn load(config: &DatasetConfig) -> Result<Digits, DatasetError> {
    let path = config.path.as_path();

    let (bytes, (mut samples, mut targets)) = if path.exists() {
        info!(path = %path.display(), "reading cached dataset");
        let bytes = fs::read(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rows = parse(&bytes)?;
        (bytes, rows)
    } else if config.download {
        let bytes = fetch(&config.url)?;
        let rows = parse(&bytes)?;
        if rows.0.is_empty() {
            return Err(DatasetError::Empty);
        }
        store(path, &bytes)?;
        (bytes, rows)
    } else {
        return Err(DatasetError::NotCached(path.to_path_buf()));
    };

    if let Some(limit) = config.max_samples {
        samples.truncate(limit);
        targets.truncate(limit);
    }
    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }

    let mut hasher = Sha256::new();
    hasher.update(&bytes);

    info!(samples = samples.len(), "dataset loaded");
    Ok(Digits::new(
        samples,
        targets,
        path.to_path_buf(),
        hex::encode(hasher.finalize()),
    ))
}

/// Download the raw dataset file
pub fn fetch(url: &str) -> Result<Vec<u8>, DatasetError> {
    info!(%url, "downloading dataset");

    let response = reqwest::blocking::get(url)
        .map_err(|e| DatasetError::DownloadFailed(format!("HTTP request failed: {}", e)))?;

    if !response.status().is_success() {
        return Err(DatasetError::DownloadFailed(format!(
            "HTTP {}: {}",
            response.status(),
            response.status().canonical_reason().unwrap_or("Unknown")
        )));
    }

    let bytes = response.bytes().map_err(|e| {
        DatasetError::DownloadFailed(format!("Failed to read response body: {}", e))
    })?;

    Ok(bytes.to_vec())
}

fn store(path: &Path, bytes: &[u8]) -> Result<(), DatasetError> {
    let io_err = |source: std::io::Error| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, bytes).map_err(io_err)?;
    info!(path = %path.display(), bytes = bytes.len(), "dataset cached");
    Ok(())
}

/// Parse comma-separated rows of 64 pixel counts followed by the label.
///
/// Blank lines are skipped. Line numbers in errors are 1-based.
pub fn parse(bytes: &[u8]) -> Result<(Vec<Vec<f32>>, Vec<u8>), DatasetError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DatasetError::Malformed {
        line: 0,
        message: format!("not valid UTF-8: {}", e),
    })?;

    let mut samples = Vec::new();
    let mut targets = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() != N_FEATURES + 1 {
            return Err(DatasetError::Malformed {
                line,
                message: format!("expected {} fields, found {}", N_FEATURES + 1, fields.len()),
            });
        }

        let mut row = Vec::with_capacity(N_FEATURES);
        for (col, field) in fields[..N_FEATURES].iter().enumerate() {
            let value = parse_bounded(field, MAX_PIXEL).ok_or_else(|| DatasetError::Malformed {
                line,
                message: format!("pixel {} is {:?}, expected 0..={}", col, field, MAX_PIXEL),
            })?;
            row.push(value as f32);
        }

        let label = parse_bounded(fields[N_FEATURES], N_CLASSES - 1).ok_or_else(|| {
            DatasetError::Malformed {
                line,
                message: format!(
                    "label is {:?}, expected 0..={}",
                    fields[N_FEATURES],
                    N_CLASSES - 1
                ),
            }
        })?;

        samples.push(row);
        targets.push(label);
    }

    if samples.is_empty() {
        warn!("dataset file has no rows");
    }
    Ok((samples, targets))
}

fn parse_bounded(field: &str, max: u8) -> Option<u8> {
    field.parse::<u8>().ok().filter(|&v| v <= max)
}
