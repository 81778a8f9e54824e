use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Read and parse a JSON file from a buffered stream.
///
/// Failures are logged and reported as `None` so one bad file never stops
/// a run.
pub fn read_and_parse_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open JSON file ({}): {:?}", path.display(), e);
            return None;
        }
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(value) => Some(value),
        Err(e) => {
            error!("Failed to parse JSON ({}): {}", path.display(), e);
            None
        }
    }
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
                label
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Create an output directory if it is missing. Existing content is left
/// untouched.
pub fn create_output_directory(path: &Path) -> std::io::Result<PathBuf> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(path.to_path_buf())
}

/// File name of a path as an owned string (empty when there is none).
pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// File stem of a path as an owned string (empty when there is none).
pub fn file_stem_string(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
