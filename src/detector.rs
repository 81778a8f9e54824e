//! The detection model seam.
//!
//! The crate never runs a model itself. A [`Detector`] is either an external
//! program that prints detections as JSON, or a file of predictions exported
//! ahead of time.

use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrepError, Result};
use crate::io::require_program;
use crate::types::Detection;

/// Source of detections for one image.
///
/// Implementations are expected to apply `confidence_threshold` themselves.
/// An `Err` aborts the whole run.
pub trait Detector {
    fn detect(&mut self, image_path: &Path, confidence_threshold: f64) -> Result<Vec<Detection>>;
}

/// Runs `<program> --model <model> --source <image> --conf <threshold>` and
/// reads a JSON array of detections from its stdout.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: PathBuf,
    model: String,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            model: model.into(),
        }
    }

    fn name(&self) -> String {
        self.program.display().to_string()
    }
}

impl Detector for CommandDetector {
    fn detect(&mut self, image_path: &Path, confidence_threshold: f64) -> Result<Vec<Detection>> {
        let output = Command::new(&self.program)
            .arg("--model")
            .arg(&self.model)
            .arg("--source")
            .arg(image_path)
            .arg("--conf")
            .arg(confidence_threshold.to_string())
            .output()
            .map_err(|e| PrepError::collaborator(self.name(), e.to_string()))?;

        if !output.status.success() {
            return Err(PrepError::collaborator(
                self.name(),
                format!(
                    "{} on {}: {}",
                    output.status,
                    image_path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let detections: Vec<Detection> = serde_json::from_slice(&output.stdout).map_err(|e| {
            PrepError::collaborator(
                self.name(),
                format!("malformed output for {}: {}", image_path.display(), e),
            )
        })?;
        debug!("{}: {} detections", image_path.display(), detections.len());
        Ok(detections)
    }
}

/// Precomputed predictions keyed by image file name.
#[derive(Debug, Clone, Default)]
pub struct PredictionsFileDetector {
    predictions: HashMap<String, Vec<Detection>>,
}

impl PredictionsFileDetector {
    pub fn new(predictions: HashMap<String, Vec<Detection>>) -> Self {
        Self { predictions }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            PrepError::config(format!("cannot open predictions {}: {}", path.display(), e))
        })?;
        let predictions = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self::new(predictions))
    }
}

impl Detector for PredictionsFileDetector {
    fn detect(&mut self, image_path: &Path, confidence_threshold: f64) -> Result<Vec<Detection>> {
        let name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self
            .predictions
            .get(&name)
            .map(|detections| {
                detections
                    .iter()
                    .filter(|d| d.confidence >= confidence_threshold)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Pick a detector for a model reference.
///
/// With an explicit `program` the model reference is handed to it as-is.
/// Otherwise the reference must be a `.json` predictions file. Either way a
/// missing program or file is reported here, before any output exists.
pub fn detector_for(model: &str, program: Option<&Path>) -> Result<Box<dyn Detector>> {
    if let Some(program) = program {
        require_program(program, "detector program")?;
        return Ok(Box::new(CommandDetector::new(program, model)));
    }

    let path = Path::new(model);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        return Err(PrepError::config(format!(
            "model '{}' needs a detector program (--detector) unless it is a .json predictions file",
            model
        )));
    }
    if !path.is_file() {
        return Err(PrepError::config(format!(
            "predictions file does not exist: {}",
            path.display()
        )));
    }
    Ok(Box::new(PredictionsFileDetector::load(path)?))
}
