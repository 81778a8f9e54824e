use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PrepError, Result};

/// A recognized line of text inside a crop.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub score: f64,
    /// Polygon around the text, in crop pixel coordinates.
    pub bbox: Vec<[f64; 2]>,
}

/// All lines recognized in one image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OcrImageResult {
    pub image: String,
    pub lines: Vec<OcrLine>,
}

/// Text recognition seam. An `Err` aborts the run.
pub trait OcrEngine {
    fn recognize(&mut self, image_path: &Path) -> Result<Vec<OcrLine>>;
}

/// Engine language to use for a comma-separated language list.
///
/// English wins when listed since mixed-script crops still read fine with
/// it; otherwise the first listed language; `en` for an empty list.
pub fn primary_language(langs: &str) -> String {
    let langs: Vec<&str> = langs
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if langs.contains(&"en") {
        "en".to_string()
    } else {
        langs.first().copied().unwrap_or("en").to_string()
    }
}

/// Runs `<program> --lang <lang> --source <image>` and reads a JSON array
/// of lines from its stdout.
#[derive(Debug, Clone)]
pub struct CommandOcrEngine {
    program: PathBuf,
    lang: String,
}

impl CommandOcrEngine {
    pub fn new(program: impl Into<PathBuf>, langs: &str) -> Self {
        Self {
            program: program.into(),
            lang: primary_language(langs),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }
}

impl OcrEngine for CommandOcrEngine {
    fn recognize(&mut self, image_path: &Path) -> Result<Vec<OcrLine>> {
        let name = self.program.display().to_string();
        let output = Command::new(&self.program)
            .arg("--lang")
            .arg(&self.lang)
            .arg("--source")
            .arg(image_path)
            .output()
            .map_err(|e| PrepError::collaborator(&name, e.to_string()))?;

        if !output.status.success() {
            return Err(PrepError::collaborator(
                &name,
                format!(
                    "{} on {}: {}",
                    output.status,
                    image_path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            PrepError::collaborator(
                &name,
                format!("malformed output for {}: {}", image_path.display(), e),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_language() {
        assert_eq!(primary_language("en,bn"), "en");
        assert_eq!(primary_language("bn, en"), "en");
        assert_eq!(primary_language("bn"), "bn");
        assert_eq!(primary_language(" , "), "en");
        assert_eq!(primary_language(""), "en");
    }

    #[test]
    fn test_ocr_result_keeps_unicode_unescaped() {
        let result = OcrImageResult {
            image: "sign.png".to_string(),
            lines: vec![OcrLine {
                text: "দোকান".to_string(),
                score: 0.5,
                bbox: vec![[0.0, 0.0], [10.0, 0.0], [10.0, 5.0], [0.0, 5.0]],
            }],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("দোকান"));
    }
}
