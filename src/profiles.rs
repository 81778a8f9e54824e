//! Class sets for the two annotation passes and the LabelMe config that
//! goes with them.

use clap::ValueEnum;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PrepError, Result};
use crate::vocabulary::ClassVocabulary;

/// Annotation pass.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum LabelProfile {
    /// Stage 1: text carriers (signboards, product labels) in full images
    #[default]
    Carrier,
    /// Stage 2: line-level text zones inside carrier crops
    Text,
}

impl LabelProfile {
    pub fn name(&self) -> &'static str {
        match self {
            LabelProfile::Carrier => "carrier",
            LabelProfile::Text => "text",
        }
    }

    pub fn classes(&self) -> &'static [&'static str] {
        match self {
            LabelProfile::Carrier => &["signboard", "product_label"],
            LabelProfile::Text => &["text_line"],
        }
    }

    pub fn vocabulary(&self) -> ClassVocabulary {
        ClassVocabulary::new(self.classes().iter().copied())
            .unwrap_or_else(|_| unreachable!("built-in profiles are non-empty and unique"))
    }
}

// Mirrors the keys LabelMe reads from its config file
#[derive(Debug, Serialize)]
pub struct LabelmeConfig {
    pub auto_save: bool,
    pub display_label_popup: bool,
    pub keep_prev: bool,
    pub keep_prev_mode: bool,
    pub keep_prev_scale: bool,
    pub keep_prev_brightness: bool,
    pub keep_prev_contrast: bool,
    pub logger_level: String,
    pub shape_color: String,
    pub shift_auto_shape_color: u32,
    pub sort_labels: bool,
    pub validate_label: String,
    pub labels: Vec<String>,
}

impl LabelmeConfig {
    pub fn for_profile(profile: LabelProfile) -> Self {
        Self {
            auto_save: true,
            display_label_popup: true,
            keep_prev: true,
            keep_prev_mode: true,
            keep_prev_scale: true,
            keep_prev_brightness: true,
            keep_prev_contrast: true,
            logger_level: "info".to_string(),
            shape_color: "auto".to_string(),
            shift_auto_shape_color: 0,
            sort_labels: true,
            validate_label: "exact".to_string(),
            labels: profile.classes().iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Paths written by [`write_profile_files`].
#[derive(Debug)]
pub struct ProfileFiles {
    pub vocabulary: PathBuf,
    pub labelme_config: PathBuf,
}

/// Write `labels.<profile>.txt` and `labelme_config.<profile>.json` into `dir`.
pub fn write_profile_files(profile: LabelProfile, dir: &Path) -> Result<ProfileFiles> {
    fs::create_dir_all(dir).map_err(|e| PrepError::io(dir, e))?;

    let vocabulary = dir.join(format!("labels.{}.txt", profile.name()));
    fs::write(&vocabulary, profile.vocabulary().to_file_contents())
        .map_err(|e| PrepError::io(&vocabulary, e))?;

    let labelme_config = dir.join(format!("labelme_config.{}.json", profile.name()));
    let json = serde_json::to_string_pretty(&LabelmeConfig::for_profile(profile))?;
    fs::write(&labelme_config, json).map_err(|e| PrepError::io(&labelme_config, e))?;

    Ok(ProfileFiles {
        vocabulary,
        labelme_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_classes() {
        assert_eq!(LabelProfile::Carrier.classes(), &["signboard", "product_label"]);
        assert_eq!(LabelProfile::Text.vocabulary().id_of("text_line"), Some(0));
    }

    #[test]
    fn test_write_profile_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = write_profile_files(LabelProfile::Carrier, dir.path()).unwrap();

        assert_eq!(files.vocabulary, dir.path().join("labels.carrier.txt"));
        let vocab = ClassVocabulary::load(&files.vocabulary).unwrap();
        assert_eq!(vocab.names(), &["signboard", "product_label"]);

        let config: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.labelme_config).unwrap()).unwrap();
        assert_eq!(config["validate_label"], "exact");
        assert_eq!(config["labels"], serde_json::json!(["signboard", "product_label"]));
        assert_eq!(config["auto_save"], true);
    }
}
