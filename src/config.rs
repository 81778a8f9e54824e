use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;

use crate::profiles::LabelProfile;

/// Prepare carrier and text-zone datasets: LabelMe rectangles to YOLO labels,
/// detections to padded crops.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert LabelMe JSON rectangles to YOLO txt labels
    Convert(ConvertArgs),
    /// Run carrier detection and crop signboards/product labels
    DetectAndCrop(CropArgs),
    /// Run OCR on text-line crops
    Ocr(OcrArgs),
    /// Write the class file and LabelMe config for an annotation pass
    InitProfile(InitProfileArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Folder containing images and their LabelMe .json files
    #[arg(long)]
    pub images: PathBuf,

    /// Output dataset folder (images/ and labels/ are created inside)
    #[arg(long)]
    pub out: PathBuf,

    /// Class file, one class name per line; line order defines class ids
    #[arg(long)]
    pub classes: PathBuf,

    /// Only convert images with this extension (e.g. .jpg)
    #[arg(long)]
    pub ext: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CropArgs {
    /// Input images folder
    #[arg(long)]
    pub images: PathBuf,

    /// Model reference handed to the detector, or a .json predictions file
    #[arg(long)]
    pub model: String,

    /// Output folder for crops/ and crops.json
    #[arg(long)]
    pub out: PathBuf,

    /// Confidence threshold passed to the detector
    #[arg(long, default_value_t = 0.25, value_parser = validate_ratio)]
    pub conf: f64,

    /// Padding around each box, relative to max(image width, image height)
    #[arg(long, default_value_t = 0.03, value_parser = validate_ratio)]
    pub pad: f64,

    /// Detector program, called as `PROGRAM --model M --source IMAGE --conf C`
    #[arg(long)]
    pub detector: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct OcrArgs {
    /// Folder containing text-line crop images
    #[arg(long)]
    pub images: PathBuf,

    /// Output JSON path
    #[arg(long)]
    pub out: PathBuf,

    /// Comma-separated languages
    #[arg(long, default_value = "en,bn")]
    pub lang: String,

    /// OCR program, called as `PROGRAM --lang L --source IMAGE`
    #[arg(long)]
    pub engine: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct InitProfileArgs {
    /// Annotation pass to prepare
    #[arg(value_enum, default_value_t = LabelProfile::Carrier)]
    pub profile: LabelProfile,

    /// Where to write labels.<profile>.txt and labelme_config.<profile>.json
    #[arg(long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,
}

// Validate that a ratio is between 0.0 and 1.0
pub fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("value must be between 0.0 and 1.0".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ratio() {
        assert!(validate_ratio("0.5").is_ok());
        assert!(validate_ratio("1.0").is_ok());
        assert!(validate_ratio("0.0").is_ok());
        assert!(validate_ratio("-0.1").is_err());
        assert!(validate_ratio("1.1").is_err());
        assert!(validate_ratio("abc").is_err());
        assert!(validate_ratio("NaN").is_err());
    }

    #[test]
    fn test_crop_defaults() {
        let cli = Cli::try_parse_from([
            "carrier-prep",
            "detect-and-crop",
            "--images",
            "photos",
            "--model",
            "best.pt",
            "--out",
            "out",
        ])
        .unwrap();
        match cli.command {
            Command::DetectAndCrop(args) => {
                assert_eq!(args.conf, 0.25);
                assert_eq!(args.pad, 0.03);
                assert!(args.detector.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_convert_requires_classes() {
        assert!(Cli::try_parse_from(["carrier-prep", "convert", "--images", "a", "--out", "b"]).is_err());
    }

    #[test]
    fn test_init_profile_parses_text() {
        let cli = Cli::try_parse_from(["carrier-prep", "init-profile", "text"]).unwrap();
        match cli.command {
            Command::InitProfile(args) => {
                assert_eq!(args.profile, LabelProfile::Text);
                assert_eq!(args.out_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
