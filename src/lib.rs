//! Dataset preparation for a two-stage carrier → text-zone pipeline
//!
//! This library converts LabelMe rectangle annotations to YOLO labels and
//! turns detector output into padded, reproducibly named crops with a
//! manifest linking every crop back to its source image.

pub mod config;
pub mod conversion;
pub mod crop;
pub mod dataset;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod io;
pub mod ocr;
pub mod profiles;
pub mod types;
pub mod utils;
pub mod vocabulary;

// Re-export commonly used types and functions
pub use config::{Cli, Command, ConvertArgs, CropArgs, InitProfileArgs, OcrArgs};
pub use dataset::{convert_dataset, detect_and_crop, run_ocr, CropRun};
pub use detector::{detector_for, CommandDetector, Detector, PredictionsFileDetector};
pub use error::{PrepError, Result};
pub use geometry::{normalize, pad_and_clamp, to_canonical_box, CanonicalBox, NormalizedBox, PixelBox};
pub use ocr::{CommandOcrEngine, OcrEngine, OcrImageResult, OcrLine};
pub use profiles::{write_profile_files, LabelProfile};
pub use types::{ConversionStats, CropRecord, CropStats, Detection, ImageAnnotation, Shape};
pub use vocabulary::ClassVocabulary;
