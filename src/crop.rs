//! Turning detections into padded crops and manifest records.

use image::{DynamicImage, GenericImageView};
use log::debug;

use crate::geometry::pad_and_clamp;
use crate::types::{CropRecord, Detection};

/// Directory, relative to the output root, that holds the crop files.
pub const CROPS_DIR: &str = "crops";

/// A crop ready to be written, together with its manifest record.
pub struct Crop {
    pub file_name: String,
    pub image: DynamicImage,
    pub record: CropRecord,
}

/// File name of the `index`-th detection of an image.
///
/// Stable across runs for unchanged input; unique within one source image
/// because the index is.
pub fn crop_file_name(source_stem: &str, index: usize, class_id: i64, confidence: f64) -> String {
    format!(
        "{}__{:03}__cls{}__{:.2}.png",
        source_stem, index, class_id, confidence
    )
}

/// Cut one crop per accepted detection out of `image`.
///
/// Detections are taken in the order given and indexed from 0; a detection
/// whose box collapses after clamping keeps its index but yields no crop.
/// Confidence is not filtered here.
pub fn extract_crops(
    image: &DynamicImage,
    source_name: &str,
    source_stem: &str,
    detections: &[Detection],
    pad_ratio: f64,
) -> Vec<Crop> {
    let (width, height) = image.dimensions();
    let mut crops = Vec::with_capacity(detections.len());

    for (index, detection) in detections.iter().enumerate() {
        let padded = detection
            .canonical_box()
            .and_then(|bbox| pad_and_clamp(&bbox, width, height, pad_ratio));
        let Some(bbox) = padded else {
            debug!(
                "{}: rejected detection {} with box {:?}",
                source_name, index, detection.box_xyxy
            );
            continue;
        };

        let file_name = crop_file_name(source_stem, index, detection.class_id, detection.confidence);
        let pixels = image.crop_imm(bbox.x1, bbox.y1, bbox.width(), bbox.height());

        crops.push(Crop {
            record: CropRecord {
                image: source_name.to_string(),
                crop: format!("{}/{}", CROPS_DIR, file_name),
                bbox_xyxy: bbox,
                class_id: detection.class_id,
                conf: detection.confidence,
                image_size: [width, height],
            },
            image: pixels,
            file_name,
        });
    }

    crops
}
