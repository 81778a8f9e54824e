use serde::{Deserialize, Serialize};

use crate::geometry::{CanonicalBox, PixelBox};

// Image extensions picked up from an input directory
pub const IMG_FORMATS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Returns true when `ext` (without the dot) is one of [`IMG_FORMATS`], ignoring case.
pub fn is_image_extension(ext: &str) -> bool {
    IMG_FORMATS.iter().any(|known| known.eq_ignore_ascii_case(ext))
}

// A shape drawn in LabelMe
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Shape {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub points: Vec<(f64, f64)>,
    #[serde(default)]
    pub shape_type: Option<String>,
}

impl Shape {
    /// LabelMe omits `shape_type` for rectangles in older files.
    pub fn kind(&self) -> &str {
        match self.shape_type.as_deref() {
            Some(kind) if !kind.is_empty() => kind,
            _ => "rectangle",
        }
    }
}

// The LabelMe annotation file of one image. Everything but `shapes` is
// ignored; image dimensions are always read from the image itself.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ImageAnnotation {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

/// One box reported by the detection model, in pixel coordinates of the
/// original image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Detection {
    pub box_xyxy: [f64; 4],
    pub class_id: i64,
    pub confidence: f64,
}

impl Detection {
    pub fn canonical_box(&self) -> Option<CanonicalBox> {
        let [x1, y1, x2, y2] = self.box_xyxy;
        crate::geometry::to_canonical_box(&[(x1, y1), (x2, y2)])
    }
}

/// Manifest entry linking a crop file back to its source image.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CropRecord {
    pub image: String,
    pub crop: String,
    pub bbox_xyxy: PixelBox,
    pub class_id: i64,
    pub conf: f64,
    pub image_size: [u32; 2],
}

// Counters for a label-conversion run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConversionStats {
    pub converted: usize,
    pub skipped_no_annotation: usize,
    pub skipped_bad_annotation: usize,
    pub skipped_bad_image: usize,
    pub labels_written: usize,
    pub classes: usize,
}

impl ConversionStats {
    pub fn new(classes: usize) -> Self {
        Self {
            classes,
            ..Self::default()
        }
    }

    pub fn skipped(&self) -> usize {
        self.skipped_no_annotation + self.skipped_bad_annotation + self.skipped_bad_image
    }

    pub fn print_summary(&self) {
        log::info!("Converted: {}", self.converted);
        log::info!("Skipped (no json): {}", self.skipped_no_annotation);
        if self.skipped_bad_annotation > 0 {
            log::warn!("Skipped (unreadable json): {}", self.skipped_bad_annotation);
        }
        if self.skipped_bad_image > 0 {
            log::warn!("Skipped (undecodable image): {}", self.skipped_bad_image);
        }
        log::info!("Label lines: {}", self.labels_written);
        log::info!("Classes: {}", self.classes);
    }
}

// Counters for a detect-and-crop run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CropStats {
    pub images_seen: usize,
    pub images_undecodable: usize,
    pub detections: usize,
    pub rejected_boxes: usize,
    pub crops: usize,
}

impl CropStats {
    pub fn print_summary(&self) {
        log::info!("Images: {}", self.images_seen);
        if self.images_undecodable > 0 {
            log::warn!("Skipped (undecodable image): {}", self.images_undecodable);
        }
        log::info!("Detections: {}", self.detections);
        if self.rejected_boxes > 0 {
            log::warn!("Rejected boxes after clamping: {}", self.rejected_boxes);
        }
        log::info!("Crops: {}", self.crops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_kind_defaults_to_rectangle() {
        let shape: Shape = serde_json::from_str(r#"{"label": "a", "points": [[1, 2], [3, 4]]}"#).unwrap();
        assert_eq!(shape.kind(), "rectangle");

        let shape: Shape =
            serde_json::from_str(r#"{"label": "a", "points": [], "shape_type": null}"#).unwrap();
        assert_eq!(shape.kind(), "rectangle");

        let shape: Shape =
            serde_json::from_str(r#"{"label": "a", "points": [], "shape_type": "polygon"}"#).unwrap();
        assert_eq!(shape.kind(), "polygon");
    }

    #[test]
    fn test_annotation_tolerates_labelme_extras() {
        let json = r#"{
            "version": "5.4.1",
            "flags": {},
            "shapes": [{
                "label": "signboard",
                "points": [[900.0, 400.0], [100.0, 50.0]],
                "group_id": null,
                "description": "",
                "shape_type": "rectangle",
                "flags": {},
                "mask": null
            }],
            "imagePath": "a.jpg",
            "imageData": null,
            "imageHeight": 500,
            "imageWidth": 1000
        }"#;
        let annotation: ImageAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.shapes.len(), 1);
        assert_eq!(annotation.shapes[0].label.as_deref(), Some("signboard"));
        assert_eq!(annotation.shapes[0].points[1], (100.0, 50.0));
    }

    #[test]
    fn test_annotation_ignores_unexpected_metadata_types() {
        let json = r#"{
            "version": 5,
            "flags": {"x": null},
            "shapes": [{
                "label": "signboard",
                "points": [[10, 20], [30, 40]],
                "group_id": "g1",
                "description": null,
                "shape_type": "rectangle"
            }],
            "imagePath": null,
            "imageHeight": 500.0,
            "imageWidth": 1000.0
        }"#;
        let annotation: ImageAnnotation = serde_json::from_str(json).unwrap();
        assert_eq!(annotation.shapes.len(), 1);
        assert_eq!(annotation.shapes[0].kind(), "rectangle");
        assert_eq!(annotation.shapes[0].points, vec![(10.0, 20.0), (30.0, 40.0)]);
    }

    #[test]
    fn test_image_extension_check_ignores_case() {
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("json"));
        assert!(!is_image_extension("tiff"));
    }

    #[test]
    fn test_crop_record_field_names() {
        let record = CropRecord {
            image: "a.jpg".to_string(),
            crop: "crops/a__000__cls0__0.91.png".to_string(),
            bbox_xyxy: PixelBox::from([1, 2, 30, 40]),
            class_id: 0,
            conf: 0.91,
            image_size: [100, 50],
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "image": "a.jpg",
                "crop": "crops/a__000__cls0__0.91.png",
                "bbox_xyxy": [1, 2, 30, 40],
                "class_id": 0,
                "conf": 0.91,
                "image_size": [100, 50]
            })
        );
    }
}
