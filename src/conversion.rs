use log::debug;
use std::fmt;

use crate::geometry::{normalize, to_canonical_box, NormalizedBox};
use crate::types::{ImageAnnotation, Shape};
use crate::vocabulary::ClassVocabulary;

/// One row of a YOLO label file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLine {
    pub class_id: usize,
    pub bbox: NormalizedBox,
}

impl fmt::Display for LabelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.bbox.x_center, self.bbox.y_center, self.bbox.width, self.bbox.height
        )
    }
}

/// Convert a single shape, or `None` when the shape does not produce a line.
pub fn convert_shape(
    shape: &Shape,
    vocabulary: &ClassVocabulary,
    image_width: u32,
    image_height: u32,
) -> Option<LabelLine> {
    if shape.kind() != "rectangle" {
        debug!("Ignoring {} shape", shape.kind());
        return None;
    }

    let label = shape.label.as_deref()?;
    let class_id = match vocabulary.id_of(label) {
        Some(id) => id,
        None => {
            debug!("Ignoring shape with label '{}' not in vocabulary", label);
            return None;
        }
    };

    let bbox = match to_canonical_box(&shape.points) {
        Some(bbox) => bbox,
        None => {
            debug!("Ignoring degenerate '{}' rectangle {:?}", label, shape.points);
            return None;
        }
    };

    let bbox = normalize(&bbox, image_width, image_height)?;
    Some(LabelLine { class_id, bbox })
}

/// Convert every shape of an annotation, keeping input order.
pub fn convert_annotation(
    annotation: &ImageAnnotation,
    vocabulary: &ClassVocabulary,
    image_width: u32,
    image_height: u32,
) -> Vec<LabelLine> {
    annotation
        .shapes
        .iter()
        .filter_map(|shape| convert_shape(shape, vocabulary, image_width, image_height))
        .collect()
}

/// Label file contents: one line per box, trailing newline only when
/// there is at least one line.
pub fn format_label_file(lines: &[LabelLine]) -> String {
    let mut yolo_data = String::with_capacity(lines.len() * 48);
    for line in lines {
        yolo_data.push_str(&line.to_string());
        yolo_data.push('\n');
    }
    yolo_data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(label: &str, points: &[(f64, f64)]) -> Shape {
        Shape {
            label: Some(label.to_string()),
            points: points.to_vec(),
            shape_type: Some("rectangle".to_string()),
            ..Shape::default()
        }
    }

    fn vocab() -> ClassVocabulary {
        ClassVocabulary::new(["signboard", "product_label"]).unwrap()
    }

    #[test]
    fn test_reversed_corners_reference_line() {
        let shape = rect("signboard", &[(900.0, 400.0), (100.0, 50.0)]);
        let line = convert_shape(&shape, &vocab(), 1000, 500).unwrap();
        assert_eq!(line.to_string(), "0 0.500000 0.450000 0.800000 0.700000");
    }

    #[test]
    fn test_unknown_label_is_dropped() {
        let shape = rect("text_line", &[(0.0, 0.0), (10.0, 10.0)]);
        assert!(convert_shape(&shape, &vocab(), 100, 100).is_none());

        let mut unlabeled = rect("", &[(0.0, 0.0), (10.0, 10.0)]);
        unlabeled.label = None;
        assert!(convert_shape(&unlabeled, &vocab(), 100, 100).is_none());
    }

    #[test]
    fn test_non_rectangle_is_dropped() {
        let mut shape = rect("signboard", &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        shape.shape_type = Some("polygon".to_string());
        assert!(convert_shape(&shape, &vocab(), 100, 100).is_none());
    }

    #[test]
    fn test_missing_shape_type_counts_as_rectangle() {
        let mut shape = rect("product_label", &[(10.0, 10.0), (20.0, 20.0)]);
        shape.shape_type = None;
        let line = convert_shape(&shape, &vocab(), 100, 100).unwrap();
        assert_eq!(line.to_string(), "1 0.150000 0.150000 0.100000 0.100000");
    }

    #[test]
    fn test_annotation_keeps_order_and_duplicates() {
        let annotation = ImageAnnotation {
            shapes: vec![
                rect("product_label", &[(0.0, 0.0), (50.0, 50.0)]),
                rect("signboard", &[(10.0, 10.0), (10.0, 90.0)]),
                rect("signboard", &[(50.0, 50.0), (100.0, 100.0)]),
                rect("product_label", &[(0.0, 0.0), (50.0, 50.0)]),
            ],
            ..ImageAnnotation::default()
        };
        let lines = convert_annotation(&annotation, &vocab(), 100, 100);
        assert_eq!(
            format_label_file(&lines),
            "1 0.250000 0.250000 0.500000 0.500000\n\
             0 0.750000 0.750000 0.500000 0.500000\n\
             1 0.250000 0.250000 0.500000 0.500000\n"
        );
    }

    #[test]
    fn test_empty_label_file_has_no_newline() {
        assert_eq!(format_label_file(&[]), "");
    }
}
