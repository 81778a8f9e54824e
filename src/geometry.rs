//! Box geometry shared by the label converter and the crop extractor.
//!
//! Everything here is a pure function over value types so it can be tested
//! without touching the file system.

use serde::{Deserialize, Serialize};

/// Axis-aligned box in pixel coordinates of a source image.
///
/// Always satisfies `x1 < x2` and `y1 < y2`; the only way to build one is
/// through [`CanonicalBox::new`] or [`to_canonical_box`], which reject
/// degenerate input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl CanonicalBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Option<Self> {
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2 })
    }
}

/// Integer pixel box produced by [`pad_and_clamp`].
///
/// Contained in `[0, width-1] x [0, height-1]` of its image and never
/// degenerate. Serializes as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct PixelBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelBox {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }
}

impl From<[u32; 4]> for PixelBox {
    fn from([x1, y1, x2, y2]: [u32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<PixelBox> for [u32; 4] {
    fn from(b: PixelBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// YOLO center/size box, each field relative to the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedBox {
    pub x_center: f64,
    pub y_center: f64,
    pub width: f64,
    pub height: f64,
}

/// Bounding box of an unordered point set.
///
/// Needs at least two points. Corners may be listed in any order; a result
/// with zero width or height is rejected.
pub fn to_canonical_box(points: &[(f64, f64)]) -> Option<CanonicalBox> {
    if points.len() < 2 {
        return None;
    }

    let (x_min, y_min, x_max, y_max) = points.iter().fold(
        (f64::MAX, f64::MAX, f64::MIN, f64::MIN),
        |(x_min, y_min, x_max, y_max), &(x, y)| {
            (x_min.min(x), y_min.min(y), x_max.max(x), y_max.max(y))
        },
    );

    CanonicalBox::new(x_min, y_min, x_max, y_max)
}

/// YOLO-style normalization. Values are not clamped, so a box that already
/// exceeds the image produces values outside `[0, 1]`.
///
/// Returns `None` when either dimension is zero.
pub fn normalize(bbox: &CanonicalBox, image_width: u32, image_height: u32) -> Option<NormalizedBox> {
    if image_width == 0 || image_height == 0 {
        return None;
    }
    let w = image_width as f64;
    let h = image_height as f64;

    Some(NormalizedBox {
        x_center: (bbox.x1 + bbox.x2) / 2.0 / w,
        y_center: (bbox.y1 + bbox.y2) / 2.0 / h,
        width: (bbox.x2 - bbox.x1) / w,
        height: (bbox.y2 - bbox.y1) / h,
    })
}

/// Grow a box by `pad_ratio * max(width, height)` pixels on every side and
/// clamp it to the image.
///
/// Coordinates are truncated toward zero before padding, matching the crop
/// names and manifests produced by earlier runs.
pub fn pad_and_clamp(
    bbox: &CanonicalBox,
    image_width: u32,
    image_height: u32,
    pad_ratio: f64,
) -> Option<PixelBox> {
    if image_width == 0 || image_height == 0 {
        return None;
    }
    let pad = (pad_ratio * image_width.max(image_height) as f64) as i64;
    let max_x = image_width as i64 - 1;
    let max_y = image_height as i64 - 1;

    // `as i64` saturates for huge coordinates; the padding must too.
    let x1 = (bbox.x1 as i64).saturating_sub(pad).clamp(0, max_x);
    let y1 = (bbox.y1 as i64).saturating_sub(pad).clamp(0, max_y);
    let x2 = (bbox.x2 as i64).saturating_add(pad).clamp(0, max_x);
    let y2 = (bbox.y2 as i64).saturating_add(pad).clamp(0, max_y);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some(PixelBox {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}
