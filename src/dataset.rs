//! Run drivers: one pass over an image directory, one image at a time.

use log::{info, warn};
use std::path::PathBuf;

use crate::config::{ConvertArgs, CropArgs, OcrArgs};
use crate::conversion::{convert_annotation, format_label_file};
use crate::crop::extract_crops;
use crate::detector::Detector;
use crate::error::Result;
use crate::io::{
    copy_image, find_annotation_file, image_dimensions, list_images, open_image, require_dir,
    setup_crop_output_directories, setup_label_output_directories, write_crop, write_json,
    write_label_file, write_manifest,
};
use crate::ocr::{OcrEngine, OcrImageResult};
use crate::types::{ConversionStats, CropRecord, CropStats, ImageAnnotation};
use crate::utils::{create_progress_bar, file_name_string, file_stem_string, read_and_parse_json};
use crate::vocabulary::ClassVocabulary;

/// Convert LabelMe rectangles under `args.images` into a YOLO dataset.
///
/// The class file and input directory are checked before anything is
/// written. Images without an annotation file are counted as skipped and
/// get neither a label file nor an image copy.
pub fn convert_dataset(args: &ConvertArgs) -> Result<ConversionStats> {
    require_dir(&args.images, "images directory")?;
    let vocabulary = ClassVocabulary::load(&args.classes)?;
    let images = list_images(&args.images, args.ext.as_deref())?;
    info!(
        "Found {} images, {} classes.",
        images.len(),
        vocabulary.len()
    );

    let output_dirs = setup_label_output_directories(&args.out)?;
    let mut stats = ConversionStats::new(vocabulary.len());

    let pb = create_progress_bar(images.len() as u64, "Convert");
    for image_path in &images {
        pb.inc(1);

        let Some(json_path) = find_annotation_file(image_path) else {
            stats.skipped_no_annotation += 1;
            continue;
        };
        let Some(annotation) = read_and_parse_json::<ImageAnnotation>(&json_path) else {
            stats.skipped_bad_annotation += 1;
            continue;
        };
        let Some((width, height)) = image_dimensions(image_path) else {
            stats.skipped_bad_image += 1;
            continue;
        };

        let lines = convert_annotation(&annotation, &vocabulary, width, height);
        write_label_file(&output_dirs.labels_dir, image_path, &format_label_file(&lines))?;
        copy_image(&output_dirs.images_dir, image_path)?;

        stats.labels_written += lines.len();
        stats.converted += 1;
    }
    pb.finish_with_message("Conversion complete");

    Ok(stats)
}

/// Result of a detect-and-crop run.
#[derive(Debug)]
pub struct CropRun {
    pub stats: CropStats,
    pub manifest: Vec<CropRecord>,
    pub manifest_path: PathBuf,
}

/// Detect carriers in every image and write padded crops plus `crops.json`.
///
/// A detector error aborts the run; the manifest is only written once every
/// image has been processed.
pub fn detect_and_crop(args: &CropArgs, detector: &mut dyn Detector) -> Result<CropRun> {
    require_dir(&args.images, "images directory")?;
    let images = list_images(&args.images, None)?;
    let output_dirs = setup_crop_output_directories(&args.out)?;
    info!("Found {} images.", images.len());

    let mut stats = CropStats::default();
    let mut manifest = Vec::new();

    let pb = create_progress_bar(images.len() as u64, "Detect");
    for image_path in &images {
        pb.inc(1);
        stats.images_seen += 1;

        let Some(image) = open_image(image_path) else {
            stats.images_undecodable += 1;
            continue;
        };

        let detections = detector.detect(image_path, args.conf)?;
        if detections.is_empty() {
            continue;
        }
        stats.detections += detections.len();

        let crops = extract_crops(
            &image,
            &file_name_string(image_path),
            &file_stem_string(image_path),
            &detections,
            args.pad,
        );
        stats.rejected_boxes += detections.len() - crops.len();

        for crop in crops {
            write_crop(&output_dirs.crops_dir, &crop)?;
            manifest.push(crop.record);
        }
    }
    pb.finish_with_message("Detection complete");

    stats.crops = manifest.len();
    let manifest_path = write_manifest(&output_dirs, &manifest)?;
    info!("Saved: {}", manifest_path.display());

    Ok(CropRun {
        stats,
        manifest,
        manifest_path,
    })
}

/// Recognize text in every crop under `args.images` and write the results
/// as one JSON document to `args.out`.
pub fn run_ocr(args: &OcrArgs, engine: &mut dyn OcrEngine) -> Result<Vec<OcrImageResult>> {
    require_dir(&args.images, "images directory")?;
    let images = list_images(&args.images, None)?;

    let mut results = Vec::with_capacity(images.len());
    let pb = create_progress_bar(images.len() as u64, "OCR");
    for image_path in &images {
        pb.inc(1);
        // Full decode: a truncated file can still have a readable header.
        if open_image(image_path).is_none() {
            continue;
        }
        let lines = engine.recognize(image_path)?;
        results.push(OcrImageResult {
            image: file_name_string(image_path),
            lines,
        });
    }
    pb.finish_with_message("OCR complete");

    if results.len() < images.len() {
        warn!("{} images could not be decoded", images.len() - results.len());
    }
    write_json(&args.out, &results)?;
    info!("Wrote: {}", args.out.display());

    Ok(results)
}
