//! Face detectors.
//!
//! Every model-backed backend runs through the SCRFD decoder: 3-stride
//! anchor-free decoding with five-point landmarks and NMS post-processing.
//! Backend weights must be exported with the SCRFD output contract
//! (score/bbox/kps per stride 8, 16, 32).

use crate::error::EngineError;
use crate::types::BoundingBox;
use image::imageops::FilterType;
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

const SCRFD_INPUT_SIZE: usize = 640;
const SCRFD_MEAN: f32 = 127.5;
const SCRFD_STD: f32 = 128.0;
const SCRFD_NMS_THRESHOLD: f32 = 0.4;
const SCRFD_STRIDES: [usize; 3] = [8, 16, 32];
const SCRFD_ANCHORS_PER_CELL: usize = 2;

/// A face detector backend.
pub trait Detector {
    /// Detect faces, returning bounding boxes sorted by descending confidence.
    fn detect(&mut self, img: &RgbImage) -> Result<Vec<BoundingBox>, EngineError>;
}

/// Backend that reports the whole image as a single face.
pub struct SkipDetector;

impl Detector for SkipDetector {
    fn detect(&mut self, img: &RgbImage) -> Result<Vec<BoundingBox>, EngineError> {
        Ok(vec![BoundingBox::whole_image(img.width(), img.height())])
    }
}

/// Metadata for coordinate de-mapping after letterbox resize.
struct LetterboxInfo {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

/// Output tensor indices for one stride: (score_idx, bbox_idx, kps_idx).
type StrideOutputIndices = (usize, usize, usize);

/// SCRFD-based face detector.
pub struct ScrfdDetector {
    session: Session,
    input_size: usize,
    confidence_threshold: f32,
    /// Per-stride output indices [(score, bbox, kps)] for strides [8, 16, 32].
    stride_indices: [StrideOutputIndices; 3],
}

impl ScrfdDetector {
    /// Load an SCRFD-contract ONNX model from the given path.
    pub fn load(
        model_path: &Path,
        intra_threads: usize,
        confidence_threshold: f32,
    ) -> Result<Self, EngineError> {
        if !model_path.exists() {
            return Err(EngineError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = %model_path.display(),
            outputs = ?output_names,
            "loaded detector model"
        );

        if output_names.len() < 9 {
            return Err(EngineError::Inference(format!(
                "detector model requires 9 outputs (3 strides × score/bbox/kps), got {}",
                output_names.len()
            )));
        }

        let stride_indices = discover_output_indices(&output_names);
        tracing::debug!(?stride_indices, "detector output tensor mapping");

        Ok(Self {
            session,
            input_size: SCRFD_INPUT_SIZE,
            confidence_threshold,
            stride_indices,
        })
    }

    /// Letterbox an RGB image into a normalized NCHW tensor.
    fn preprocess(&self, img: &RgbImage) -> (Array4<f32>, LetterboxInfo) {
        let size = self.input_size;
        let (width, height) = (img.width() as f32, img.height() as f32);
        let scale = (size as f32 / width).min(size as f32 / height);

        let new_w = ((width * scale).round() as u32).clamp(1, size as u32);
        let new_h = ((height * scale).round() as u32).clamp(1, size as u32);
        let pad_x = (size as u32 - new_w) / 2;
        let pad_y = (size as u32 - new_h) / 2;

        let resized = image::imageops::resize(img, new_w, new_h, FilterType::Triangle);

        // Padding is SCRFD_MEAN, which normalizes to 0.0
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        for (x, y, px) in resized.enumerate_pixels() {
            let (tx, ty) = ((x + pad_x) as usize, (y + pad_y) as usize);
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = (px.0[c] as f32 - SCRFD_MEAN) / SCRFD_STD;
            }
        }

        let letterbox = LetterboxInfo {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        };
        (tensor, letterbox)
    }
}

impl Detector for ScrfdDetector {
    fn detect(&mut self, img: &RgbImage) -> Result<Vec<BoundingBox>, EngineError> {
        let (input, letterbox) = self.preprocess(img);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let mut all_detections = Vec::new();

        for (stride_pos, &stride) in SCRFD_STRIDES.iter().enumerate() {
            let (score_idx, bbox_idx, kps_idx) = self.stride_indices[stride_pos];

            let (_, scores) = outputs[score_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| EngineError::Inference(format!("scores stride {stride}: {e}")))?;
            let (_, bboxes) = outputs[bbox_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| EngineError::Inference(format!("bboxes stride {stride}: {e}")))?;
            let (_, kps) = outputs[kps_idx]
                .try_extract_tensor::<f32>()
                .map_err(|e| EngineError::Inference(format!("kps stride {stride}: {e}")))?;

            all_detections.extend(decode_stride(
                scores,
                bboxes,
                kps,
                stride,
                self.input_size,
                &letterbox,
                self.confidence_threshold,
            ));
        }

        let result = nms(all_detections, SCRFD_NMS_THRESHOLD);
        tracing::debug!(faces = result.len(), "detection finished");
        Ok(result)
    }
}

/// Discover output tensor ordering by name.
///
/// Named exports ("score_8", "bbox_16", ...) are mapped to stride slots.
/// Otherwise falls back to the standard positional ordering:
///   [0-2] = scores (strides 8, 16, 32)
///   [3-5] = bboxes (strides 8, 16, 32)
///   [6-8] = kps    (strides 8, 16, 32)
fn discover_output_indices(names: &[String]) -> [StrideOutputIndices; 3] {
    let find = |prefix: &str, stride: usize| -> Option<usize> {
        let target = format!("{prefix}_{stride}");
        names.iter().position(|n| n == &target)
    };

    let named: Option<Vec<StrideOutputIndices>> = SCRFD_STRIDES
        .iter()
        .map(|&stride| Some((find("score", stride)?, find("bbox", stride)?, find("kps", stride)?)))
        .collect();

    match named {
        Some(indices) => [indices[0], indices[1], indices[2]],
        None => {
            tracing::debug!(?names, "output names not recognized, using positional mapping");
            [(0, 3, 6), (1, 4, 7), (2, 5, 8)]
        }
    }
}

/// Decode detections for a single stride level.
fn decode_stride(
    scores: &[f32],
    bboxes: &[f32],
    kps: &[f32],
    stride: usize,
    input_size: usize,
    letterbox: &LetterboxInfo,
    threshold: f32,
) -> Vec<BoundingBox> {
    let grid = input_size / stride;
    let num_anchors = grid * grid * SCRFD_ANCHORS_PER_CELL;
    let s = stride as f32;
    let unmap = |x: f32, y: f32| {
        (
            (x - letterbox.pad_x) / letterbox.scale,
            (y - letterbox.pad_y) / letterbox.scale,
        )
    };

    let mut detections = Vec::new();

    for idx in 0..num_anchors {
        let score = scores.get(idx).copied().unwrap_or(0.0);
        if score <= threshold {
            continue;
        }

        let anchor_idx = idx / SCRFD_ANCHORS_PER_CELL;
        let anchor_cx = (anchor_idx % grid) as f32 * s;
        let anchor_cy = (anchor_idx / grid) as f32 * s;

        let bbox_off = idx * 4;
        if bbox_off + 3 >= bboxes.len() {
            continue;
        }
        let (x1, y1) = unmap(anchor_cx - bboxes[bbox_off] * s, anchor_cy - bboxes[bbox_off + 1] * s);
        let (x2, y2) = unmap(anchor_cx + bboxes[bbox_off + 2] * s, anchor_cy + bboxes[bbox_off + 3] * s);

        let kps_off = idx * 10;
        let landmarks = if kps_off + 9 < kps.len() {
            Some(std::array::from_fn(|i| {
                unmap(
                    anchor_cx + kps[kps_off + i * 2] * s,
                    anchor_cy + kps[kps_off + i * 2 + 1] * s,
                )
            }))
        } else {
            None
        };

        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence: score,
            landmarks,
        });
    }

    detections
}

/// Non-Maximum Suppression: remove overlapping detections.
///
/// Output is sorted by descending confidence.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<BoundingBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(k, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Compute Intersection-over-Union between two bounding boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter_area = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union_area = a.width * a.height + b.width * b.height - inter_area;

    if union_area > 0.0 {
        inter_area / union_area
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bbox(x: f32, y: f32, w: f32, h: f32, conf: f32) -> BoundingBox {
        BoundingBox {
            x, y, width: w, height: h, confidence: conf, landmarks: None,
        }
    }

    #[test]
    fn test_iou_identical() {
        let a = make_bbox(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = make_bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_bbox(20.0, 20.0, 10.0, 10.0, 1.0);
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial() {
        let a = make_bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_bbox(5.0, 0.0, 10.0, 10.0, 1.0);
        // Overlap: 5x10 = 50, union: 100+100-50 = 150
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let detections = vec![
            make_bbox(5.0, 5.0, 100.0, 100.0, 0.8),
            make_bbox(0.0, 0.0, 100.0, 100.0, 0.9),
            make_bbox(200.0, 200.0, 50.0, 50.0, 0.7),
        ];
        let result = nms(detections, 0.4);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_nms_empty() {
        assert!(nms(vec![], 0.4).is_empty());
    }

    #[test]
    fn test_skip_detector_returns_whole_image() {
        let img = RgbImage::new(30, 20);
        let faces = SkipDetector.detect(&img).unwrap();
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0].width, 30.0);
        assert_eq!(faces[0].height, 20.0);
        assert!(faces[0].landmarks.is_none());
    }

    #[test]
    fn test_discover_output_indices_shuffled_named() {
        let names: Vec<String> = [
            "bbox_8", "kps_8", "score_8",
            "bbox_16", "kps_16", "score_16",
            "bbox_32", "kps_32", "score_32",
        ].iter().map(|s| s.to_string()).collect();

        let indices = discover_output_indices(&names);
        assert_eq!(indices, [(2, 0, 1), (5, 3, 4), (8, 6, 7)]);
    }

    #[test]
    fn test_discover_output_indices_positional_fallback() {
        let names: Vec<String> = (0..9).map(|i: usize| i.to_string()).collect();
        assert_eq!(discover_output_indices(&names), [(0, 3, 6), (1, 4, 7), (2, 5, 8)]);
    }

    #[test]
    fn test_decode_stride_maps_through_letterbox() {
        // One anchor at grid cell (1, 0) for stride 32 on a 64px input.
        let letterbox = LetterboxInfo { scale: 2.0, pad_x: 0.0, pad_y: 0.0 };
        let scores = vec![0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut bboxes = vec![0.0; 8 * 4];
        bboxes[8..12].copy_from_slice(&[0.5, 0.5, 0.5, 0.5]);
        let kps = vec![0.0; 8 * 10];

        let dets = decode_stride(&scores, &bboxes, &kps, 32, 64, &letterbox, 0.5);
        assert_eq!(dets.len(), 1);
        // anchor (32, 0) ± 16 → [16, -16, 48, 16] in input space, halved.
        assert!((dets[0].x - 8.0).abs() < 1e-5);
        assert!((dets[0].y + 8.0).abs() < 1e-5);
        assert!((dets[0].width - 16.0).abs() < 1e-5);
        let lms = dets[0].landmarks.unwrap();
        assert!((lms[0].0 - 16.0).abs() < 1e-5);
    }
}
