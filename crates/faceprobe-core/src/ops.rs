//! High-level operations: database search, attribute analysis and pairwise
//! verification, written against any [`FaceEngine`].

use crate::attributes::FaceAttributes;
use crate::distance::{self, Comparison};
use crate::engine::FaceEngine;
use crate::error::EngineError;
use crate::image_io;
use crate::models::{Action, DetectorBackend, DistanceMetric, RecognitionModel};
use crate::types::{FacialArea, RepresentedFace};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;

/// Engine configuration shared by `find` and `verify`.
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    pub model: RecognitionModel,
    pub detector: DetectorBackend,
    pub metric: DistanceMetric,
    pub enforce_detection: bool,
}

/// Engine configuration for `analyze`.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub detector: DetectorBackend,
    pub enforce_detection: bool,
}

/// A database face within the decision threshold of the query face.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    /// Path of the database image.
    pub identity: String,
    pub distance: f64,
    pub threshold: f64,
    pub target_x: u32,
    pub target_y: u32,
    pub target_w: u32,
    pub target_h: u32,
    pub source_x: u32,
    pub source_y: u32,
    pub source_w: u32,
    pub source_h: u32,
}

impl Match {
    fn new(identity: &Path, cmp: Comparison, target: FacialArea, source: FacialArea) -> Self {
        Self {
            identity: identity.display().to_string(),
            distance: cmp.distance,
            threshold: cmp.threshold,
            target_x: target.x,
            target_y: target.y,
            target_w: target.w,
            target_h: target.h,
            source_x: source.x,
            source_y: source.y,
            source_w: source.w,
            source_h: source.h,
        }
    }
}

/// Search `db_dir` for faces matching the most confident face of `image`.
///
/// Every `.jpg`/`.jpeg`/`.png` under `db_dir` (recursively) is represented;
/// images that cannot be read or have no detectable face are skipped.
/// Returns matches within the model's threshold, nearest first.
pub fn find(
    engine: &mut dyn FaceEngine,
    image: &Path,
    db_dir: &Path,
    opts: &MatchOptions,
) -> Result<Vec<Match>, EngineError> {
    let candidates = image_io::collect_images(db_dir)?;
    if candidates.is_empty() {
        return Err(EngineError::EmptyDatabase(db_dir.to_path_buf()));
    }

    let query = primary_face(
        engine.detect_and_embed(image, opts.model, opts.detector, opts.enforce_detection)?,
        image,
    )?;

    let mut matches = Vec::new();
    for candidate in &candidates {
        let faces = match engine.detect_and_embed(
            candidate,
            opts.model,
            opts.detector,
            opts.enforce_detection,
        ) {
            Ok(faces) => faces,
            Err(err @ (EngineError::NoFaceDetected(_) | EngineError::Image { .. })) => {
                tracing::warn!(path = %candidate.display(), error = %err, "skipping database image");
                continue;
            }
            Err(err) => return Err(err),
        };

        for face in faces {
            let cmp = distance::compare_embeddings(
                &query.embedding,
                &face.embedding,
                opts.model,
                opts.metric,
            );
            if cmp.verified {
                matches.push(Match::new(candidate, cmp, face.area, query.area));
            }
        }
    }

    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    tracing::info!(
        database = %db_dir.display(),
        candidates = candidates.len(),
        matches = matches.len(),
        "find finished"
    );
    Ok(matches)
}

/// Predict `actions` for every face of `image`, most confident face first.
pub fn analyze(
    engine: &mut dyn FaceEngine,
    image: &Path,
    actions: &[Action],
    opts: &AnalyzeOptions,
) -> Result<Vec<FaceAttributes>, EngineError> {
    if actions.is_empty() {
        return Err(EngineError::unsupported("action list", "(empty)"));
    }

    let mut faces =
        engine.classify_attributes(image, actions, opts.detector, opts.enforce_detection)?;
    if faces.is_empty() {
        return Err(EngineError::NoFaceDetected(image.to_path_buf()));
    }
    faces.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    tracing::info!(faces = faces.len(), ?actions, "analyze finished");
    Ok(faces)
}

/// Face regions used for a verification, one per input image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacialAreas {
    pub img1: FacialArea,
    pub img2: FacialArea,
}

/// Full outcome of a pairwise verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verification {
    pub verified: bool,
    pub distance: f64,
    pub threshold: f64,
    pub model: String,
    pub detector_backend: String,
    pub similarity_metric: String,
    pub facial_areas: FacialAreas,
    /// Wall-clock seconds spent.
    pub time: f64,
}

/// Decide whether `img1` and `img2` show the same person.
///
/// All detected faces of both images are compared and the closest pair decides.
pub fn verify(
    engine: &mut dyn FaceEngine,
    img1: &Path,
    img2: &Path,
    opts: &MatchOptions,
) -> Result<Verification, EngineError> {
    let started = Instant::now();

    let faces1 = engine.detect_and_embed(img1, opts.model, opts.detector, opts.enforce_detection)?;
    let faces2 = engine.detect_and_embed(img2, opts.model, opts.detector, opts.enforce_detection)?;

    let mut best: Option<(Comparison, FacialArea, FacialArea)> = None;
    for a in &faces1 {
        for b in &faces2 {
            let cmp = distance::compare_embeddings(&a.embedding, &b.embedding, opts.model, opts.metric);
            if best.as_ref().map_or(true, |(prev, _, _)| cmp.distance < prev.distance) {
                best = Some((cmp, a.area, b.area));
            }
        }
    }

    let (cmp, area1, area2) = match best {
        Some(best) => best,
        None if faces1.is_empty() => return Err(EngineError::NoFaceDetected(img1.to_path_buf())),
        None => return Err(EngineError::NoFaceDetected(img2.to_path_buf())),
    };

    let elapsed = started.elapsed().as_secs_f64();
    tracing::info!(
        distance = cmp.distance,
        threshold = cmp.threshold,
        verified = cmp.verified,
        "verify finished"
    );

    Ok(Verification {
        verified: cmp.verified,
        distance: cmp.distance,
        threshold: cmp.threshold,
        model: opts.model.to_string(),
        detector_backend: opts.detector.to_string(),
        similarity_metric: opts.metric.to_string(),
        facial_areas: FacialAreas { img1: area1, img2: area2 },
        time: (elapsed * 100.0).round() / 100.0,
    })
}

fn primary_face(faces: Vec<RepresentedFace>, image: &Path) -> Result<RepresentedFace, EngineError> {
    faces
        .into_iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
        .ok_or_else(|| EngineError::NoFaceDetected(image.to_path_buf()))
}
