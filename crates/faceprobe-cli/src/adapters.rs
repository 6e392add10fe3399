//! Operation adapters: translate CLI parameters into engine calls and trim
//! the engine's results to the shapes the CLI prints.

use crate::output;
use faceprobe_core::ops::{self, AnalyzeOptions, Match, MatchOptions, Verification};
use faceprobe_core::{Action, DetectorBackend, DistanceMetric, EngineError, FaceEngine, RecognitionModel};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Parameters of a database search.
#[derive(Debug, Clone)]
pub struct RecognizeQuery {
    pub img: PathBuf,
    pub db: PathBuf,
    pub model: String,
    pub detector: String,
    pub metric: String,
    pub enforce_detection: bool,
}

/// Parameters of an attribute analysis.
#[derive(Debug, Clone)]
pub struct AnalyzeQuery {
    pub img: PathBuf,
    pub actions: Vec<String>,
    pub model: String,
    pub detector: String,
    pub enforce_detection: bool,
    pub out: Option<PathBuf>,
}

/// Parameters of a pairwise verification.
#[derive(Debug, Clone)]
pub struct VerifyQuery {
    pub img1: PathBuf,
    pub img2: PathBuf,
    pub model: String,
    pub detector: String,
    pub metric: String,
    pub enforce_detection: bool,
}

/// The three-field verdict printed by `verify`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub verified: bool,
    pub distance: f64,
    pub threshold: f64,
}

impl From<&Verification> for Verdict {
    fn from(v: &Verification) -> Self {
        Self {
            verified: v.verified,
            distance: v.distance,
            threshold: v.threshold,
        }
    }
}

fn match_options(
    model: &str,
    detector: &str,
    metric: &str,
    enforce_detection: bool,
) -> Result<MatchOptions, EngineError> {
    Ok(MatchOptions {
        model: model.parse::<RecognitionModel>()?,
        detector: detector.parse::<DetectorBackend>()?,
        metric: metric.parse::<DistanceMetric>()?,
        enforce_detection,
    })
}

/// Search the database folder for the query face, nearest matches first.
pub fn recognize_face(
    engine: &mut dyn FaceEngine,
    query: &RecognizeQuery,
) -> Result<Vec<Match>, EngineError> {
    let opts = match_options(&query.model, &query.detector, &query.metric, query.enforce_detection)?;
    tracing::debug!(img = %query.img.display(), db = %query.db.display(), ?opts, "recognize");
    ops::find(engine, &query.img, &query.db, &opts)
}

/// Predict the requested attributes of the most confident face.
///
/// With `out` set, the report is also written to that file.
pub fn analyze_face(
    engine: &mut dyn FaceEngine,
    query: &AnalyzeQuery,
) -> Result<Map<String, Value>, EngineError> {
    query.model.parse::<RecognitionModel>()?;
    let actions = Action::parse_list(&query.actions)?;
    let opts = AnalyzeOptions {
        detector: query.detector.parse()?,
        enforce_detection: query.enforce_detection,
    };
    tracing::debug!(img = %query.img.display(), ?actions, ?opts, "analyze");

    let faces = ops::analyze(engine, &query.img, &actions, &opts)?;
    let report = faces
        .first()
        .map(|face| face.report())
        .unwrap_or_default();

    if let Some(path) = &query.out {
        output::write_report(path, &report)?;
        tracing::info!(path = %path.display(), "analysis report written");
    }
    Ok(report)
}

/// Decide whether both images show the same person.
pub fn verify_faces(
    engine: &mut dyn FaceEngine,
    query: &VerifyQuery,
) -> Result<Verdict, EngineError> {
    let opts = match_options(&query.model, &query.detector, &query.metric, query.enforce_detection)?;
    tracing::debug!(img1 = %query.img1.display(), img2 = %query.img2.display(), ?opts, "verify");
    let verification = ops::verify(engine, &query.img1, &query.img2, &opts)?;
    Ok(Verdict::from(&verification))
}
