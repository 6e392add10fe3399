//! Embedding distances and the pretuned per-model decision thresholds.
//!
//! Accumulation happens in `f64`; distances and thresholds are reported as `f64`.

use crate::models::{DistanceMetric, RecognitionModel};
use crate::types::Embedding;

/// Cosine similarity in [-1, 1]. Higher = more similar; zero vectors give 0.
pub fn cosine_similarity(a: &Embedding, b: &Embedding) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.values.iter().zip(b.values.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 { dot / denom } else { 0.0 }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

fn widen(e: &Embedding) -> Vec<f64> {
    e.values.iter().map(|&v| v as f64).collect()
}

fn l2_normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

/// Distance between two embeddings under `metric`. Lower = more similar.
pub fn distance(a: &Embedding, b: &Embedding, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Cosine => 1.0 - cosine_similarity(a, b),
        DistanceMetric::Euclidean => euclidean(&widen(a), &widen(b)),
        DistanceMetric::EuclideanL2 => {
            euclidean(&l2_normalize(widen(a)), &l2_normalize(widen(b)))
        }
    }
}

/// Distance at or below which two faces of `model` count as the same identity.
pub fn threshold(model: RecognitionModel, metric: DistanceMetric) -> f64 {
    let (cosine, euclidean, euclidean_l2) = match model {
        RecognitionModel::VggFace => (0.68, 1.17, 1.17),
        RecognitionModel::Facenet => (0.40, 10.0, 0.80),
        RecognitionModel::Facenet512 => (0.30, 23.56, 1.04),
        RecognitionModel::ArcFace => (0.68, 4.15, 1.13),
        RecognitionModel::Dlib => (0.07, 0.6, 0.4),
        RecognitionModel::SFace => (0.593, 10.734, 1.055),
        RecognitionModel::OpenFace => (0.10, 0.55, 0.55),
        RecognitionModel::DeepId => (0.015, 45.0, 0.17),
        RecognitionModel::GhostFaceNet => (0.65, 35.71, 1.10),
    };
    match metric {
        DistanceMetric::Cosine => cosine,
        DistanceMetric::Euclidean => euclidean,
        DistanceMetric::EuclideanL2 => euclidean_l2,
    }
}

/// Outcome of comparing two embeddings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub distance: f64,
    pub threshold: f64,
    pub verified: bool,
}

/// Compare two embeddings of `model` under `metric` against the pretuned threshold.
pub fn compare_embeddings(
    a: &Embedding,
    b: &Embedding,
    model: RecognitionModel,
    metric: DistanceMetric,
) -> Comparison {
    let distance = distance(a, b, metric);
    let threshold = threshold(model, metric);
    Comparison {
        distance,
        threshold,
        verified: distance <= threshold,
    }
}
