//! Facial attribute classifiers: apparent age, gender, race and emotion.

use crate::alignment;
use crate::error::EngineError;
use crate::image_io;
use crate::models::Action;
use crate::types::{BoundingBox, FacialArea};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use serde_json::{json, Map, Value};
use std::path::Path;

pub const GENDER_LABELS: [&str; 2] = ["Woman", "Man"];
pub const RACE_LABELS: [&str; 6] = [
    "asian",
    "indian",
    "black",
    "white",
    "middle eastern",
    "latino hispanic",
];
pub const EMOTION_LABELS: [&str; 7] = [
    "angry", "disgust", "fear", "happy", "sad", "surprise", "neutral",
];
const AGE_BUCKETS: usize = 101;

/// Input contract of one attribute model.
struct ClassifierSpec {
    file: &'static str,
    size: u32,
    grayscale: bool,
    outputs: usize,
}

fn classifier_spec(action: Action) -> ClassifierSpec {
    match action {
        Action::Age => ClassifierSpec { file: "age_model.onnx", size: 224, grayscale: false, outputs: AGE_BUCKETS },
        Action::Gender => ClassifierSpec { file: "gender_model.onnx", size: 224, grayscale: false, outputs: GENDER_LABELS.len() },
        Action::Race => ClassifierSpec { file: "race_model.onnx", size: 224, grayscale: false, outputs: RACE_LABELS.len() },
        Action::Emotion => ClassifierSpec { file: "facial_expression_model.onnx", size: 48, grayscale: true, outputs: EMOTION_LABELS.len() },
    }
}

/// File name of the classifier weights for `action` under `<model_dir>/attributes/`.
pub fn model_file(action: Action) -> &'static str {
    classifier_spec(action).file
}

/// One attribute prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// Apparent age in years.
    Age(f64),
    /// Percentages per label, summing to ~100.
    Distribution(Vec<(&'static str, f64)>),
}

impl Prediction {
    /// Build the prediction for `action` from the classifier's raw probabilities.
    pub fn from_probabilities(action: Action, probs: &[f32]) -> Prediction {
        match action {
            Action::Age => Prediction::Age(
                probs.iter().enumerate().map(|(i, &p)| i as f64 * p as f64).sum(),
            ),
            Action::Gender => Prediction::Distribution(percentages(&GENDER_LABELS, probs)),
            Action::Race => Prediction::Distribution(percentages(&RACE_LABELS, probs)),
            Action::Emotion => Prediction::Distribution(percentages(&EMOTION_LABELS, probs)),
        }
    }

    /// Label with the highest score, if this is a distribution.
    pub fn dominant(&self) -> Option<&'static str> {
        match self {
            Prediction::Age(_) => None,
            Prediction::Distribution(scores) => scores
                .iter()
                .max_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(label, _)| *label),
        }
    }
}

fn percentages(labels: &[&'static str], probs: &[f32]) -> Vec<(&'static str, f64)> {
    let sum: f64 = probs.iter().map(|&p| p as f64).sum();
    let sum = if sum > 0.0 { sum } else { 1.0 };
    labels
        .iter()
        .zip(probs.iter())
        .map(|(label, &p)| (*label, 100.0 * p as f64 / sum))
        .collect()
}

/// Attribute predictions for one detected face.
#[derive(Debug, Clone)]
pub struct FaceAttributes {
    pub area: FacialArea,
    pub confidence: f32,
    pub predictions: Vec<(Action, Prediction)>,
}

impl FaceAttributes {
    /// JSON report holding only keys derived from the predicted actions.
    ///
    /// `age` is an integer; distributions become `{label: pct}` alongside
    /// `dominant_<action>`.
    pub fn report(&self) -> Map<String, Value> {
        let mut report = Map::new();
        for (action, prediction) in &self.predictions {
            match prediction {
                Prediction::Age(age) => {
                    report.insert(action.as_str().into(), json!(age.round() as i64));
                }
                Prediction::Distribution(scores) => {
                    let dist: Map<String, Value> = scores
                        .iter()
                        .map(|(label, pct)| (label.to_string(), json!(pct)))
                        .collect();
                    report.insert(action.as_str().into(), Value::Object(dist));
                    if let Some(dominant) = prediction.dominant() {
                        report.insert(format!("dominant_{action}"), json!(dominant));
                    }
                }
            }
        }
        report
    }
}

/// ONNX classifier for a single action.
pub struct AttributeClassifier {
    session: Session,
    action: Action,
}

impl AttributeClassifier {
    pub fn load(action: Action, model_path: &Path, intra_threads: usize) -> Result<Self, EngineError> {
        if !model_path.exists() {
            return Err(EngineError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(action = %action, path = %model_path.display(), "loaded attribute model");
        Ok(Self { session, action })
    }

    /// Predict this classifier's attribute for one face of `img`.
    pub fn classify(&mut self, img: &RgbImage, face: &BoundingBox) -> Result<Prediction, EngineError> {
        let spec = classifier_spec(self.action);
        let crop = alignment::face_crop(img, face, spec.size, spec.size);
        let input = preprocess(&crop, spec.grayscale);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EngineError::Inference(format!("{} classifier: {e}", self.action)))?;

        if probs.len() != spec.outputs {
            return Err(EngineError::Inference(format!(
                "{} classifier expected {} outputs, got {}",
                self.action,
                spec.outputs,
                probs.len()
            )));
        }

        Ok(Prediction::from_probabilities(self.action, probs))
    }
}

/// NHWC tensor scaled to [0, 1]; one channel for grayscale models.
fn preprocess(crop: &RgbImage, grayscale: bool) -> Array4<f32> {
    let (w, h) = (crop.width() as usize, crop.height() as usize);
    if grayscale {
        let gray = image_io::to_grayscale(crop);
        Array4::from_shape_fn((1, h, w, 1), |(_, y, x, _)| gray[y * w + x] as f32 / 255.0)
    } else {
        Array4::from_shape_fn((1, h, w, 3), |(_, y, x, c)| {
            crop.get_pixel(x as u32, y as u32).0[c] as f32 / 255.0
        })
    }
}
