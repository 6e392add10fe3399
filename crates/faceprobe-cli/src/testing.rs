//! In-memory [`FaceEngine`] for exercising the adapters and dispatcher.

use faceprobe_core::attributes::{EMOTION_LABELS, RACE_LABELS};
use faceprobe_core::{
    Action, DetectorBackend, Embedding, EngineError, FaceAttributes, FaceEngine, FacialArea,
    Prediction, RecognitionModel, RepresentedFace,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Returns canned embeddings per image path and fixed attribute predictions.
#[derive(Default)]
pub struct StubEngine {
    faces: HashMap<PathBuf, Vec<RepresentedFace>>,
}

impl StubEngine {
    /// Register one face with `values` as its embedding.
    pub fn face(mut self, path: &str, values: &[f32]) -> Self {
        self.faces.insert(
            PathBuf::from(path),
            vec![RepresentedFace {
                embedding: Embedding { values: values.to_vec() },
                area: FacialArea { x: 4, y: 4, w: 32, h: 32 },
                confidence: 0.99,
            }],
        );
        self
    }

    /// Register an image in which no face is found.
    pub fn faceless(mut self, path: &str) -> Self {
        self.faces.insert(PathBuf::from(path), Vec::new());
        self
    }
}

impl FaceEngine for StubEngine {
    fn detect_and_embed(
        &mut self,
        image: &Path,
        _model: RecognitionModel,
        _detector: DetectorBackend,
        enforce: bool,
    ) -> Result<Vec<RepresentedFace>, EngineError> {
        let faces = self
            .faces
            .get(image)
            .ok_or_else(|| EngineError::Inference(format!("unknown image {}", image.display())))?;
        match (faces.is_empty(), enforce) {
            (false, _) => Ok(faces.clone()),
            (true, true) => Err(EngineError::NoFaceDetected(image.to_path_buf())),
            (true, false) => Ok(vec![RepresentedFace {
                embedding: Embedding { values: vec![1.0, 1.0] },
                area: FacialArea { x: 0, y: 0, w: 64, h: 64 },
                confidence: 0.0,
            }]),
        }
    }

    fn classify_attributes(
        &mut self,
        _image: &Path,
        actions: &[Action],
        _detector: DetectorBackend,
        _enforce: bool,
    ) -> Result<Vec<FaceAttributes>, EngineError> {
        let predictions = actions
            .iter()
            .map(|&action| {
                let prediction = match action {
                    Action::Age => Prediction::Age(31.0),
                    Action::Gender => Prediction::from_probabilities(action, &[0.2, 0.8]),
                    Action::Race => Prediction::from_probabilities(action, &[1.0; RACE_LABELS.len()]),
                    Action::Emotion => {
                        let mut probs = [0.0; EMOTION_LABELS.len()];
                        probs[3] = 1.0;
                        Prediction::from_probabilities(action, &probs)
                    }
                };
                (action, prediction)
            })
            .collect();
        Ok(vec![FaceAttributes {
            area: FacialArea { x: 4, y: 4, w: 32, h: 32 },
            confidence: 0.99,
            predictions,
        }])
    }
}
