//! The face engine seam and its ONNX Runtime implementation.

use crate::attributes::{self, AttributeClassifier, FaceAttributes};
use crate::detector::{Detector, ScrfdDetector, SkipDetector};
use crate::error::EngineError;
use crate::image_io;
use crate::models::{Action, DetectorBackend, RecognitionModel};
use crate::recognizer::FaceRecognizer;
use crate::types::{BoundingBox, RepresentedFace};
use image::RgbImage;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Detection, embedding and attribute classification over image files.
///
/// Implementations decide how faces are found and represented; the
/// operations in [`crate::ops`] only depend on this trait.
pub trait FaceEngine {
    /// Detect every face in `image` and embed each with `model`.
    ///
    /// Faces are ordered by descending detection confidence. With `enforce`
    /// set, an image without faces is [`EngineError::NoFaceDetected`];
    /// otherwise the whole image is represented as one face.
    fn detect_and_embed(
        &mut self,
        image: &Path,
        model: RecognitionModel,
        detector: DetectorBackend,
        enforce: bool,
    ) -> Result<Vec<RepresentedFace>, EngineError>;

    /// Detect every face in `image` and predict `actions` for each.
    fn classify_attributes(
        &mut self,
        image: &Path,
        actions: &[Action],
        detector: DetectorBackend,
        enforce: bool,
    ) -> Result<Vec<FaceAttributes>, EngineError>;
}

/// Runtime settings of [`OnnxEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Root of the `detection/`, `recognition/` and `attributes/` weight folders.
    pub model_dir: PathBuf,
    pub intra_threads: usize,
    /// Minimum detector score for a face to be kept.
    pub detection_threshold: f32,
}

impl EngineSettings {
    pub fn detector_path(&self, backend: DetectorBackend) -> Option<PathBuf> {
        backend
            .model_file()
            .map(|file| self.model_dir.join("detection").join(file))
    }

    pub fn recognizer_path(&self, model: RecognitionModel) -> PathBuf {
        self.model_dir.join("recognition").join(model.spec().file)
    }

    pub fn classifier_path(&self, action: Action) -> PathBuf {
        self.model_dir.join("attributes").join(attributes::model_file(action))
    }
}

/// [`FaceEngine`] backed by ONNX models, loaded lazily on first use.
pub struct OnnxEngine {
    settings: EngineSettings,
    detectors: HashMap<DetectorBackend, Box<dyn Detector>>,
    recognizers: HashMap<RecognitionModel, FaceRecognizer>,
    classifiers: HashMap<Action, AttributeClassifier>,
}

impl OnnxEngine {
    pub fn new(settings: EngineSettings) -> Self {
        tracing::debug!(model_dir = %settings.model_dir.display(), "onnx engine created");
        Self {
            settings,
            detectors: HashMap::new(),
            recognizers: HashMap::new(),
            classifiers: HashMap::new(),
        }
    }

    fn detector(&mut self, backend: DetectorBackend) -> Result<&mut Box<dyn Detector>, EngineError> {
        match self.detectors.entry(backend) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let detector: Box<dyn Detector> = match self.settings.detector_path(backend) {
                    None => Box::new(SkipDetector),
                    Some(path) => Box::new(ScrfdDetector::load(
                        &path,
                        self.settings.intra_threads,
                        self.settings.detection_threshold,
                    )?),
                };
                Ok(e.insert(detector))
            }
        }
    }

    fn recognizer(&mut self, model: RecognitionModel) -> Result<&mut FaceRecognizer, EngineError> {
        match self.recognizers.entry(model) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let path = self.settings.recognizer_path(model);
                Ok(e.insert(FaceRecognizer::load(model, &path, self.settings.intra_threads)?))
            }
        }
    }

    fn classifier(&mut self, action: Action) -> Result<&mut AttributeClassifier, EngineError> {
        match self.classifiers.entry(action) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let path = self.settings.classifier_path(action);
                Ok(e.insert(AttributeClassifier::load(action, &path, self.settings.intra_threads)?))
            }
        }
    }

    fn load_and_detect(
        &mut self,
        image: &Path,
        backend: DetectorBackend,
        enforce: bool,
    ) -> Result<(RgbImage, Vec<BoundingBox>), EngineError> {
        let img = image_io::load_rgb(image)?;
        let detector = self.detector(backend)?;
        let faces = detect_faces(detector.as_mut(), &img, image, enforce)?;
        Ok((img, faces))
    }
}

impl FaceEngine for OnnxEngine {
    fn detect_and_embed(
        &mut self,
        image: &Path,
        model: RecognitionModel,
        detector: DetectorBackend,
        enforce: bool,
    ) -> Result<Vec<RepresentedFace>, EngineError> {
        let (img, faces) = self.load_and_detect(image, detector, enforce)?;
        let recognizer = self.recognizer(model)?;

        faces
            .iter()
            .map(|face| {
                Ok(RepresentedFace {
                    embedding: recognizer.extract(&img, face)?,
                    area: face.region(img.width(), img.height()),
                    confidence: face.confidence,
                })
            })
            .collect()
    }

    fn classify_attributes(
        &mut self,
        image: &Path,
        actions: &[Action],
        detector: DetectorBackend,
        enforce: bool,
    ) -> Result<Vec<FaceAttributes>, EngineError> {
        let (img, faces) = self.load_and_detect(image, detector, enforce)?;

        let mut results: Vec<FaceAttributes> = faces
            .iter()
            .map(|face| FaceAttributes {
                area: face.region(img.width(), img.height()),
                confidence: face.confidence,
                predictions: Vec::with_capacity(actions.len()),
            })
            .collect();

        for &action in actions {
            let classifier = self.classifier(action)?;
            for (face, result) in faces.iter().zip(results.iter_mut()) {
                result.predictions.push((action, classifier.classify(&img, face)?));
            }
        }

        Ok(results)
    }
}

/// Run `detector` on `img`, applying the detection-enforcement policy.
pub fn detect_faces(
    detector: &mut dyn Detector,
    img: &RgbImage,
    path: &Path,
    enforce: bool,
) -> Result<Vec<BoundingBox>, EngineError> {
    let faces = detector.detect(img)?;
    if !faces.is_empty() {
        return Ok(faces);
    }
    if enforce {
        return Err(EngineError::NoFaceDetected(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), "no face detected, using whole image");
    Ok(vec![BoundingBox::whole_image(img.width(), img.height())])
}
