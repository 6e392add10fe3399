//! Identifiers for recognition models, detector backends, distance metrics
//! and analysis actions, plus the per-model input contract.
//!
//! All identifiers parse from the names users type on the command line
//! (`VGG-Face`, `opencv`, `cosine`, `age`, ...).

use crate::error::EngineError;
use std::fmt;
use std::str::FromStr;

/// Tensor memory layout expected by a model's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `[N, C, H, W]` (PyTorch / insightface exports).
    Nchw,
    /// `[N, H, W, C]` (Keras exports).
    Nhwc,
}

/// Pixel normalization applied before inference. Input pixels are RGB in `[0, 255]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// Raw pixel values.
    None,
    /// Scale to `[0, 1]`.
    ZeroOne,
    /// Per-image standardization: `(x - mean) / std` over the whole crop.
    Standardize,
    /// Subtract per-channel means given in RGB order.
    ChannelMeans([f32; 3]),
    /// `(x - 127.5) / 128.0`.
    ArcFace,
}

impl Normalization {
    /// Normalize an interleaved RGB buffer in place.
    pub fn apply(&self, pixels: &mut [f32]) {
        match self {
            Normalization::None => {}
            Normalization::ZeroOne => pixels.iter_mut().for_each(|p| *p /= 255.0),
            Normalization::Standardize => {
                if pixels.is_empty() {
                    return;
                }
                let n = pixels.len() as f32;
                let mean = pixels.iter().sum::<f32>() / n;
                let var = pixels.iter().map(|p| (p - mean).powi(2)).sum::<f32>() / n;
                let std = var.sqrt().max(1.0 / n.sqrt());
                pixels.iter_mut().for_each(|p| *p = (*p - mean) / std);
            }
            Normalization::ChannelMeans(means) => {
                for (i, p) in pixels.iter_mut().enumerate() {
                    *p -= means[i % 3];
                }
            }
            Normalization::ArcFace => pixels.iter_mut().for_each(|p| *p = (*p - 127.5) / 128.0),
        }
    }
}

/// Input contract of one recognition model.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    /// File name under `<model_dir>/recognition/`.
    pub file: &'static str,
    /// Input height in pixels.
    pub height: u32,
    /// Input width in pixels.
    pub width: u32,
    pub layout: Layout,
    pub normalization: Normalization,
    pub embedding_dim: usize,
}

/// Face recognition (embedding) models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecognitionModel {
    VggFace,
    Facenet,
    Facenet512,
    ArcFace,
    SFace,
    GhostFaceNet,
    Dlib,
    OpenFace,
    DeepId,
}

impl RecognitionModel {
    pub const ALL: [RecognitionModel; 9] = [
        RecognitionModel::VggFace,
        RecognitionModel::Facenet,
        RecognitionModel::Facenet512,
        RecognitionModel::ArcFace,
        RecognitionModel::SFace,
        RecognitionModel::GhostFaceNet,
        RecognitionModel::Dlib,
        RecognitionModel::OpenFace,
        RecognitionModel::DeepId,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionModel::VggFace => "VGG-Face",
            RecognitionModel::Facenet => "Facenet",
            RecognitionModel::Facenet512 => "Facenet512",
            RecognitionModel::ArcFace => "ArcFace",
            RecognitionModel::SFace => "SFace",
            RecognitionModel::GhostFaceNet => "GhostFaceNet",
            RecognitionModel::Dlib => "Dlib",
            RecognitionModel::OpenFace => "OpenFace",
            RecognitionModel::DeepId => "DeepID",
        }
    }

    pub fn spec(&self) -> ModelSpec {
        use Layout::*;
        use Normalization::*;
        let (file, height, width, layout, normalization, embedding_dim) = match self {
            RecognitionModel::VggFace => (
                "vgg_face.onnx", 224, 224, Nhwc,
                ChannelMeans([129.1863, 104.7624, 93.5940]), 4096,
            ),
            RecognitionModel::Facenet => ("facenet128.onnx", 160, 160, Nhwc, Standardize, 128),
            RecognitionModel::Facenet512 => ("facenet512.onnx", 160, 160, Nhwc, Standardize, 512),
            RecognitionModel::ArcFace => ("arcface.onnx", 112, 112, Nchw, ArcFace, 512),
            RecognitionModel::SFace => ("sface.onnx", 112, 112, Nchw, None, 128),
            RecognitionModel::GhostFaceNet => ("ghostfacenet.onnx", 112, 112, Nhwc, ArcFace, 512),
            RecognitionModel::Dlib => ("dlib_resnet.onnx", 150, 150, Nhwc, ZeroOne, 128),
            RecognitionModel::OpenFace => ("openface.onnx", 96, 96, Nhwc, ZeroOne, 128),
            RecognitionModel::DeepId => ("deepid.onnx", 55, 47, Nhwc, ZeroOne, 160),
        };
        ModelSpec { file, height, width, layout, normalization, embedding_dim }
    }
}

impl FromStr for RecognitionModel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecognitionModel::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::unsupported("model", s))
    }
}

impl fmt::Display for RecognitionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Face detector backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectorBackend {
    Opencv,
    Ssd,
    Dlib,
    Mtcnn,
    RetinaFace,
    Scrfd,
    Yunet,
    CenterFace,
    /// Treat the whole image as the face region.
    Skip,
}

impl DetectorBackend {
    pub const ALL: [DetectorBackend; 9] = [
        DetectorBackend::Opencv,
        DetectorBackend::Ssd,
        DetectorBackend::Dlib,
        DetectorBackend::Mtcnn,
        DetectorBackend::RetinaFace,
        DetectorBackend::Scrfd,
        DetectorBackend::Yunet,
        DetectorBackend::CenterFace,
        DetectorBackend::Skip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorBackend::Opencv => "opencv",
            DetectorBackend::Ssd => "ssd",
            DetectorBackend::Dlib => "dlib",
            DetectorBackend::Mtcnn => "mtcnn",
            DetectorBackend::RetinaFace => "retinaface",
            DetectorBackend::Scrfd => "scrfd",
            DetectorBackend::Yunet => "yunet",
            DetectorBackend::CenterFace => "centerface",
            DetectorBackend::Skip => "skip",
        }
    }

    /// File name under `<model_dir>/detection/`, or `None` for [`DetectorBackend::Skip`].
    pub fn model_file(&self) -> Option<String> {
        match self {
            DetectorBackend::Skip => None,
            DetectorBackend::RetinaFace | DetectorBackend::Scrfd => Some("det_10g.onnx".into()),
            other => Some(format!("{}.onnx", other.as_str())),
        }
    }
}

impl FromStr for DetectorBackend {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DetectorBackend::ALL
            .iter()
            .copied()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| EngineError::unsupported("detector backend", s))
    }
}

impl fmt::Display for DetectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dissimilarity functions between two embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMetric {
    Cosine,
    Euclidean,
    EuclideanL2,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::EuclideanL2 => "euclidean_l2",
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "euclidean_l2" => Ok(DistanceMetric::EuclideanL2),
            _ => Err(EngineError::unsupported("distance metric", s)),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facial attributes that `analyze` can predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Age,
    Gender,
    Race,
    Emotion,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Age, Action::Gender, Action::Race, Action::Emotion];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Age => "age",
            Action::Gender => "gender",
            Action::Race => "race",
            Action::Emotion => "emotion",
        }
    }

    /// Parse a list of action names, dropping duplicates but keeping first-seen order.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Action>, EngineError> {
        let mut actions = Vec::with_capacity(names.len());
        for name in names {
            let action: Action = name.as_ref().parse()?;
            if !actions.contains(&action) {
                actions.push(action);
            }
        }
        Ok(actions)
    }
}

impl FromStr for Action {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .iter()
            .copied()
            .find(|a| a.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| EngineError::unsupported("action", s))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_names_roundtrip() {
        for model in RecognitionModel::ALL {
            assert_eq!(model.as_str().parse::<RecognitionModel>().unwrap(), model);
        }
    }

    #[test]
    fn test_model_parse_is_case_insensitive() {
        assert_eq!("vgg-face".parse::<RecognitionModel>().unwrap(), RecognitionModel::VggFace);
        assert_eq!("arcface".parse::<RecognitionModel>().unwrap(), RecognitionModel::ArcFace);
    }

    #[test]
    fn test_unknown_model_is_unsupported() {
        let err = "Resnet9000".parse::<RecognitionModel>().unwrap_err();
        assert!(matches!(err, EngineError::Unsupported { kind: "model", .. }));
    }

    #[test]
    fn test_backend_model_files() {
        assert_eq!(DetectorBackend::Skip.model_file(), None);
        assert_eq!(DetectorBackend::RetinaFace.model_file().as_deref(), Some("det_10g.onnx"));
        assert_eq!(DetectorBackend::Mtcnn.model_file().as_deref(), Some("mtcnn.onnx"));
    }

    #[test]
    fn test_metric_parse() {
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!("euclidean_l2".parse::<DistanceMetric>().unwrap(), DistanceMetric::EuclideanL2);
        assert!("manhattan".parse::<DistanceMetric>().is_err());
    }

    #[test]
    fn test_action_list_dedups_in_order() {
        let actions = Action::parse_list(&["emotion", "age", "emotion"]).unwrap();
        assert_eq!(actions, vec![Action::Emotion, Action::Age]);
    }

    #[test]
    fn test_action_list_rejects_unknown() {
        assert!(Action::parse_list(&["age", "height"]).is_err());
    }

    #[test]
    fn test_zero_one_normalization() {
        let mut px = vec![0.0, 127.5, 255.0];
        Normalization::ZeroOne.apply(&mut px);
        assert_eq!(px, vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_channel_means_cycle_rgb() {
        let mut px = vec![10.0, 20.0, 30.0, 10.0, 20.0, 30.0];
        Normalization::ChannelMeans([1.0, 2.0, 3.0]).apply(&mut px);
        assert_eq!(px, vec![9.0, 18.0, 27.0, 9.0, 18.0, 27.0]);
    }

    #[test]
    fn test_standardize_zero_mean() {
        let mut px = vec![0.0, 100.0, 200.0, 50.0];
        Normalization::Standardize.apply(&mut px);
        let mean = px.iter().sum::<f32>() / px.len() as f32;
        assert!(mean.abs() < 1e-5);
    }
}
