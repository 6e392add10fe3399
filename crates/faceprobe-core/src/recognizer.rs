//! Face recognizers via ONNX Runtime.
//!
//! One [`FaceRecognizer`] drives any [`RecognitionModel`]: the model's
//! [`ModelSpec`] decides crop size, tensor layout and pixel normalization.

use crate::alignment;
use crate::error::EngineError;
use crate::models::{Layout, ModelSpec, RecognitionModel};
use crate::types::{BoundingBox, Embedding};
use image::RgbImage;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;

/// Embedding extractor for one recognition model.
pub struct FaceRecognizer {
    session: Session,
    model: RecognitionModel,
    spec: ModelSpec,
}

impl FaceRecognizer {
    /// Load the ONNX weights of `model` from `model_path`.
    pub fn load(
        model: RecognitionModel,
        model_path: &Path,
        intra_threads: usize,
    ) -> Result<Self, EngineError> {
        if !model_path.exists() {
            return Err(EngineError::ModelNotFound(model_path.display().to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;

        tracing::info!(
            model = %model,
            path = %model_path.display(),
            inputs = ?session.inputs().iter().map(|i| i.name()).collect::<Vec<_>>(),
            "loaded recognition model"
        );

        Ok(Self {
            session,
            model,
            spec: model.spec(),
        })
    }

    /// Extract an embedding for one detected face of `img`.
    ///
    /// Faces with landmarks are aligned; others are cropped from their box.
    pub fn extract(&mut self, img: &RgbImage, face: &BoundingBox) -> Result<Embedding, EngineError> {
        let crop = alignment::face_crop(img, face, self.spec.width, self.spec.height);
        let input = preprocess(&crop, &self.spec);

        let outputs = self
            .session
            .run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EngineError::Inference(format!("embedding extraction: {e}")))?;

        if raw.len() != self.spec.embedding_dim {
            return Err(EngineError::Inference(format!(
                "{} expected {}-dim embedding, got {}",
                self.model,
                self.spec.embedding_dim,
                raw.len()
            )));
        }

        Ok(Embedding { values: raw.to_vec() })
    }
}

/// Turn an RGB crop of the model's input size into a normalized input tensor.
pub(crate) fn preprocess(crop: &RgbImage, spec: &ModelSpec) -> Array4<f32> {
    let (h, w) = (spec.height as usize, spec.width as usize);
    let mut pixels: Vec<f32> = crop.as_raw().iter().map(|&p| p as f32).collect();
    spec.normalization.apply(&mut pixels);

    let mut tensor = match spec.layout {
        Layout::Nchw => Array4::<f32>::zeros((1, 3, h, w)),
        Layout::Nhwc => Array4::<f32>::zeros((1, h, w, 3)),
    };
    for y in 0..h {
        for x in 0..w {
            for c in 0..3 {
                let v = pixels.get((y * w + x) * 3 + c).copied().unwrap_or(0.0);
                match spec.layout {
                    Layout::Nchw => tensor[[0, c, y, x]] = v,
                    Layout::Nhwc => tensor[[0, y, x, c]] = v,
                }
            }
        }
    }
    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_preprocess_nchw_shape() {
        let spec = RecognitionModel::ArcFace.spec();
        let crop = RgbImage::from_pixel(spec.width, spec.height, Rgb([128, 128, 128]));
        let tensor = preprocess(&crop, &spec);
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_nhwc_shape_non_square() {
        let spec = RecognitionModel::DeepId.spec();
        let crop = RgbImage::from_pixel(spec.width, spec.height, Rgb([0, 0, 0]));
        let tensor = preprocess(&crop, &spec);
        assert_eq!(tensor.shape(), &[1, 55, 47, 3]);
    }

    #[test]
    fn test_preprocess_arcface_normalization() {
        let spec = RecognitionModel::ArcFace.spec();
        let crop = RgbImage::from_pixel(spec.width, spec.height, Rgb([255, 0, 128]));
        let tensor = preprocess(&crop, &spec);
        assert!((tensor[[0, 0, 5, 5]] - (255.0 - 127.5) / 128.0).abs() < 1e-6);
        assert!((tensor[[0, 1, 5, 5]] - (0.0 - 127.5) / 128.0).abs() < 1e-6);
        assert!((tensor[[0, 2, 5, 5]] - (128.0 - 127.5) / 128.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_nhwc_keeps_channel_order() {
        let spec = RecognitionModel::OpenFace.spec();
        let crop = RgbImage::from_pixel(spec.width, spec.height, Rgb([255, 0, 51]));
        let tensor = preprocess(&crop, &spec);
        assert!((tensor[[0, 3, 4, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 3, 4, 1]].abs() < 1e-6);
        assert!((tensor[[0, 3, 4, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_model() {
        let err = FaceRecognizer::load(
            RecognitionModel::Facenet,
            Path::new("/nonexistent/facenet128.onnx"),
            1,
        )
        .err()
        .unwrap();
        assert!(matches!(err, EngineError::ModelNotFound(_)));
    }
}
