use std::path::PathBuf;
use thiserror::Error;

/// Every way an engine operation can fail.
///
/// Callers at the CLI boundary treat all variants alike: the operation
/// degrades to an empty result and the message is reported on stderr.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model file not found: {0} — place the ONNX weights in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
    #[error("cannot read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(
        "face could not be detected in {0}; confirm that the picture is a face photo \
         or disable detection enforcement"
    )]
    NoFaceDetected(PathBuf),
    #[error("database path does not exist: {0}")]
    DatabaseNotFound(PathBuf),
    #[error("nothing is found in {0}")]
    EmptyDatabase(PathBuf),
    #[error("unsupported {kind}: {name}")]
    Unsupported { kind: &'static str, name: String },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn unsupported(kind: &'static str, name: &str) -> Self {
        EngineError::Unsupported {
            kind,
            name: name.to_string(),
        }
    }
}
