//! faceprobe-core — Face search, attribute analysis and verification engine.
//!
//! Faces are located by an SCRFD-contract detector, aligned with a
//! five-point similarity transform and embedded or classified by ONNX
//! models running on ONNX Runtime. The operations in [`ops`] work against
//! the [`FaceEngine`] trait, so other engines can be swapped in.

pub mod alignment;
pub mod attributes;
pub mod detector;
pub mod distance;
pub mod engine;
pub mod error;
pub mod image_io;
pub mod models;
pub mod ops;
pub mod recognizer;
pub mod types;

pub use attributes::{FaceAttributes, Prediction};
pub use engine::{EngineSettings, FaceEngine, OnnxEngine};
pub use error::EngineError;
pub use models::{Action, DetectorBackend, DistanceMetric, RecognitionModel};
pub use ops::{AnalyzeOptions, Match, MatchOptions, Verification};
pub use types::{BoundingBox, Embedding, FacialArea, RepresentedFace};
