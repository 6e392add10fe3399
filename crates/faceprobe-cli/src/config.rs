use faceprobe_core::EngineSettings;
use std::path::PathBuf;

/// Engine configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the `detection/`, `recognition/` and `attributes/` ONNX weights.
    pub model_dir: PathBuf,
    /// ONNX Runtime intra-op threads per session.
    pub intra_threads: usize,
    /// Minimum detector score for a face to count.
    pub detection_threshold: f32,
}

impl Config {
    /// Load configuration from `FACEPROBE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let model_dir = var("FACEPROBE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_model_dir(&var));

        Self {
            model_dir,
            intra_threads: parse_or(&var, "FACEPROBE_INTRA_THREADS", 2),
            detection_threshold: parse_or(&var, "FACEPROBE_DETECTION_THRESHOLD", 0.5),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            model_dir: self.model_dir.clone(),
            intra_threads: self.intra_threads,
            detection_threshold: self.detection_threshold,
        }
    }
}

/// `$XDG_DATA_HOME/faceprobe/models`, falling back to `~/.local/share`.
fn default_model_dir(var: &impl Fn(&str) -> Option<String>) -> PathBuf {
    var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("faceprobe")
        .join("models")
}

fn parse_or<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    var(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}
