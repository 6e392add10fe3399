/// Engine defaults for an operation that compares embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub model: &'static str,
    pub detector: &'static str,
    pub metric: &'static str,
}

/// Engine defaults for attribute analysis, which takes no metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzePreset {
    pub model: &'static str,
    pub detector: &'static str,
}

pub const RECOGNIZE: Preset = Preset {
    model: "VGG-Face",
    detector: "opencv",
    metric: "cosine",
};

pub const ANALYZE: AnalyzePreset = AnalyzePreset {
    model: "Facenet",
    detector: "mtcnn",
};

pub const VERIFY: Preset = Preset {
    model: "ArcFace",
    detector: "dlib",
    metric: "cosine",
};

pub const DEFAULT_ACTIONS: [&str; 4] = ["age", "gender", "race", "emotion"];
