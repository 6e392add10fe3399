use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use faceprobe_core::{EngineError, FaceEngine, OnnxEngine};
use serde::Serialize;
use serde_json::{json, Value};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod adapters;
mod config;
mod output;
mod presets;
#[cfg(test)]
mod testing;

use adapters::{AnalyzeQuery, RecognizeQuery, VerifyQuery};
use config::Config;

#[derive(Parser)]
#[command(name = "faceprobe", version, about = "Face search, attribute analysis and verification")]
struct Cli {
    /// Directory holding the ONNX model weights (overrides FACEPROBE_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find database images showing the same person as the query image
    Recognize {
        /// Query image
        #[arg(long)]
        img: PathBuf,
        /// Folder of database images, searched recursively
        #[arg(long)]
        db: PathBuf,
        #[arg(long, default_value = presets::RECOGNIZE.model)]
        model: String,
        #[arg(long, default_value = presets::RECOGNIZE.detector)]
        backend: String,
        /// Fall back to the whole image when no face is detected
        #[arg(long = "no-enforce", action = ArgAction::SetFalse)]
        enforce_detection: bool,
    },
    /// Predict age, gender, race and emotion of the face in an image
    Analyze {
        #[arg(long)]
        img: PathBuf,
        /// Attributes to predict (age, gender, race, emotion)
        #[arg(
            long,
            num_args = 1..,
            value_delimiter = ',',
            default_values = presets::DEFAULT_ACTIONS
        )]
        actions: Vec<String>,
        #[arg(long, default_value = presets::ANALYZE.model)]
        model: String,
        #[arg(long, default_value = presets::ANALYZE.detector)]
        backend: String,
        /// Fall back to the whole image when no face is detected
        #[arg(long = "no-enforce", action = ArgAction::SetFalse)]
        enforce_detection: bool,
        /// Also write the report to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Decide whether two images show the same person
    Verify {
        #[arg(long)]
        img1: PathBuf,
        #[arg(long)]
        img2: PathBuf,
        #[arg(long, default_value = presets::VERIFY.model)]
        model: String,
        #[arg(long, default_value = presets::VERIFY.metric)]
        metric: String,
        #[arg(long, default_value = presets::VERIFY.detector)]
        backend: String,
        /// Fall back to the whole image when no face is detected
        #[arg(long = "no-enforce", action = ArgAction::SetFalse)]
        enforce_detection: bool,
    },
}

/// Run one operation. Engine failures degrade to the operation's empty
/// result with a one-line diagnostic on `diag`.
fn dispatch(command: &Command, engine: &mut dyn FaceEngine, diag: &mut dyn Write) -> Result<Value> {
    match command {
        Command::Recognize { img, db, model, backend, enforce_detection } => {
            let query = RecognizeQuery {
                img: img.clone(),
                db: db.clone(),
                model: model.clone(),
                detector: backend.clone(),
                metric: presets::RECOGNIZE.metric.to_string(),
                enforce_detection: *enforce_detection,
            };
            degrade(adapters::recognize_face(engine, &query), "Recognition", json!([]), diag)
        }
        Command::Analyze { img, actions, model, backend, enforce_detection, out } => {
            let query = AnalyzeQuery {
                img: img.clone(),
                actions: actions.clone(),
                model: model.clone(),
                detector: backend.clone(),
                enforce_detection: *enforce_detection,
                out: out.clone(),
            };
            degrade(adapters::analyze_face(engine, &query), "Analysis", json!({}), diag)
        }
        Command::Verify { img1, img2, model, metric, backend, enforce_detection } => {
            let query = VerifyQuery {
                img1: img1.clone(),
                img2: img2.clone(),
                model: model.clone(),
                detector: backend.clone(),
                metric: metric.clone(),
                enforce_detection: *enforce_detection,
            };
            degrade(adapters::verify_faces(engine, &query), "Verification", json!({}), diag)
        }
    }
}

fn degrade<T: Serialize>(
    result: Result<T, EngineError>,
    operation: &str,
    empty: Value,
    diag: &mut dyn Write,
) -> Result<Value> {
    match result {
        Ok(value) => Ok(serde_json::to_value(value)?),
        Err(err) => {
            tracing::debug!(error = ?err, "{operation} failed");
            writeln!(diag, "[ERROR] {operation} failed: {err}")?;
            Ok(empty)
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    tracing::debug!(?config, "configuration loaded");

    let mut engine = OnnxEngine::new(config.engine_settings());
    let result = dispatch(&cli.command, &mut engine, &mut std::io::stderr())?;

    let mut stdout = std::io::stdout().lock();
    output::write_json(&mut stdout, &result, output::STDOUT_INDENT)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
