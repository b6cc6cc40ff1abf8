pub mod report;

use crate::types::{ModelPaths, ReportConfig};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for orthoscan
#[derive(Parser, Debug)]
#[command(name = "orthoscan")]
#[command(about = "Orthodontic radiograph analysis and report generation")]
#[command(version)]
pub struct Cli {
    /// Directory holding uploads and reports for all cases
    #[arg(short, long, default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// Case identifier
    #[arg(short, long, default_value = "default", global = true)]
    pub case: String,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a radiograph for the case (name it after its slot, e.g. frontal.jpg)
    Upload {
        /// Image file to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Store under this key instead of the file name
        #[arg(long = "as", value_name = "KEY")]
        key: Option<String>,
    },

    /// Run detection on the uploaded images and generate the report
    Process(ProcessArgs),

    /// Write the latest report of the case to a file
    Report {
        /// Destination path
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Print the diagnosis for a list of finding labels
    Classify {
        /// Finding labels, e.g. "Class II" "Deep Bite"
        #[arg(value_name = "LABEL")]
        labels: Vec<String>,
    },
}

/// Options for report generation
#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Detector confidence threshold, between 0 and 1
    #[arg(long, default_value_t = crate::types::DEFAULT_CONFIDENCE, value_parser = parse_confidence)]
    pub confidence: f32,

    /// Frontal model (ONNX)
    #[arg(long, value_name = "PATH")]
    pub frontal_model: Option<PathBuf>,

    /// Lateral model (ONNX), shared by both lateral slots
    #[arg(long, value_name = "PATH")]
    pub lateral_model: Option<PathBuf>,

    /// Occlusal model (ONNX), shared by both occlusal slots
    #[arg(long, value_name = "PATH")]
    pub occlusal_model: Option<PathBuf>,

    /// TrueType font for overlay captions
    #[arg(long, value_name = "PATH")]
    pub font: Option<PathBuf>,
}

impl ProcessArgs {
    /// Report configuration for these options
    pub fn report_config(&self) -> ReportConfig {
        let config = ReportConfig::default().with_confidence_threshold(self.confidence);
        match &self.font {
            Some(font) => config.with_font_path(font),
            None => config,
        }
    }

    /// Model locations, with defaults for anything not given
    pub fn model_paths(&self) -> ModelPaths {
        let defaults = ModelPaths::default();
        ModelPaths {
            frontal: self.frontal_model.clone().unwrap_or(defaults.frontal),
            lateral: self.lateral_model.clone().unwrap_or(defaults.lateral),
            occlusal: self.occlusal_model.clone().unwrap_or(defaults.occlusal),
        }
    }
}

fn parse_confidence(value: &str) -> Result<f32, String> {
    let threshold: f32 = value
        .trim()
        .parse()
        .map_err(|e| format!("'{}' is not a number: {}", value, e))?;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(format!("'{}' is not between 0 and 1", value));
    }
    Ok(threshold)
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_process_defaults() {
        let cli = Cli::parse_from(["orthoscan", "process"]);
        assert_eq!(cli.case, "default");
        match cli.command {
            Command::Process(args) => {
                assert_eq!(args.confidence, 0.25);
                assert_eq!(args.model_paths(), ModelPaths::default());
                assert!(args.report_config().font_path.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_upload_with_key_and_global_flags() {
        let cli = Cli::parse_from([
            "orthoscan",
            "upload",
            "scan.jpg",
            "--as",
            "frontal.jpg",
            "--case",
            "p-12",
            "-v",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.case, "p-12");
        match cli.command {
            Command::Upload { file, key } => {
                assert_eq!(file, PathBuf::from("scan.jpg"));
                assert_eq!(key.as_deref(), Some("frontal.jpg"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_model_path_overrides() {
        let cli = Cli::parse_from(["orthoscan", "process", "--lateral-model", "lat.onnx"]);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        let paths = args.model_paths();
        assert_eq!(paths.lateral, PathBuf::from("lat.onnx"));
        assert_eq!(paths.frontal, ModelPaths::default().frontal);
    }

    #[test]
    fn test_confidence_must_be_a_probability() {
        for bad in ["NaN", "inf", "-0.1", "1.5", "high"] {
            assert!(
                Cli::try_parse_from(["orthoscan", "process", "--confidence", bad]).is_err(),
                "accepted {bad}"
            );
        }

        let cli = Cli::parse_from(["orthoscan", "process", "--confidence", "0.6"]);
        let Command::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.report_config().confidence_threshold, 0.6);
    }

    #[test]
    fn test_classify_labels() {
        let cli = Cli::parse_from(["orthoscan", "classify", "Class II", "Deep Bite"]);
        match cli.command {
            Command::Classify { labels } => assert_eq!(labels, vec!["Class II", "Deep Bite"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
