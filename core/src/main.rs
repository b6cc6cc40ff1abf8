use clap::Parser;
use log::{error, info, warn};
use orthoscan_core::cli::{Cli, Command, OutputFormat, ProcessArgs};
use orthoscan_core::{
    classify, AnatomicalSlot, DirectoryImageStore, DirectoryReportStore, FindingSet,
    ImageStore, ModelRegistry, OrthoscanError, PdfRenderer, ReportConfig, ReportId,
    ReportPipeline, ReportService, ReportStore, Result, TextReport,
};
use orthoscan_core::intake::{canonical_key, DEFAULT_UPLOAD_DIR};
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    let id = match ReportId::new(&cli.case) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Upload { file, key } => upload(&cli.workspace, &id, &file, key),
        Command::Process(args) => process_case(&cli.workspace, &id, &args, &cli.format),
        Command::Report { output } => write_report(&cli.workspace, &id, &output),
        Command::Classify { labels } => print_classification(labels, &cli.format),
    };

    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn upload_dir(workspace: &Path, id: &ReportId) -> PathBuf {
    workspace.join(id.as_str()).join(DEFAULT_UPLOAD_DIR)
}

fn upload(workspace: &Path, id: &ReportId, file: &Path, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    let key = canonical_key(&key)?;
    if AnatomicalSlot::from_key(&key).is_none() {
        warn!(
            "'{}' does not name a slot ({}); it will not appear in reports",
            key,
            AnatomicalSlot::ALL.map(|s| s.as_str()).join(", ")
        );
    }

    let bytes = std::fs::read(file)?;
    let mut store = DirectoryImageStore::new(upload_dir(workspace, id), &ReportConfig::default());
    store.store(&key, &bytes)?;

    println!("File uploaded successfully: {}", key);
    Ok(())
}

fn process_case(
    workspace: &Path,
    id: &ReportId,
    args: &ProcessArgs,
    format: &OutputFormat,
) -> Result<()> {
    let config = args.report_config();
    let models = load_models(args)?;
    info!("Loaded {} detection models", models.len());

    let mut service = ReportService::new(
        id.clone(),
        DirectoryImageStore::new(upload_dir(workspace, id), &config),
        DirectoryReportStore::new(workspace, &config),
        ReportPipeline::new(&models, &config),
        PdfRenderer::default(),
    );
    let outcome = service.process()?;

    match format {
        OutputFormat::Text => println!("{}", TextReport::new(&outcome)),
        OutputFormat::Json => print_json(&outcome)?,
    }
    Ok(())
}

#[cfg(feature = "onnx")]
fn load_models(args: &ProcessArgs) -> Result<ModelRegistry> {
    ModelRegistry::load_onnx(&args.model_paths())
}

#[cfg(not(feature = "onnx"))]
fn load_models(_args: &ProcessArgs) -> Result<ModelRegistry> {
    Err(OrthoscanError::ModelLoad(
        "ONNX detection requires the 'onnx' feature; rebuild with: cargo build --features onnx"
            .to_string(),
    ))
}

fn write_report(workspace: &Path, id: &ReportId, output: &Path) -> Result<()> {
    let store = DirectoryReportStore::new(workspace, &ReportConfig::default());
    match store.fetch(id)? {
        Some(bytes) => {
            std::fs::write(output, &bytes)?;
            println!("Report written to {}", output.display());
            Ok(())
        }
        None => Err(OrthoscanError::InvalidValue(format!(
            "Report not found for case '{}'",
            id
        ))),
    }
}

fn print_classification(labels: Vec<String>, format: &OutputFormat) -> Result<()> {
    let findings: FindingSet = labels.into_iter().collect();
    let diagnosis = classify(&findings);
    match format {
        OutputFormat::Text => println!("{}", diagnosis),
        OutputFormat::Json => print_json(&diagnosis)?,
    }
    Ok(())
}

#[cfg(feature = "json")]
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(not(feature = "json"))]
fn print_json<T>(_value: &T) -> Result<()> {
    Err(OrthoscanError::InvalidValue(
        "JSON output requires the 'json' feature; rebuild with: cargo build --features json"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upload_then_missing_report() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("scan.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let id = ReportId::new("c1").unwrap();

        upload(temp_dir.path(), &id, &source, Some("Upper_Occlusal.jpg".to_string())).unwrap();

        let stored = upload_dir(temp_dir.path(), &id).join("upper_occlusal.jpg");
        assert_eq!(std::fs::read(stored).unwrap(), b"jpeg bytes");

        let output = temp_dir.path().join("out.pdf");
        assert!(write_report(temp_dir.path(), &id, &output).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn test_write_report_copies_latest() {
        let temp_dir = TempDir::new().unwrap();
        let id = ReportId::new("c2").unwrap();
        let mut store = DirectoryReportStore::new(temp_dir.path(), &ReportConfig::default());
        store.save(&id, b"%PDF-1.3 test").unwrap();

        let output = temp_dir.path().join("copy.pdf");
        write_report(temp_dir.path(), &id, &output).unwrap();
        assert_eq!(std::fs::read(output).unwrap(), b"%PDF-1.3 test");
    }
}
