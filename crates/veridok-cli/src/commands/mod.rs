//! CLI subcommands and shared helpers.

pub mod batch;
pub mod config;
pub mod process;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use veridok_core::ocr::NeuralEngine;
use veridok_core::{
    DocumentKind, DocumentPipeline, DocumentType, EngineRegistry, RawDocument, TesseractEngine,
    VeridokConfig,
};

/// Document type selector shared by process and batch.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum DocTypeArg {
    /// KTP national identity card
    IdentityCard,
    /// Notarial corporate deed (akta)
    CorporateDeed,
    /// SIM driver license
    DriverLicense,
    /// Passport
    Passport,
    /// NPWP tax card
    TaxId,
    /// Kartu keluarga
    FamilyCard,
    /// Anything else
    Other,
}

impl From<DocTypeArg> for DocumentType {
    fn from(arg: DocTypeArg) -> Self {
        match arg {
            DocTypeArg::IdentityCard => DocumentType::IdentityCard,
            DocTypeArg::CorporateDeed => DocumentType::CorporateDeed,
            DocTypeArg::DriverLicense => DocumentType::DriverLicense,
            DocTypeArg::Passport => DocumentType::Passport,
            DocTypeArg::TaxId => DocumentType::TaxId,
            DocTypeArg::FamilyCard => DocumentType::FamilyCard,
            DocTypeArg::Other => DocumentType::Other,
        }
    }
}

pub fn load_config(path: Option<&str>) -> anyhow::Result<VeridokConfig> {
    match path {
        Some(path) => Ok(VeridokConfig::from_file(Path::new(path))?),
        None => Ok(VeridokConfig::default()),
    }
}

/// Build the pipeline with every engine available on this machine.
///
/// The neural engine is preferred when its model files exist; the
/// tesseract binary joins as a second opinion. At least one engine
/// must come up.
pub fn build_pipeline(
    config: VeridokConfig,
    model_dir: Option<&Path>,
) -> anyhow::Result<DocumentPipeline> {
    let mut registry = EngineRegistry::new();

    let mut models = config.models.clone();
    if let Some(dir) = model_dir {
        models.model_dir = dir.to_path_buf();
    }
    let det_model = models.model_dir.join(&models.detection_model);
    if det_model.exists() {
        match NeuralEngine::from_config(&models) {
            Ok(engine) => {
                debug!("loaded neural engine from {}", models.model_dir.display());
                registry.register(Arc::new(engine));
            }
            Err(e) => warn!("neural engine unavailable: {}", e),
        }
    } else {
        debug!("no model files at {}", models.model_dir.display());
    }

    if TesseractEngine::is_available() {
        registry.register(Arc::new(TesseractEngine::new()));
    } else {
        debug!("tesseract binary not found on PATH");
    }

    if registry.is_empty() {
        anyhow::bail!(
            "no OCR engine available: place model files in {} or install tesseract",
            models.model_dir.display()
        );
    }

    Ok(DocumentPipeline::new(registry, config)?)
}

/// Read a file into a [`RawDocument`], inferring the kind from its
/// extension.
pub fn load_document(path: &Path, doc_type: DocumentType) -> anyhow::Result<RawDocument> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let kind = match extension.as_str() {
        "pdf" => DocumentKind::Pdf,
        "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => DocumentKind::Image,
        _ => anyhow::bail!("Unsupported file format: {}", extension),
    };

    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    Ok(RawDocument::new(bytes, kind, doc_type, file_name))
}
