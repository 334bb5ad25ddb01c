use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use ampere_core::{bill_label, FieldRecord, ProviderAliases};
use ampere_extract::{BillPipeline, GeminiGenerator};
use ampere_export::{coverage, write_csv, write_json_archive, BatchResult};

/// Extract structured billing data from scanned utility bills.
///
/// Each input is rendered, OCR'd and run through model-based structured
/// extraction; the batch ends up as a consolidated CSV plus an archive of
/// per-bill JSON files. A bill that fails any stage still produces its
/// row, so look for warnings instead of missing output.
#[derive(Debug, Parser)]
#[command(name = "ampere", version, after_help = r#"Environment variables:
  GEMINI_API_KEY    API key for the extraction model (required).
                    May be set in a standard `.env` file.
"#)]
struct Opts {
    /// Bill documents to process (PDF or image files), in batch order.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory receiving consolidated_bills.csv and all_bills_json.tar.gz.
    #[arg(long, default_value = "out")]
    output_dir: PathBuf,

    /// Generative model used for structured extraction.
    #[arg(long, default_value = "gemini-1.5-flash-001")]
    model: String,

    /// Language code passed to the OCR engine.
    #[arg(long, default_value = "eng")]
    lang: String,

    /// TOML file with extra [[alias]] provider-name families.
    #[arg(long)]
    provider_aliases: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    run(Opts::parse()).await
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let aliases = match &opts.provider_aliases {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read alias table {}", path.display()))?;
            ProviderAliases::from_toml(&content)?
        }
        None => ProviderAliases::default(),
    };

    let api_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY is not set (export it or put it in a .env file)")?;

    #[cfg(feature = "tesseract")]
    let recognizer =
        ampere_ocr::recognizer::tesseract_backend::TesseractRecognizer::new(None, &opts.lang);
    #[cfg(not(feature = "tesseract"))]
    let recognizer = ampere_ocr::CommandRecognizer::new(&opts.lang);

    let pipeline = BillPipeline::new(recognizer, GeminiGenerator::new(&opts.model, &api_key))
        .with_aliases(aliases);

    let total = opts.inputs.len();
    let mut batch = BatchResult::new();
    for (idx, path) in opts.inputs.iter().enumerate() {
        let sequence = idx + 1;
        info!("Processing {} ({sequence}/{total})", path.display());
        match fs::read(path) {
            Ok(bytes) => {
                let (record, diagnostics) = pipeline.process_document(&bytes, sequence).await;
                batch.push_document(record, diagnostics);
            }
            Err(e) => {
                // An unreadable input still gets its row, so batch output
                // stays one-to-one with the inputs.
                let mut record = FieldRecord::empty();
                record.set_bill_number(sequence);
                let diagnostic = format!(
                    "{}: could not read {}: {e}",
                    bill_label(sequence),
                    path.display()
                );
                batch.push_document(record, vec![diagnostic]);
            }
        }
    }

    fs::create_dir_all(&opts.output_dir).with_context(|| {
        format!("Failed to create output directory {}", opts.output_dir.display())
    })?;
    let csv_path = opts.output_dir.join("consolidated_bills.csv");
    write_csv(&batch.records, fs::File::create(&csv_path)?)?;
    let archive_path = opts.output_dir.join("all_bills_json.tar.gz");
    write_json_archive(&batch.records, fs::File::create(&archive_path)?)?;

    let summary = coverage(&batch.records);
    info!(
        "Processed {} bills: {}/{} fields extracted ({}% coverage)",
        batch.len(),
        summary.extracted_fields,
        summary.total_fields,
        summary.coverage_pct
    );
    info!("Wrote {}", csv_path.display());
    info!("Wrote {}", archive_path.display());

    for diagnostic in &batch.diagnostics {
        warn!("{diagnostic}");
    }

    Ok(())
}
