//! Code implementing the "risk analyze" sub command.

pub mod aggregate;
pub mod annotate;
pub mod classify;
pub mod matcher;
pub mod parser;
pub mod schema;

use std::io::Write;
use std::path::Path;
use std::time::Instant;

use clap::{command, Parser};

use crate::genes::{known_pathogenic_defaults, GeneRegionTable};
use crate::risk::annotate::{provider_for_mode, AnnotationMode, AnnotationProvider};
use crate::risk::schema::AnalysisResult;

/// Errors that propagate out of the analysis entry point.
///
/// Everything else degrades into a well-formed error result.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    #[error("variant source not found: {path}")]
    SourceNotFound { path: String },
}

/// Command line arguments for `risk analyze` sub command.
#[derive(Parser, Debug)]
#[command(author, version, about = "Run hereditary cancer risk analysis", long_about = None)]
pub struct Args {
    /// Path to the input variant-call file, optionally gzip-compressed.
    #[arg(long, required = true)]
    pub path_input: String,
    /// Patient identifier carried into the result.
    #[arg(long, default_value = "P001")]
    pub patient_id: String,
    /// Annotation mode.
    #[arg(long, value_enum, default_value_t = AnnotationMode::Offline)]
    pub mode: AnnotationMode,
    /// Optional path to the output JSON file, gzip if ending in ".gz";
    /// stdout when absent.
    #[arg(long)]
    pub path_output: Option<String>,
    /// Optional path to a JSON file with gene regions replacing the built-in
    /// panel.
    #[arg(long)]
    pub path_gene_regions: Option<String>,
}

/// The analysis pipeline, constructed once per invocation.
///
/// Holds only read-only configuration; invocations on separate instances may
/// run concurrently without coordination.
pub struct RiskPipeline {
    genes: GeneRegionTable,
    provider: Box<dyn AnnotationProvider>,
}

impl RiskPipeline {
    /// Construct from a gene table and an annotation provider.
    pub fn new(genes: GeneRegionTable, provider: Box<dyn AnnotationProvider>) -> Self {
        Self { genes, provider }
    }

    /// Construct with the provider for the given mode and override list.
    pub fn with_mode(
        genes: GeneRegionTable,
        mode: AnnotationMode,
        known_pathogenic: Vec<crate::genes::KnownPathogenicVariant>,
    ) -> Self {
        Self::new(genes, provider_for_mode(mode, known_pathogenic))
    }

    /// Analyze the variant source at `path` for the given patient.
    ///
    /// Fails only when the source does not exist; internal problems are
    /// caught and converted into a degraded result.
    pub fn analyze<P: AsRef<Path>>(
        &self,
        path: P,
        patient_id: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::SourceNotFound {
                path: path.display().to_string(),
            });
        }

        match self.run_stages(path, patient_id) {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::error!("analysis of {:?} failed: {}", path, e);
                Ok(aggregate::degraded_result(
                    patient_id,
                    &self.genes,
                    &e.to_string(),
                ))
            }
        }
    }

    fn run_stages(&self, path: &Path, patient_id: &str) -> Result<AnalysisResult, anyhow::Error> {
        let outcome = parser::parse_variants(path, &self.genes)?;
        tracing::info!(
            "found {} variant(s) in panel genes via {} parse, {} line(s) skipped",
            outcome.variants.len(),
            outcome.strategy,
            outcome.skipped_lines
        );

        let classified = classify::classify_variants(self.provider.as_ref(), outcome.variants);
        Ok(aggregate::build_result(patient_id, &self.genes, classified))
    }
}

/// Main entry point for `risk analyze` sub command.
pub fn run(args_common: &crate::common::Args, args: &Args) -> Result<(), anyhow::Error> {
    let before_anything = Instant::now();
    tracing::info!("args_common = {:?}", &args_common);
    tracing::info!("args = {:?}", &args);

    let genes = if let Some(path) = &args.path_gene_regions {
        GeneRegionTable::from_path(path)?
    } else {
        GeneRegionTable::grch38_cancer_panel()
    };
    let pipeline = RiskPipeline::with_mode(genes, args.mode, known_pathogenic_defaults());

    let result = pipeline.analyze(&args.path_input, &args.patient_id)?;

    tracing::info!("patient: {}", result.patient_id);
    tracing::info!("variants in panel genes: {}", result.variant_count);
    tracing::info!("pathogenic variants: {}", result.pathogenic_count);
    tracing::info!("VUS: {}", result.vus_count);
    tracing::info!("overall risk: {}", result.overall_risk);

    if let Some(path_output) = &args.path_output {
        let mut writer = crate::common::io::open_write_maybe_gz(path_output)?;
        serde_json::to_writer_pretty(&mut writer, &result)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        tracing::info!("results written to {:?}", path_output);
    } else {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        serde_json::to_writer_pretty(&mut handle, &result)?;
        handle.write_all(b"\n")?;
    }

    tracing::info!(
        "All of `risk analyze` completed in {:?}",
        before_anything.elapsed()
    );
    Ok(())
}
