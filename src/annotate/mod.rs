pub mod accuracy;
pub mod assemble;
pub mod classify;
pub mod describe;
pub mod load;
pub mod predict;

use std::fmt;
use std::path::{Path, PathBuf};

use snafu::ResultExt;

use crate::config::{same_category, AnnotateOptions, CategoryConfig, OTHER, UNKNOWN};
use crate::error::{annotator_error, Result};
use crate::provider::{GenerationRequest, VisionProvider};
use crate::scan::{self, Document, ImageReference};

pub use accuracy::AccuracyTracker;
pub use assemble::{DocumentAssembler, RunAggregates};

/// Category assigned to a diagram once classification is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalCategory {
    /// One of the configured categories, in its configured spelling.
    Configured(String),
    /// The classifier's reply did not match any configured category.
    Other,
    /// The image could not be loaded, so no model was consulted.
    Unknown,
}

impl FinalCategory {
    pub fn as_str(&self) -> &str {
        match self {
            FinalCategory::Configured(name) => name,
            FinalCategory::Other => OTHER,
            FinalCategory::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for FinalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of running one image reference through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub predicted: Option<String>,
    pub category: FinalCategory,
    pub description: String,
}

/// Everything produced by one annotation run.
#[derive(Debug, Clone)]
pub struct AnnotationOutput {
    pub annotated: String,
    pub summary: String,
    pub aggregates: RunAggregates,
    pub results: Vec<ClassificationResult>,
}

/// Send one request, folding transport failures and empty replies into `None`.
pub(crate) fn ask(
    provider: &dyn VisionProvider,
    request: &GenerationRequest,
    stage: &str,
) -> Option<String> {
    match provider.generate(request) {
        Ok(reply) if !reply.trim().is_empty() => Some(reply),
        Ok(_) => {
            tracing::warn!(stage, "model returned an empty reply");
            None
        }
        Err(e) => {
            tracing::warn!(stage, provider = provider.name(), "model request failed: {e}");
            None
        }
    }
}

/// First `max_chars` characters of `text`.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Run predictor, classifier and generator over one reference.
///
/// When the image cannot be loaded no model is called and the result carries
/// the `unknown` category with a diagnostic description.
pub fn process_reference(
    provider: &dyn VisionProvider,
    config: &CategoryConfig,
    options: &AnnotateOptions,
    document_dir: &Path,
    reference: &ImageReference,
) -> ClassificationResult {
    let resolved = load::resolve_image_path(document_dir, &reference.path);
    let image = match load::load_image(&reference.path, &resolved, options.max_image_size) {
        Ok(image) => image,
        Err(e) => {
            tracing::warn!("skipping diagram: {e}");
            return ClassificationResult {
                predicted: None,
                category: FinalCategory::Unknown,
                description: e.diagnostic(),
            };
        }
    };

    let predicted = if options.context_aware {
        tracing::debug!("analyzing context for category hints");
        predict::predict_category(provider, reference, config)
    } else {
        None
    };
    if let Some(p) = &predicted {
        tracing::debug!(predicted = %p, "context suggests a category");
    }

    tracing::debug!("detecting diagram type from image");
    let category = classify::classify_diagram(provider, &image, reference, config, predicted.as_deref());
    tracing::debug!(category = %category, "final type");
    if let Some(p) = &predicted {
        if !same_category(p, category.as_str()) {
            tracing::debug!(predicted = %p, category = %category, "context prediction was different");
        }
    }

    tracing::debug!("generating technical description");
    let description = describe::generate_description(provider, &image, reference, config, &category);

    ClassificationResult {
        predicted,
        category,
        description,
    }
}

/// Annotate every image in `document`, in order.
pub fn annotate_document(
    provider: &dyn VisionProvider,
    config: &CategoryConfig,
    options: &AnnotateOptions,
    document: &Document,
    document_dir: &Path,
    document_name: &str,
) -> AnnotationOutput {
    let total = document.images.len();
    let mut assembler = DocumentAssembler::new(&document.text, document_name, total);
    let mut results = Vec::with_capacity(total);

    for (idx, reference) in document.images.iter().enumerate() {
        tracing::info!(
            diagram = idx + 1,
            total,
            path = %reference.path,
            section = %reference.current_heading,
            "processing diagram"
        );
        let result = process_reference(provider, config, options, document_dir, reference);
        assembler.push(reference, &result);
        results.push(result);
    }

    let (annotated, summary, aggregates) = assembler.finish();
    AnnotationOutput {
        annotated,
        summary,
        aggregates,
        results,
    }
}

/// File locations for one run.
#[derive(Debug, Clone)]
pub struct AnnotateJob {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: PathBuf,
    pub categories: PathBuf,
}

/// Read the input and category configuration, annotate, and write both
/// output documents.
///
/// Unreadable input or an invalid category configuration aborts before any
/// model call and before anything is written.
pub fn run(
    job: &AnnotateJob,
    provider: &dyn VisionProvider,
    options: &AnnotateOptions,
) -> Result<AnnotationOutput> {
    let text = std::fs::read_to_string(&job.input).context(annotator_error::ReadDocumentSnafu {
        path: job.input.clone(),
    })?;
    let config = CategoryConfig::load(&job.categories).context(annotator_error::ConfigSnafu)?;

    let document = scan::scan(text, options.context_size);
    if document.images.is_empty() {
        tracing::warn!("no images found in {}", job.input.display());
    } else {
        tracing::info!(count = document.images.len(), "found diagrams to process");
    }

    let document_dir = job
        .input
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let document_name = job
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let output = annotate_document(
        provider,
        &config,
        options,
        &document,
        &document_dir,
        &document_name,
    );

    write_outputs(job, &output)?;
    Ok(output)
}

/// Stage the annotated document next to its destination, write the summary,
/// then move the annotated document into place. A failed summary write
/// leaves the previous annotated document untouched.
fn write_outputs(job: &AnnotateJob, output: &AnnotationOutput) -> Result<()> {
    let staged = staging_path(&job.output);
    write_output(&staged, &output.annotated)?;
    if let Err(e) = write_output(&job.summary, &output.summary) {
        let _ = std::fs::remove_file(&staged);
        return Err(e);
    }
    std::fs::rename(&staged, &job.output).context(annotator_error::WriteOutputSnafu {
        path: job.output.clone(),
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_output(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .context(annotator_error::WriteOutputSnafu { path: parent })?;
    }
    std::fs::write(path, contents).context(annotator_error::WriteOutputSnafu { path })
}
