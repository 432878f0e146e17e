use std::path::PathBuf;

use snafu::ResultExt;

use crate::annotate::assemble::display_category;
use crate::annotate::{AnnotateJob, AnnotationOutput};
use crate::cli::ProviderArgs;
use crate::config::AnnotateOptions;
use crate::error::{annotator_error, Result};

pub struct AnnotateArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: PathBuf,
    pub categories: PathBuf,
    pub context_size: usize,
    pub max_image_mb: u64,
    pub no_context: bool,
    pub provider: ProviderArgs,
}

/// `--max-image-mb` in bytes. Absurd limits clamp instead of overflowing.
fn max_image_bytes(megabytes: u64) -> u64 {
    megabytes.saturating_mul(1024 * 1024)
}

/// Run `diagram-annotator annotate`.
pub fn run(args: AnnotateArgs) -> Result<()> {
    let settings = args.provider.settings()?;
    let provider =
        crate::provider::discover_provider(&settings).context(annotator_error::ProviderSnafu)?;
    tracing::info!(provider = provider.name(), model = provider.model(), "using model");

    let options = AnnotateOptions {
        context_size: args.context_size,
        max_image_size: max_image_bytes(args.max_image_mb),
        context_aware: !args.no_context,
    };
    let job = AnnotateJob {
        input: args.input,
        output: args.output,
        summary: args.summary,
        categories: args.categories,
    };

    let output = crate::annotate::run(&job, provider.as_ref(), &options)?;
    report(&job, &output);
    Ok(())
}

fn report(job: &AnnotateJob, output: &AnnotationOutput) {
    println!("Processing complete");
    println!("Annotated document: {}", job.output.display());
    println!("Summary document: {}", job.summary.display());

    let distribution = output.aggregates.distribution();
    if !distribution.is_empty() {
        println!();
        println!("Category distribution:");
        for (name, count, _) in distribution {
            println!("  - {}: {count}", display_category(name));
        }
    }

    let accuracy = &output.aggregates.accuracy;
    if accuracy.total > 0 {
        println!();
        println!("Context prediction accuracy: {:.1}%", accuracy.percentage());
    }
}
