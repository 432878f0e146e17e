use std::path::PathBuf;

use snafu::ResultExt;

use crate::annotate::load::load_image;
use crate::cli::ProviderArgs;
use crate::config::DEFAULT_MAX_IMAGE_SIZE;
use crate::error::{annotator_error, Result};
use crate::provider::GenerationRequest;

const PROBE_PROMPT: &str = "Provide a concise (1-2 sentence) description of the image. \
                            Focus on the main elements and their purpose.";
const PROBE_TEMPERATURE: f32 = 0.2;

/// Run `diagram-annotator probe`: check that the configured model accepts
/// images by asking it for a short description of one.
pub fn run(image: PathBuf, provider_args: ProviderArgs) -> Result<()> {
    let raw = image.display().to_string();
    let attachment =
        load_image(&raw, &image, DEFAULT_MAX_IMAGE_SIZE).context(annotator_error::ImageSnafu)?;

    let settings = provider_args.settings()?;
    let provider =
        crate::provider::discover_provider(&settings).context(annotator_error::ProviderSnafu)?;
    tracing::info!(provider = provider.name(), model = provider.model(), "probing model");

    let request = GenerationRequest::with_image(PROBE_PROMPT, &attachment, PROBE_TEMPERATURE);
    let description = provider
        .generate(&request)
        .context(annotator_error::ProviderSnafu)?;

    if description.is_empty() {
        println!("No description returned.");
    } else {
        println!("Description:");
        println!("{description}");
    }
    Ok(())
}
