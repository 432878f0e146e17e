use crate::annotate::{ask, excerpt, FinalCategory};
use crate::config::CategoryConfig;
use crate::provider::{GenerationRequest, ImageAttachment, VisionProvider};
use crate::scan::ImageReference;

/// Low but non-zero so phrasing may vary between runs.
pub const DESCRIPTION_TEMPERATURE: f32 = 0.1;

pub const DESCRIPTION_CONTEXT_CHARS: usize = 200;

/// Written when the model returns nothing usable.
pub const NO_DESCRIPTION: &str = "No description generated.";

/// Category template followed by an excerpt of the surrounding text, if any.
pub fn build_description_prompt(template: &str, reference: &ImageReference) -> String {
    let mut prompt = template.to_string();
    if reference.text_before.is_empty() && reference.text_after.is_empty() {
        return prompt;
    }

    prompt.push_str("\n\nAdditional context from the document:\n");
    if !reference.text_before.is_empty() {
        prompt.push_str(&format!(
            "Before image: {}\n",
            excerpt(&reference.text_before, DESCRIPTION_CONTEXT_CHARS)
        ));
    }
    if !reference.text_after.is_empty() {
        prompt.push_str(&format!(
            "After image: {}\n",
            excerpt(&reference.text_after, DESCRIPTION_CONTEXT_CHARS)
        ));
    }
    prompt
}

pub fn generate_description(
    provider: &dyn VisionProvider,
    image: &ImageAttachment,
    reference: &ImageReference,
    config: &CategoryConfig,
    category: &FinalCategory,
) -> String {
    let template = config.resolve_prompt(category.as_str());
    let prompt = build_description_prompt(template, reference);
    let request = GenerationRequest::with_image(prompt, image, DESCRIPTION_TEMPERATURE);

    match ask(provider, &request, "describe") {
        Some(text) => text.trim().to_string(),
        None => NO_DESCRIPTION.to_string(),
    }
}
