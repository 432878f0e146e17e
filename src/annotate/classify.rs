use crate::annotate::{ask, FinalCategory};
use crate::config::CategoryConfig;
use crate::provider::{GenerationRequest, ImageAttachment, VisionProvider};
use crate::scan::ImageReference;

/// Classification must be reproducible for the same image and prompt.
pub const CLASSIFICATION_TEMPERATURE: f32 = 0.0;

/// Visual traits that separate commonly confused diagram types.
const VISUAL_FEATURES: &[(&str, &str)] = &[
    (
        "C4 Model",
        "Has explicit C4 level labels (Context/Container/Component), technology tags in brackets",
    ),
    (
        "Use Case",
        "Has actors (stick figures), ovals for use cases, system boundary rectangle",
    ),
    (
        "Class Diagram",
        "Shows classes with attributes/methods, inheritance arrows",
    ),
    (
        "Entity Relationship",
        "Shows entities with attributes, relationship lines with cardinality",
    ),
    (
        "Architecture",
        "Shows system components, layers, external services",
    ),
    (
        "Sequence",
        "Has lifelines, messages between objects, activation boxes",
    ),
    (
        "Data Flow",
        "Has numbered processes, data stores, external entities",
    ),
];

pub fn build_classification_prompt(
    reference: &ImageReference,
    categories: &[String],
    predicted: Option<&str>,
) -> String {
    let mut prompt = String::from("Identify the type of this software engineering diagram.\n\n");

    if let Some(predicted) = predicted {
        prompt.push_str(&format!("Context suggests this might be a {predicted} diagram.\n"));
    }
    if !reference.current_heading.is_empty() {
        prompt.push_str(&format!("Section heading: {}\n", reference.current_heading));
    }
    if predicted.is_some() || !reference.current_heading.is_empty() {
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "Examine the visual elements carefully and choose ONE category from: {}\n\n",
        categories.join(", ")
    ));

    prompt.push_str("Key distinguishing features:\n");
    for (name, features) in VISUAL_FEATURES {
        prompt.push_str(&format!("- {name}: {features}\n"));
    }

    prompt.push_str("\nReply with only the category name, nothing else.");
    prompt
}

/// Decide the final category from the image itself.
///
/// A failed call or a reply outside the configured set yields
/// [`FinalCategory::Other`]. The prediction is only a hint and never overrides
/// the reply.
pub fn classify_diagram(
    provider: &dyn VisionProvider,
    image: &ImageAttachment,
    reference: &ImageReference,
    config: &CategoryConfig,
    predicted: Option<&str>,
) -> FinalCategory {
    let prompt = build_classification_prompt(reference, config.categories(), predicted);
    let request = GenerationRequest::with_image(prompt, image, CLASSIFICATION_TEMPERATURE);

    let Some(reply) = ask(provider, &request, "classify") else {
        return FinalCategory::Other;
    };
    match config.match_category(&reply) {
        Some(name) => FinalCategory::Configured(name.to_string()),
        None => {
            tracing::debug!(reply = %reply.trim(), "unrecognized category, using other");
            FinalCategory::Other
        }
    }
}
