use crate::annotate::{ask, excerpt};
use crate::config::CategoryConfig;
use crate::provider::{GenerationRequest, VisionProvider};
use crate::scan::ImageReference;

pub const PREDICTION_TEMPERATURE: f32 = 0.1;

/// Characters of surrounding text shown to the model on each side.
pub const PREDICTION_CONTEXT_CHARS: usize = 300;

/// Advisory cues listed in the prompt. They are guidance for the model and are
/// never matched against the text here.
const KEYWORD_HINTS: &[(&str, &str)] = &[
    ("\"use case\", \"actors\", \"system boundary\"", "use case diagram"),
    ("\"C4\", \"context\", \"container\", \"component level\"", "C4 Model diagram"),
    ("\"entity\", \"relationship\", \"ERD\", \"database model\"", "entity relationship diagram"),
    ("\"class\", \"inheritance\", \"UML\"", "class diagram"),
    ("\"sequence\", \"message\", \"lifeline\"", "sequence diagram"),
    ("\"state machine\", \"transitions\", \"states\"", "state diagram"),
    ("\"deployment\", \"nodes\", \"infrastructure\"", "deployment diagram"),
    ("\"flow\", \"process\", \"data flow\"", "data flow diagram or flowchart"),
    ("\"architecture\", \"system design\", \"components\"", "architecture diagram"),
    ("\"mockup\", \"wireframe\", \"UI\", \"interface\"", "UI/UX design"),
    ("\"network\", \"topology\", \"connectivity\"", "network diagram"),
    ("\"git\", \"branch\", \"merge\"", "git workflow"),
];

fn or_none(text: &str) -> &str {
    if text.is_empty() {
        "None"
    } else {
        text
    }
}

pub fn build_prediction_prompt(reference: &ImageReference, categories: &[String]) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Based on the surrounding text context, predict what type of diagram is being referenced.\n\n",
    );
    prompt.push_str(&format!(
        "Current section heading: {}\n",
        or_none(&reference.current_heading)
    ));
    prompt.push_str(&format!("Image alt text: {}\n\n", or_none(&reference.alt_text)));
    prompt.push_str(&format!(
        "Text BEFORE the image:\n{}\n\n",
        or_none(excerpt(&reference.text_before, PREDICTION_CONTEXT_CHARS))
    ));
    prompt.push_str(&format!(
        "Text AFTER the image:\n{}\n\n",
        or_none(excerpt(&reference.text_after, PREDICTION_CONTEXT_CHARS))
    ));
    prompt.push_str("Based on this context, what type of diagram is most likely being shown?\n");
    prompt.push_str(&format!("Available categories: {}\n\n", categories.join(", ")));

    prompt.push_str("Look for keywords that indicate the diagram type:\n");
    for (keywords, category) in KEYWORD_HINTS {
        prompt.push_str(&format!("- {keywords} → {category}\n"));
    }

    prompt.push_str(
        "\nReply with ONLY the most likely category name. If you cannot determine with \
         reasonable confidence, reply with \"unknown\".",
    );

    prompt
}

/// Guess the category from the text around an image, before looking at it.
///
/// Returns the configured category name, or `None` when the model is
/// unavailable, unsure, or replies with anything outside the configured set.
pub fn predict_category(
    provider: &dyn VisionProvider,
    reference: &ImageReference,
    config: &CategoryConfig,
) -> Option<String> {
    let prompt = build_prediction_prompt(reference, config.categories());
    let request = GenerationRequest::text(prompt, PREDICTION_TEMPERATURE);
    let reply = ask(provider, &request, "predict")?;
    let matched = config.match_category(&reply);
    if matched.is_none() {
        tracing::debug!(reply = %reply.trim(), "no usable prediction from context");
    }
    matched.map(str::to_string)
}
