pub mod user_config;

use std::collections::HashMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt};

use crate::error::config_error::{EmptyCategoriesSnafu, ParseCategoriesSnafu, ReadCategoriesSnafu};
use crate::error::ConfigError;

/// Prompt used when neither the category nor `"other"` has a configured one.
pub const GENERIC_PROMPT: &str = "Describe this diagram in detail.";

/// Category name reserved for diagrams the classifier could not place.
pub const OTHER: &str = "other";

/// Category name for diagrams whose image could not be loaded.
pub const UNKNOWN: &str = "unknown";

pub const DEFAULT_CONTEXT_SIZE: usize = 500;
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 5 * 1024 * 1024;

/// On-disk shape of the category configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryFile {
    /// Diagram categories the classifier may choose from.
    pub categories: Vec<String>,
    /// Description prompt per category; an `"other"` entry is the fallback.
    #[serde(default)]
    pub category_prompts: HashMap<String, CategoryPrompt>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoryPrompt {
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Validated category set with case-insensitive lookups.
#[derive(Debug, Clone)]
pub struct CategoryConfig {
    categories: Vec<String>,
    /// Keyed by lower-cased category name.
    prompts: HashMap<String, String>,
}

impl CategoryConfig {
    /// Read and validate a category configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).context(ReadCategoriesSnafu { path })?;
        let file: CategoryFile =
            serde_json::from_str(&contents).context(ParseCategoriesSnafu { path })?;
        Self::from_file(file)
    }

    pub fn from_file(file: CategoryFile) -> Result<Self, ConfigError> {
        let mut categories: Vec<String> = Vec::new();
        for name in file.categories {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if categories.iter().any(|c| same_category(c, name)) {
                tracing::debug!(category = name, "duplicate category ignored");
                continue;
            }
            categories.push(name.to_string());
        }
        ensure!(!categories.is_empty(), EmptyCategoriesSnafu);

        let prompts = file
            .category_prompts
            .into_iter()
            .filter_map(|(name, entry)| {
                let prompt = entry.prompt?;
                if prompt.trim().is_empty() {
                    return None;
                }
                Some((normalize(&name), prompt))
            })
            .collect();

        Ok(Self {
            categories,
            prompts,
        })
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Match a free-text model reply against the configured set.
    ///
    /// Returns the configured spelling of the category, or `None` when the
    /// normalized reply is not one of them.
    pub fn match_category(&self, reply: &str) -> Option<&str> {
        let wanted = normalize(reply);
        if wanted.is_empty() {
            return None;
        }
        self.categories
            .iter()
            .find(|c| normalize(c) == wanted)
            .map(String::as_str)
    }

    /// Description prompt for `category`: its own prompt, else the `"other"`
    /// prompt, else [`GENERIC_PROMPT`].
    pub fn resolve_prompt(&self, category: &str) -> &str {
        self.prompts
            .get(&normalize(category))
            .or_else(|| self.prompts.get(OTHER))
            .map(String::as_str)
            .unwrap_or(GENERIC_PROMPT)
    }
}

/// Case-fold and trim a category label.
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

pub fn same_category(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Per-run knobs for the annotation pipeline.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Characters of context captured on each side of an image.
    pub context_size: usize,
    /// Images larger than this many bytes are skipped.
    pub max_image_size: u64,
    /// Run the context-only prediction stage before classification.
    pub context_aware: bool,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            context_size: DEFAULT_CONTEXT_SIZE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            context_aware: true,
        }
    }
}
