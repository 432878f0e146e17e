use std::collections::BTreeMap;

use crate::annotate::{AccuracyTracker, ClassificationResult, FinalCategory};
use crate::config::{normalize, same_category};
use crate::scan::ImageReference;

/// Running totals for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAggregates {
    /// Keyed by normalized category name. Diagrams whose image could not be
    /// loaded are not counted.
    pub category_counts: BTreeMap<String, usize>,
    pub accuracy: AccuracyTracker,
    pub diagram_count: usize,
}

impl RunAggregates {
    /// `(category, count, percentage of all diagrams)` sorted by category.
    pub fn distribution(&self) -> Vec<(&str, usize, f64)> {
        self.category_counts
            .iter()
            .map(|(name, &count)| {
                let pct = if self.diagram_count == 0 {
                    0.0
                } else {
                    count as f64 / self.diagram_count as f64 * 100.0
                };
                (name.as_str(), count, pct)
            })
            .collect()
    }
}

/// Human-readable category: underscores become spaces and each word is
/// capitalized the way Python's `str.title` does it.
pub fn display_category(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_is_letter = false;
    for c in name.chars() {
        let c = if c == '_' { ' ' } else { c };
        if c.is_alphabetic() {
            if prev_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            out.push(c);
            prev_is_letter = false;
        }
    }
    out
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Builds the annotated document and the summary as results arrive.
pub struct DocumentAssembler<'a> {
    source: &'a str,
    document_name: String,
    expected: usize,
    last_end: usize,
    annotated: String,
    sections: String,
    aggregates: RunAggregates,
}

impl<'a> DocumentAssembler<'a> {
    pub fn new(source: &'a str, document_name: &str, expected: usize) -> Self {
        Self {
            source,
            document_name: document_name.to_string(),
            expected,
            last_end: 0,
            annotated: String::with_capacity(source.len()),
            sections: String::new(),
            aggregates: RunAggregates::default(),
        }
    }

    /// Fold in the next reference. References must arrive in document order.
    pub fn push(&mut self, reference: &ImageReference, result: &ClassificationResult) {
        self.aggregates.diagram_count += 1;
        if result.category != FinalCategory::Unknown {
            *self
                .aggregates
                .category_counts
                .entry(normalize(result.category.as_str()))
                .or_default() += 1;
        }
        self.aggregates
            .accuracy
            .record(result.predicted.as_deref(), result.category.as_str());

        let category = display_category(result.category.as_str());

        self.annotated
            .push_str(&self.source[self.last_end..reference.start]);
        self.annotated.push_str(reference.markup(self.source));
        self.annotated.push_str(&format!(
            "\n\n**Diagram Type:** {category}\n\n**Technical Description:**\n{}\n\n",
            result.description
        ));
        self.last_end = reference.end;

        let name = basename(&reference.path);
        let alt = if reference.alt_text.is_empty() {
            name
        } else {
            reference.alt_text.as_str()
        };
        let s = &mut self.sections;
        s.push_str(&format!(
            "## Diagram {}: {name}\n\n",
            self.aggregates.diagram_count
        ));
        s.push_str(&format!("![{alt}]({})\n\n", reference.path));
        s.push_str(&format!("- **Type:** {category}\n"));
        if let Some(predicted) = &result.predicted {
            if !same_category(predicted, result.category.as_str()) {
                s.push_str(&format!(
                    "- **Context Prediction:** {} (mismatch)\n",
                    display_category(predicted)
                ));
            }
        }
        s.push_str(&format!("- **File:** `{}`\n", reference.path));
        if !reference.current_heading.is_empty() {
            s.push_str(&format!("- **Section:** {}\n", reference.current_heading));
        }
        s.push_str(&format!("- **Description:**\n\n{}\n\n", result.description));
        s.push_str("---\n\n");
    }

    fn statistics(&self) -> String {
        let mut out = String::from("## Analysis Statistics\n\n");

        let distribution = self.aggregates.distribution();
        if !distribution.is_empty() {
            out.push_str("### Category Distribution\n\n");
            for (name, count, pct) in distribution {
                out.push_str(&format!(
                    "- **{}:** {count} ({pct:.1}%)\n",
                    display_category(name)
                ));
            }
        }

        let accuracy = &self.aggregates.accuracy;
        if accuracy.total > 0 {
            out.push_str("\n### Context Prediction Accuracy\n\n");
            out.push_str(&format!(
                "- **Correct predictions:** {}/{} ({:.1}%)\n",
                accuracy.correct,
                accuracy.total,
                accuracy.percentage()
            ));
        }

        out.push_str("\n---\n\n");
        out
    }

    /// Emit the remaining tail and return `(annotated, summary, aggregates)`.
    pub fn finish(mut self) -> (String, String, RunAggregates) {
        if self.aggregates.diagram_count != self.expected {
            tracing::warn!(
                expected = self.expected,
                processed = self.aggregates.diagram_count,
                "diagram count differs from scan"
            );
        }
        self.annotated.push_str(&self.source[self.last_end..]);

        let mut summary = String::from("# Diagram Analysis Summary\n");
        summary.push_str(&format!("**Source Document:** {}\n", self.document_name));
        summary.push_str(&format!("**Total Diagrams:** {}\n", self.expected));
        summary.push_str("\n---\n\n");
        summary.push_str(&self.statistics());
        summary.push_str(&self.sections);

        (self.annotated, summary, self.aggregates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;

    fn result(predicted: Option<&str>, category: FinalCategory, description: &str) -> ClassificationResult {
        ClassificationResult {
            predicted: predicted.map(str::to_string),
            category,
            description: description.to_string(),
        }
    }

    #[test]
    fn test_display_category() {
        assert_eq!(display_category("class_diagram"), "Class Diagram");
        assert_eq!(display_category("c4 model"), "C4 Model");
        assert_eq!(display_category("UI/UX design"), "Ui/Ux Design");
        assert_eq!(display_category("unknown"), "Unknown");
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("img/arch.png"), "arch.png");
        assert_eq!(basename("arch.png"), "arch.png");
        assert_eq!(basename("..\\img\\seq.png"), "seq.png");
    }

    #[test]
    fn test_annotated_document_layout() {
        let doc = scan("Intro\n![a](a.png)\nMiddle ![b](dir/b.png) end", 500);
        let mut asm = DocumentAssembler::new(&doc.text, "doc.md", 2);
        asm.push(
            &doc.images[0],
            &result(None, FinalCategory::Configured("flowchart".into()), "Steps."),
        );
        asm.push(
            &doc.images[1],
            &result(None, FinalCategory::Other, "Something."),
        );
        let (annotated, _, _) = asm.finish();
        assert_eq!(
            annotated,
            "Intro\n![a](a.png)\n\n**Diagram Type:** Flowchart\n\n**Technical Description:**\nSteps.\n\n\
             \nMiddle ![b](dir/b.png)\n\n**Diagram Type:** Other\n\n**Technical Description:**\nSomething.\n\n end"
        );
    }

    #[test]
    fn test_summary_layout() {
        let doc = scan("## Login\n\n![Login flow](img/login.png)", 500);
        let mut asm = DocumentAssembler::new(&doc.text, "guide.md", 1);
        asm.push(
            &doc.images[0],
            &result(
                Some("flowchart"),
                FinalCategory::Configured("sequence_diagram".into()),
                "Two lifelines.",
            ),
        );
        let (_, summary, aggregates) = asm.finish();
        let expected = "# Diagram Analysis Summary\n\
            **Source Document:** guide.md\n\
            **Total Diagrams:** 1\n\
            \n---\n\n\
            ## Analysis Statistics\n\n\
            ### Category Distribution\n\n\
            - **Sequence Diagram:** 1 (100.0%)\n\
            \n### Context Prediction Accuracy\n\n\
            - **Correct predictions:** 0/1 (0.0%)\n\
            \n---\n\n\
            ## Diagram 1: login.png\n\n\
            ![Login flow](img/login.png)\n\n\
            - **Type:** Sequence Diagram\n\
            - **Context Prediction:** Flowchart (mismatch)\n\
            - **File:** `img/login.png`\n\
            - **Section:** Login\n\
            - **Description:**\n\nTwo lifelines.\n\n\
            ---\n\n";
        assert_eq!(summary, expected);
        assert_eq!(aggregates.accuracy, AccuracyTracker { correct: 0, total: 1 });
    }

    #[test]
    fn test_unknown_not_in_distribution() {
        let doc = scan("![a](a.png) ![b](b.png)", 500);
        let mut asm = DocumentAssembler::new(&doc.text, "doc.md", 2);
        asm.push(
            &doc.images[0],
            &result(None, FinalCategory::Unknown, "⚠️ Image file not found: `a.png`"),
        );
        asm.push(&doc.images[1], &result(None, FinalCategory::Other, "x"));
        let (_, summary, aggregates) = asm.finish();
        assert_eq!(aggregates.category_counts.len(), 1);
        assert_eq!(aggregates.distribution(), vec![("other", 1, 50.0)]);
        assert!(summary.contains("- **Other:** 1 (50.0%)\n"));
        assert!(!summary.contains("Context Prediction Accuracy"));
        assert!(summary.contains("- **Type:** Unknown\n"));
        assert!(summary.contains("![a.png](a.png)"));
    }

    #[test]
    fn test_no_images_passes_through() {
        let text = "Just prose.\n";
        let asm = DocumentAssembler::new(text, "doc.md", 0);
        let (annotated, summary, aggregates) = asm.finish();
        assert_eq!(annotated, text);
        assert!(summary.contains("**Total Diagrams:** 0\n"));
        assert!(!summary.contains("### Category Distribution"));
        assert_eq!(aggregates.diagram_count, 0);
    }
}
