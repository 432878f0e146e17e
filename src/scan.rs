use std::sync::OnceLock;

use regex::Regex;

/// Characters scanned backwards for the heading an image sits under.
pub const HEADING_LOOKBACK: usize = 1000;

/// A markdown document with its image references located.
#[derive(Debug, Clone)]
pub struct Document {
    pub text: String,
    /// Sorted by position, never overlapping.
    pub images: Vec<ImageReference>,
}

/// One `![alt](path)` occurrence plus the prose around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Path exactly as written in the document.
    pub path: String,
    pub alt_text: String,
    /// Byte offset of the `!`.
    pub start: usize,
    /// Byte offset just past the closing `)`.
    pub end: usize,
    pub text_before: String,
    pub text_after: String,
    pub current_heading: String,
}

impl ImageReference {
    pub fn markup<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

fn image_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"!\[(?P<alt>.*?)\]\((?P<path>[^)]+)\)").expect("image pattern is valid")
    })
}

fn heading_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^#+\s+(.+)$").expect("heading pattern is valid"))
}

/// Locate every image reference in `text`, capturing up to `context_size`
/// characters of context on each side.
pub fn scan(text: impl Into<String>, context_size: usize) -> Document {
    let text = text.into();
    let images = image_regex()
        .captures_iter(&text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (start, end) = (whole.start(), whole.end());
            Some(ImageReference {
                path: caps.name("path")?.as_str().to_string(),
                alt_text: caps.name("alt").map(|m| m.as_str()).unwrap_or_default().to_string(),
                start,
                end,
                text_before: context_before(&text, start, context_size),
                text_after: context_after(&text, end, context_size),
                current_heading: heading_before(&text, start),
            })
        })
        .collect();
    Document { text, images }
}

/// Byte offset `n` characters before `pos`, clamped to the start of `text`.
fn chars_back(text: &str, pos: usize, n: usize) -> usize {
    if n == 0 {
        return pos;
    }
    text[..pos]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte offset `n` characters after `pos`, clamped to the end of `text`.
fn chars_forward(text: &str, pos: usize, n: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

/// Paragraph leading up to an image. The window is cut at the last blank line
/// or heading line inside it; a boundary at the very start of the window
/// leaves the window untouched.
fn context_before(text: &str, start: usize, context_size: usize) -> String {
    let window = &text[chars_back(text, start, context_size)..start];
    let boundary = [window.rfind("\n\n"), window.rfind("\n#")]
        .into_iter()
        .flatten()
        .max();
    match boundary {
        Some(cut) if cut > 0 => window[cut..].trim().to_string(),
        _ => window.to_string(),
    }
}

/// Paragraph following an image, cut at the first blank line or heading line.
fn context_after(text: &str, end: usize, context_size: usize) -> String {
    let window = &text[end..chars_forward(text, end, context_size)];
    let cut = [window.find("\n\n"), window.find("\n#")]
        .into_iter()
        .flatten()
        .filter(|&p| p > 0)
        .min()
        .unwrap_or(window.len());
    window[..cut].trim().to_string()
}

fn heading_before(text: &str, start: usize) -> String {
    let window = &text[chars_back(text, start, HEADING_LOOKBACK)..start];
    heading_regex()
        .captures_iter(window)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_images_in_order() {
        let doc = scan("a ![one](1.png) b ![two](img/2.jpg) c", 500);
        assert_eq!(doc.images.len(), 2);
        assert_eq!(doc.images[0].path, "1.png");
        assert_eq!(doc.images[0].alt_text, "one");
        assert_eq!(doc.images[1].path, "img/2.jpg");
        assert!(doc.images[0].end <= doc.images[1].start);
        assert_eq!(doc.images[1].markup(&doc.text), "![two](img/2.jpg)");
    }

    #[test]
    fn test_empty_alt_and_no_images() {
        let doc = scan("![](x.png)", 100);
        assert_eq!(doc.images[0].alt_text, "");
        assert!(scan("no pictures here [link](a.md)", 100).images.is_empty());
    }

    #[test]
    fn test_image_at_document_start() {
        let doc = scan("![a](a.png)\nTrailing words.", 500);
        let img = &doc.images[0];
        assert_eq!(img.start, 0);
        assert_eq!(img.text_before, "");
        assert_eq!(img.text_after, "Trailing words.");
    }

    #[test]
    fn test_image_at_document_end() {
        let doc = scan("Leading words.\n![a](a.png)", 500);
        assert_eq!(doc.images[0].text_after, "");
        assert_eq!(doc.images[0].text_before, "Leading words.\n");
    }

    #[test]
    fn test_context_near_start_is_clipped() {
        let text = "Short intro ![a](a.png)";
        let doc = scan(text, 500);
        assert_eq!(doc.images[0].text_before, "Short intro ");
    }

    #[test]
    fn test_context_trimmed_to_paragraph() {
        let text = "First paragraph.\n\nThe system context:\n![ctx](c.png)\nShows actors.\n\nNext paragraph.";
        let doc = scan(text, 500);
        let img = &doc.images[0];
        assert_eq!(img.text_before, "The system context:");
        assert_eq!(img.text_after, "Shows actors.");
    }

    #[test]
    fn test_context_stops_at_heading() {
        let text = "Intro.\n## Design\nLayers below.\n![l](l.png)\nMore text\n## Next";
        let doc = scan(text, 500);
        assert_eq!(doc.images[0].text_before, "## Design\nLayers below.");
        assert_eq!(doc.images[0].text_after, "More text");
        assert_eq!(doc.images[0].current_heading, "Design");
    }

    #[test]
    fn test_boundary_at_window_start_keeps_window() {
        let doc = scan("\n\nOnly paragraph ![a](a.png)", 500);
        assert_eq!(doc.images[0].text_before, "\n\nOnly paragraph ");
    }

    #[test]
    fn test_context_window_size() {
        let text = format!("{}![a](a.png){}", "x".repeat(50), "y".repeat(50));
        let doc = scan(text, 10);
        assert_eq!(doc.images[0].text_before, "x".repeat(10));
        assert_eq!(doc.images[0].text_after, "y".repeat(10));
    }

    #[test]
    fn test_multibyte_context_does_not_split_chars() {
        let text = format!("{}![a](a.png){}", "é".repeat(20), "ü".repeat(20));
        let doc = scan(text, 5);
        assert_eq!(doc.images[0].text_before, "é".repeat(5));
        assert_eq!(doc.images[0].text_after, "ü".repeat(5));
    }

    #[test]
    fn test_zero_context_size() {
        let doc = scan("before ![a](a.png) after", 0);
        assert_eq!(doc.images[0].text_before, "");
        assert_eq!(doc.images[0].text_after, "");
    }

    #[test]
    fn test_current_heading_is_closest() {
        let text = "# Title\n\n## Architecture\n\nSome text.\n\n![a](a.png)";
        let doc = scan(text, 500);
        assert_eq!(doc.images[0].current_heading, "Architecture");
    }

    #[test]
    fn test_heading_outside_lookback_ignored() {
        let text = format!("# Far away\n{}![a](a.png)", "z".repeat(HEADING_LOOKBACK + 10));
        let doc = scan(text, 100);
        assert_eq!(doc.images[0].current_heading, "");
    }
}
