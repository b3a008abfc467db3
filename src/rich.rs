//! Structured rich-text document tree and theme marks.
//!
//! The editing surface itself is an external collaborator; this module
//! holds the structured form the engine consumes: paragraphs of text
//! spans, where a span may carry one theme mark tagging it with one or
//! more code ids and their colors (parallel lists, aligned by index).
//! Positions are character offsets into the document's plain text, with
//! one position reserved per paragraph break.
//!
//! The HTML form produced by [`Document::to_html`] is the canonical
//! persisted representation on text nodes; the tree mirrors it and is
//! what the 3D/VR renderer and the annotation index walk.

#[cfg(test)]
#[path = "rich_test.rs"]
mod rich_test;

use serde::{Deserialize, Serialize};

use crate::code::CodeId;

/// A span annotation carrying one or more code ids and colors.
///
/// `colors` is positionally aligned with `theme_ids`: removing an id
/// removes the color at the same index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeMark {
    pub theme_ids: Vec<CodeId>,
    pub colors: Vec<String>,
}

impl ThemeMark {
    #[must_use]
    pub fn single(code_id: CodeId, color: &str) -> Self {
        Self { theme_ids: vec![code_id], colors: vec![color.to_owned()] }
    }

    /// Append a code/color pair unless the id is already present.
    /// Multi-coding is additive; existing codings are never overwritten.
    pub fn add(&mut self, code_id: CodeId, color: &str) {
        if !self.theme_ids.contains(&code_id) {
            self.theme_ids.push(code_id);
            self.colors.push(color.to_owned());
        }
    }

    /// Remove a code id and its positionally paired color. Returns true
    /// if the id was present.
    pub fn remove(&mut self, code_id: CodeId) -> bool {
        let Some(pos) = self.theme_ids.iter().position(|id| *id == code_id) else {
            return false;
        };
        self.theme_ids.remove(pos);
        if pos < self.colors.len() {
            self.colors.remove(pos);
        }
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.theme_ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, code_id: CodeId) -> bool {
        self.theme_ids.contains(&code_id)
    }
}

/// A run of text with at most one theme mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mark: Option<ThemeMark>,
}

impl Span {
    #[must_use]
    pub fn plain(text: &str) -> Self {
        Self { text: text.to_owned(), mark: None }
    }
}

/// A paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub spans: Vec<Span>,
}

/// A structured rich-text document: a list of paragraphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

/// A span location yielded by [`Document::spans`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanRef<'a> {
    /// Start offset (inclusive) in document positions.
    pub from: usize,
    /// End offset (exclusive) in document positions.
    pub to: usize,
    pub text: &'a str,
    pub mark: Option<&'a ThemeMark>,
}

impl Document {
    /// A document holding a single empty paragraph, matching what the
    /// editor produces for a fresh text node.
    #[must_use]
    pub fn empty_paragraph() -> Self {
        Self { blocks: vec![Block::default()] }
    }

    /// Build a document from plain text, one paragraph per line.
    #[must_use]
    pub fn from_plain(text: &str) -> Self {
        let blocks = text
            .split('\n')
            .map(|line| Block {
                spans: if line.is_empty() { Vec::new() } else { vec![Span::plain(line)] },
            })
            .collect();
        Self { blocks }
    }

    /// Plain text with paragraphs joined by newlines.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.spans.iter().map(|s| s.text.as_str()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Walk every span with its document position range.
    #[must_use]
    pub fn spans(&self) -> Vec<SpanRef<'_>> {
        let mut out = Vec::new();
        let mut cursor = 0usize;
        for (i, block) in self.blocks.iter().enumerate() {
            if i > 0 {
                cursor += 1; // paragraph break
            }
            for span in &block.spans {
                let len = char_len(&span.text);
                out.push(SpanRef {
                    from: cursor,
                    to: cursor + len,
                    text: &span.text,
                    mark: span.mark.as_ref(),
                });
                cursor += len;
            }
        }
        out
    }

    /// Apply a theme mark with `{code_id, color}` over `[from, to)`.
    ///
    /// Spans partially covered by the range are split at its boundaries.
    /// Where the range already carries a theme mark the pair is appended,
    /// never overwriting existing codings. Returns true if any text was
    /// marked.
    pub fn apply_mark(&mut self, from: usize, to: usize, code_id: CodeId, color: &str) -> bool {
        if to <= from {
            return false;
        }
        let mut touched = false;
        let mut cursor = 0usize;
        for (i, block) in self.blocks.iter_mut().enumerate() {
            if i > 0 {
                cursor += 1;
            }
            let mut rebuilt: Vec<Span> = Vec::with_capacity(block.spans.len());
            for span in block.spans.drain(..) {
                let start = cursor;
                let end = start + char_len(&span.text);
                cursor = end;
                if end <= from || start >= to {
                    rebuilt.push(span);
                    continue;
                }
                touched = true;
                let cut_a = from.max(start) - start;
                let cut_b = to.min(end) - start;
                let (head, rest) = split_chars(&span.text, cut_a);
                let (mid, tail) = split_chars(&rest, cut_b - cut_a);
                if !head.is_empty() {
                    rebuilt.push(Span { text: head, mark: span.mark.clone() });
                }
                let mark = match span.mark.clone() {
                    Some(mut mark) => {
                        mark.add(code_id, color);
                        mark
                    }
                    None => ThemeMark::single(code_id, color),
                };
                rebuilt.push(Span { text: mid, mark: Some(mark) });
                if !tail.is_empty() {
                    rebuilt.push(Span { text: tail, mark: span.mark.clone() });
                }
            }
            block.spans = rebuilt;
        }
        if touched {
            self.normalize();
        }
        touched
    }

    /// Remove `code_id` (and its paired color) from every mark in the
    /// document. Marks whose id list empties are removed entirely; the
    /// rest are kept narrowed. Returns true if any mark was touched.
    pub fn strip_code(&mut self, code_id: CodeId) -> bool {
        let mut touched = false;
        for block in &mut self.blocks {
            for span in &mut block.spans {
                if let Some(mark) = &mut span.mark
                    && mark.remove(code_id)
                {
                    touched = true;
                    if mark.is_empty() {
                        span.mark = None;
                    }
                }
            }
        }
        if touched {
            self.normalize();
        }
        touched
    }

    /// Serialize to the canonical HTML form: one `<p>` per paragraph,
    /// marked runs as `<span>` elements carrying the id and color lists.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            out.push_str("<p>");
            for span in &block.spans {
                match &span.mark {
                    Some(mark) => {
                        let ids = mark
                            .theme_ids
                            .iter()
                            .map(ToString::to_string)
                            .collect::<Vec<_>>()
                            .join(",");
                        let colors = mark.colors.join(",");
                        out.push_str("<span data-theme-ids=\"");
                        out.push_str(&escape_html(&ids));
                        out.push_str("\" data-colors=\"");
                        out.push_str(&escape_html(&colors));
                        out.push_str("\">");
                        out.push_str(&escape_html(&span.text));
                        out.push_str("</span>");
                    }
                    None => out.push_str(&escape_html(&span.text)),
                }
            }
            out.push_str("</p>");
        }
        out
    }

    /// Merge adjacent spans with identical marks and drop empty spans.
    fn normalize(&mut self) {
        for block in &mut self.blocks {
            let mut merged: Vec<Span> = Vec::with_capacity(block.spans.len());
            for span in block.spans.drain(..) {
                if span.text.is_empty() {
                    continue;
                }
                match merged.last_mut() {
                    Some(prev) if prev.mark == span.mark => prev.text.push_str(&span.text),
                    _ => merged.push(span),
                }
            }
            block.spans = merged;
        }
    }
}

/// Escape text for the HTML form.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split at a character offset, clamped to the string's length.
fn split_chars(s: &str, at: usize) -> (String, String) {
    let byte = s.char_indices().nth(at).map_or(s.len(), |(i, _)| i);
    (s[..byte].to_owned(), s[byte..].to_owned())
}
