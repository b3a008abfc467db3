//! Codebook import/export: XML dialect and spreadsheet (TSV) form.
//!
//! Pure field mapping between the code/group collections and two
//! portable serialized forms. Import is atomic: the payload is parsed
//! completely into a fresh [`Codebook`] before any caller touches the
//! live collections, so a malformed file mutates nothing. Entities get
//! fresh ids on import; what round-trips is the name/color/membership
//! structure, not identity.

#[cfg(test)]
#[path = "exchange_test.rs"]
mod exchange_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::code::{Code, CodeGroup, GroupId};
use crate::rich::escape_html;

const TSV_HEADER: &str = "name\tcolor\tgroup\tcomment";

/// A parsed or exportable code collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Codebook {
    pub codes: Vec<Code>,
    pub groups: Vec<CodeGroup>,
}

/// Serialized codebook form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodebookFormat {
    /// The XML dialect: a `<codebook>` root with self-closing `<group>`
    /// and `<code>` elements.
    Xml,
    /// Tab-separated spreadsheet form with a fixed header row.
    Tsv,
}

/// Error aborting a codebook import. No partial state escapes.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    /// The payload is not this dialect at all (wrong root / header).
    #[error("unrecognized codebook schema: {0}")]
    Schema(String),
    /// The payload matched the schema but an entry cannot be read.
    #[error("malformed codebook entry at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

/// Serialize a codebook.
#[must_use]
pub fn export(book: &Codebook, format: CodebookFormat) -> String {
    match format {
        CodebookFormat::Xml => export_xml(book),
        CodebookFormat::Tsv => export_tsv(book),
    }
}

/// Parse a codebook.
///
/// # Errors
///
/// Returns [`ExchangeError`] when the payload does not carry the
/// expected schema signature or an entry is unreadable.
pub fn import(data: &str, format: CodebookFormat) -> Result<Codebook, ExchangeError> {
    match format {
        CodebookFormat::Xml => import_xml(data),
        CodebookFormat::Tsv => import_tsv(data),
    }
}

// ── XML ─────────────────────────────────────────────────────────

fn export_xml(book: &Codebook) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<codebook>\n");
    for group in &book.groups {
        out.push_str(&format!(
            "  <group id=\"{}\" name=\"{}\"/>\n",
            group.id,
            escape_attr(&group.name)
        ));
    }
    for code in &book.codes {
        out.push_str(&format!(
            "  <code id=\"{}\" name=\"{}\" color=\"{}\"",
            code.id,
            escape_attr(&code.name),
            escape_attr(&code.color)
        ));
        if let Some(group_id) = code.group_id {
            out.push_str(&format!(" group=\"{group_id}\""));
        }
        if let Some(order) = code.order {
            out.push_str(&format!(" order=\"{order}\""));
        }
        if let Some(comment) = &code.comment {
            out.push_str(&format!(" comment=\"{}\"", escape_attr(comment)));
        }
        out.push_str("/>\n");
    }
    out.push_str("</codebook>\n");
    out
}

/// Attribute values additionally escape newlines; the dialect is
/// line-oriented, so a raw newline inside a value would split the element.
fn escape_attr(value: &str) -> String {
    escape_html(value).replace('\n', "&#10;")
}

fn import_xml(data: &str) -> Result<Codebook, ExchangeError> {
    let mut lines = data
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with("<?xml"));

    match lines.next() {
        Some((_, root)) if root == "<codebook>" || root.starts_with("<codebook ") => {}
        _ => return Err(ExchangeError::Schema("missing <codebook> root".to_owned())),
    }

    let mut book = Codebook::default();
    // Exported group id -> freshly assigned id.
    let mut group_ids: HashMap<String, GroupId> = HashMap::new();

    for (line_no, line) in lines {
        if line == "</codebook>" {
            return Ok(book);
        }
        if line.starts_with("<group ") {
            let attrs = parse_attrs(line, line_no)?;
            let exported_id = require_attr(&attrs, "id", line_no)?;
            let name = require_attr(&attrs, "name", line_no)?;
            let Some(group) = CodeGroup::new(&name) else {
                return Err(ExchangeError::Malformed {
                    line: line_no,
                    reason: "group name is blank".to_owned(),
                });
            };
            group_ids.insert(exported_id, group.id);
            book.groups.push(group);
        } else if line.starts_with("<code ") {
            let attrs = parse_attrs(line, line_no)?;
            let name = require_attr(&attrs, "name", line_no)?;
            let color = require_attr(&attrs, "color", line_no)?;
            let Some(mut code) = Code::new(&name, &color) else {
                return Err(ExchangeError::Malformed {
                    line: line_no,
                    reason: "code name is blank".to_owned(),
                });
            };
            if let Some(group_ref) = find_attr(&attrs, "group") {
                match group_ids.get(&group_ref) {
                    Some(id) => code.group_id = Some(*id),
                    None => {
                        return Err(ExchangeError::Malformed {
                            line: line_no,
                            reason: format!("unknown group reference: {group_ref}"),
                        });
                    }
                }
            }
            if let Some(order) = find_attr(&attrs, "order") {
                match order.parse::<f64>() {
                    Ok(value) => code.order = Some(value),
                    Err(_) => {
                        return Err(ExchangeError::Malformed {
                            line: line_no,
                            reason: format!("unreadable order value: {order}"),
                        });
                    }
                }
            }
            if let Some(comment) = find_attr(&attrs, "comment") {
                code.comment = Some(comment);
            }
            book.codes.push(code);
        } else {
            return Err(ExchangeError::Malformed {
                line: line_no,
                reason: format!("unexpected element: {line}"),
            });
        }
    }
    Err(ExchangeError::Schema("missing </codebook> close".to_owned()))
}

fn parse_attrs(line: &str, line_no: usize) -> Result<Vec<(String, String)>, ExchangeError> {
    let mut attrs = Vec::new();
    let mut rest = line;
    while let Some(eq) = rest.find("=\"") {
        let key_start = rest[..eq]
            .rfind(|c: char| c == ' ' || c == '<')
            .map_or(0, |i| i + 1);
        let key = rest[key_start..eq].trim().to_owned();
        let after = &rest[eq + 2..];
        let Some(close) = after.find('"') else {
            return Err(ExchangeError::Malformed {
                line: line_no,
                reason: "unterminated attribute value".to_owned(),
            });
        };
        attrs.push((key, unescape(&after[..close])));
        rest = &after[close + 1..];
    }
    Ok(attrs)
}

fn find_attr(attrs: &[(String, String)], key: &str) -> Option<String> {
    attrs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

fn require_attr(
    attrs: &[(String, String)],
    key: &str,
    line_no: usize,
) -> Result<String, ExchangeError> {
    find_attr(attrs, key).ok_or_else(|| ExchangeError::Malformed {
        line: line_no,
        reason: format!("missing required attribute: {key}"),
    })
}

fn unescape(text: &str) -> String {
    text.replace("&#10;", "\n")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}

// ── TSV ─────────────────────────────────────────────────────────

fn export_tsv(book: &Codebook) -> String {
    let group_names: HashMap<GroupId, &str> = book
        .groups
        .iter()
        .map(|g| (g.id, g.name.as_str()))
        .collect();
    let mut out = String::from(TSV_HEADER);
    out.push('\n');
    for code in &book.codes {
        let group = code
            .group_id
            .and_then(|id| group_names.get(&id).copied())
            .unwrap_or("");
        let comment = code.comment.as_deref().unwrap_or("");
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            sanitize_cell(&code.name),
            sanitize_cell(&code.color),
            sanitize_cell(group),
            sanitize_cell(comment)
        ));
    }
    out
}

fn import_tsv(data: &str) -> Result<Codebook, ExchangeError> {
    let mut lines = data.lines().enumerate().map(|(i, l)| (i + 1, l));
    match lines.next() {
        Some((_, header)) if header.trim_end() == TSV_HEADER => {}
        _ => {
            return Err(ExchangeError::Schema(format!(
                "missing header row: {TSV_HEADER}"
            )));
        }
    }

    let mut book = Codebook::default();
    let mut group_by_name: HashMap<String, GroupId> = HashMap::new();

    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = line.split('\t').collect();
        if cells.len() < 2 {
            return Err(ExchangeError::Malformed {
                line: line_no,
                reason: "expected at least name and color cells".to_owned(),
            });
        }
        let Some(mut code) = Code::new(cells[0], cells[1].trim()) else {
            return Err(ExchangeError::Malformed {
                line: line_no,
                reason: "code name is blank".to_owned(),
            });
        };
        let group_name = cells.get(2).map_or("", |c| c.trim());
        if !group_name.is_empty() {
            let group_id = match group_by_name.get(group_name) {
                Some(id) => *id,
                None => {
                    let id = Uuid::new_v4();
                    group_by_name.insert(group_name.to_owned(), id);
                    book.groups.push(CodeGroup {
                        id,
                        name: group_name.to_owned(),
                    });
                    id
                }
            };
            code.group_id = Some(group_id);
        }
        let comment = cells.get(3).map_or("", |c| c.trim());
        if !comment.is_empty() {
            code.comment = Some(comment.to_owned());
        }
        book.codes.push(code);
    }
    Ok(book)
}

fn sanitize_cell(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}
