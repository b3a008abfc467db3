use super::*;

fn sample_book() -> Codebook {
    let group = CodeGroup::new("Emotions").unwrap();
    let mut joy = Code::new("joy", "#FDD835").unwrap();
    joy.group_id = Some(group.id);
    joy.order = Some(1.0);
    let mut anger = Code::new("anger", "#E53935").unwrap();
    anger.group_id = Some(group.id);
    anger.comment = Some("raised voice, clenched fists".to_owned());
    let context = Code::new("context", "#1E88E5").unwrap();
    Codebook {
        codes: vec![joy, anger, context],
        groups: vec![group],
    }
}

// =============================================================
// XML export
// =============================================================

#[test]
fn xml_export_has_codebook_root() {
    let xml = export(&sample_book(), CodebookFormat::Xml);
    assert!(xml.starts_with("<?xml version=\"1.0\""));
    assert!(xml.contains("<codebook>"));
    assert!(xml.trim_end().ends_with("</codebook>"));
}

#[test]
fn xml_export_escapes_attribute_values() {
    let book = Codebook {
        codes: vec![Code::new("risk \"high\" & rising", "#111111").unwrap()],
        groups: Vec::new(),
    };
    let xml = export(&book, CodebookFormat::Xml);
    assert!(xml.contains("risk &quot;high&quot; &amp; rising"));
    assert!(!xml.contains("\"high\" &"));
}

// =============================================================
// XML import
// =============================================================

#[test]
fn xml_round_trip_preserves_names_colors_membership() {
    let book = sample_book();
    let xml = export(&book, CodebookFormat::Xml);
    let imported = import(&xml, CodebookFormat::Xml).unwrap();

    assert_eq!(imported.codes.len(), 3);
    assert_eq!(imported.groups.len(), 1);
    assert_eq!(imported.groups[0].name, "Emotions");

    let joy = imported.codes.iter().find(|c| c.name == "joy").unwrap();
    assert_eq!(joy.color, "#FDD835");
    assert_eq!(joy.group_id, Some(imported.groups[0].id));
    assert_eq!(joy.order, Some(1.0));

    let anger = imported.codes.iter().find(|c| c.name == "anger").unwrap();
    assert_eq!(anger.comment.as_deref(), Some("raised voice, clenched fists"));

    let context = imported.codes.iter().find(|c| c.name == "context").unwrap();
    assert!(context.group_id.is_none());
}

#[test]
fn xml_import_assigns_fresh_ids() {
    let book = sample_book();
    let xml = export(&book, CodebookFormat::Xml);
    let imported = import(&xml, CodebookFormat::Xml).unwrap();
    assert!(imported.codes.iter().all(|c| book.codes.iter().all(|o| o.id != c.id)));
    assert_ne!(imported.groups[0].id, book.groups[0].id);
}

#[test]
fn xml_import_rejects_wrong_root() {
    let err = import("<themes><theme/></themes>", CodebookFormat::Xml).unwrap_err();
    assert!(matches!(err, ExchangeError::Schema(_)));
}

#[test]
fn xml_import_rejects_unknown_group_reference() {
    let xml = "<codebook>\n  <code id=\"x\" name=\"a\" color=\"#fff\" group=\"ghost\"/>\n</codebook>";
    let err = import(xml, CodebookFormat::Xml).unwrap_err();
    assert!(matches!(err, ExchangeError::Malformed { .. }));
}

#[test]
fn xml_import_rejects_missing_close() {
    let xml = "<codebook>\n  <group id=\"g\" name=\"G\"/>";
    let err = import(xml, CodebookFormat::Xml).unwrap_err();
    assert!(matches!(err, ExchangeError::Schema(_)));
}

#[test]
fn xml_import_rejects_unreadable_order() {
    let xml = "<codebook>\n  <code id=\"x\" name=\"a\" color=\"#fff\" order=\"abc\"/>\n</codebook>";
    let err = import(xml, CodebookFormat::Xml).unwrap_err();
    assert!(matches!(err, ExchangeError::Malformed { .. }));
}

#[test]
fn xml_import_unescapes_values() {
    let xml = "<codebook>\n  <code id=\"x\" name=\"a &amp; b\" color=\"#fff\"/>\n</codebook>";
    let imported = import(xml, CodebookFormat::Xml).unwrap();
    assert_eq!(imported.codes[0].name, "a & b");
}

// =============================================================
// TSV
// =============================================================

#[test]
fn tsv_export_has_header_and_rows() {
    let tsv = export(&sample_book(), CodebookFormat::Tsv);
    let mut lines = tsv.lines();
    assert_eq!(lines.next(), Some("name\tcolor\tgroup\tcomment"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn tsv_round_trip_preserves_membership_by_group_name() {
    let tsv = export(&sample_book(), CodebookFormat::Tsv);
    let imported = import(&tsv, CodebookFormat::Tsv).unwrap();
    assert_eq!(imported.codes.len(), 3);
    assert_eq!(imported.groups.len(), 1);
    let joy = imported.codes.iter().find(|c| c.name == "joy").unwrap();
    assert_eq!(joy.group_id, Some(imported.groups[0].id));
    let context = imported.codes.iter().find(|c| c.name == "context").unwrap();
    assert!(context.group_id.is_none());
}

#[test]
fn tsv_import_rejects_missing_header() {
    let err = import("joy\t#FDD835\t\t\n", CodebookFormat::Tsv).unwrap_err();
    assert!(matches!(err, ExchangeError::Schema(_)));
}

#[test]
fn tsv_import_rejects_short_row() {
    let data = "name\tcolor\tgroup\tcomment\nlonely-cell\n";
    let err = import(data, CodebookFormat::Tsv).unwrap_err();
    assert!(matches!(err, ExchangeError::Malformed { line: 2, .. }));
}

#[test]
fn tsv_import_skips_blank_lines() {
    let data = "name\tcolor\tgroup\tcomment\njoy\t#FDD835\t\t\n\n";
    let imported = import(data, CodebookFormat::Tsv).unwrap();
    assert_eq!(imported.codes.len(), 1);
}

#[test]
fn tsv_export_flattens_tabs_in_names() {
    let book = Codebook {
        codes: vec![Code::new("has\tsome tab", "#111111").unwrap()],
        groups: Vec::new(),
    };
    let tsv = export(&book, CodebookFormat::Tsv);
    let imported = import(&tsv, CodebookFormat::Tsv).unwrap();
    assert_eq!(imported.codes[0].name, "has some tab");
}

#[test]
fn xml_round_trips_multiline_comment() {
    let mut code = Code::new("grief", "#6D4C41").unwrap();
    code.comment = Some("line one\nline two".to_owned());
    let book = Codebook { codes: vec![code], groups: Vec::new() };
    let xml = export(&book, CodebookFormat::Xml);
    let imported = import(&xml, CodebookFormat::Xml).unwrap();
    assert_eq!(imported.codes[0].comment.as_deref(), Some("line one\nline two"));
}

#[test]
fn empty_codebook_round_trips_in_both_formats() {
    for format in [CodebookFormat::Xml, CodebookFormat::Tsv] {
        let out = export(&Codebook::default(), format);
        let imported = import(&out, format).unwrap();
        assert!(imported.codes.is_empty());
        assert!(imported.groups.is_empty());
    }
}
