//! Extracts paragraphs and emphasised runs from a DOCX container.
//!
//! Only what the templates use is read: paragraph style, alignment, and the
//! bold/italic/underline flags of each run. Tables are skipped entirely.
//! `w:tab` becomes a tab and `w:br` a space, since a block is a single line.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::ConversionError;
use crate::rich::{Alignment, RichParagraph, RichRun};

pub const DOCUMENT_PART: &str = "word/document.xml";
pub const STYLES_PART: &str = "word/styles.xml";

/// Reads every body paragraph of a DOCX file, in order.
pub fn read_rich_document(bytes: &[u8]) -> Result<Vec<RichParagraph>, ConversionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let document = read_part(&mut archive, DOCUMENT_PART)?
        .ok_or_else(|| ConversionError::MissingPart(DOCUMENT_PART.to_string()))?;
    let style_names = match read_part(&mut archive, STYLES_PART)? {
        Some(styles) => parse_style_names(&styles)?,
        None => HashMap::new(),
    };

    let paragraphs = parse_document(&document, &style_names)?;
    tracing::debug!(
        paragraphs = paragraphs.len(),
        styles = style_names.len(),
        "read rich document"
    );
    Ok(paragraphs)
}

fn read_part<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, ConversionError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn attr_value(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, quick_xml::Error> {
    for attr in element.attributes().with_checks(false) {
        let attr = attr?;
        if attr.key.local_name().as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// `w:b`, `w:i` without `w:val` switch the property on; `0`, `false` and
/// `off` switch it off.
fn toggle_property(element: &BytesStart<'_>) -> Result<bool, quick_xml::Error> {
    Ok(match attr_value(element, b"val")? {
        None => true,
        Some(v) => !matches!(v.as_str(), "0" | "false" | "off"),
    })
}

fn underline_property(element: &BytesStart<'_>) -> Result<bool, quick_xml::Error> {
    Ok(match attr_value(element, b"val")? {
        None => true,
        Some(v) => v != "none",
    })
}

/// Maps style ids (`Heading2`) to their display names (`heading 2`).
fn parse_style_names(xml: &str) -> Result<HashMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut names = HashMap::new();
    let mut current_id: Option<String> = None;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"style" => {
                current_id = attr_value(&e, b"styleId")?;
            }
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"name" => {
                if let (Some(id), Some(name)) = (current_id.as_ref(), attr_value(&e, b"val")?) {
                    names.insert(id.clone(), name);
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"style" => current_id = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(names)
}

#[derive(Default)]
struct DocumentState {
    paragraphs: Vec<RichParagraph>,
    paragraph: Option<RichParagraph>,
    run: Option<RichRun>,
    table_depth: usize,
    in_paragraph_properties: bool,
    in_text: bool,
}

impl DocumentState {
    fn push_text(&mut self, text: &str) {
        if let Some(run) = self.run.as_mut() {
            run.text.push_str(text);
        }
    }

    fn finish_run(&mut self) {
        if let (Some(run), Some(paragraph)) = (self.run.take(), self.paragraph.as_mut()) {
            paragraph.runs.push(run);
        }
    }

    fn finish_paragraph(&mut self) {
        self.finish_run();
        if let Some(paragraph) = self.paragraph.take() {
            self.paragraphs.push(paragraph);
        }
    }

    /// Handles an opening or self-closing element.
    fn open(
        &mut self,
        e: &BytesStart<'_>,
        is_empty: bool,
        style_names: &HashMap<String, String>,
    ) -> Result<(), quick_xml::Error> {
        let local = e.local_name();
        if local.as_ref() == b"tbl" {
            if !is_empty {
                self.table_depth += 1;
            }
            return Ok(());
        }
        if self.table_depth > 0 {
            return Ok(());
        }

        match local.as_ref() {
            b"p" => {
                self.finish_paragraph();
                self.paragraph = Some(RichParagraph::default());
                if is_empty {
                    self.finish_paragraph();
                }
            }
            b"pPr" if !is_empty => self.in_paragraph_properties = true,
            b"pStyle" if self.in_paragraph_properties => {
                if let (Some(paragraph), Some(id)) = (self.paragraph.as_mut(), attr_value(e, b"val")?) {
                    paragraph.style = Some(style_names.get(&id).cloned().unwrap_or(id));
                }
            }
            b"jc" if self.in_paragraph_properties => {
                if let Some(paragraph) = self.paragraph.as_mut() {
                    paragraph.alignment = match attr_value(e, b"val")?.as_deref() {
                        Some("center") => Alignment::Center,
                        _ => Alignment::Justify,
                    };
                }
            }
            b"r" if self.paragraph.is_some() => {
                self.finish_run();
                if !is_empty {
                    self.run = Some(RichRun::default());
                }
            }
            // paragraph-mark properties inside pPr do not style any text
            b"b" if !self.in_paragraph_properties => {
                let on = toggle_property(e)?;
                if let Some(run) = self.run.as_mut() {
                    run.bold = on;
                }
            }
            b"i" if !self.in_paragraph_properties => {
                let on = toggle_property(e)?;
                if let Some(run) = self.run.as_mut() {
                    run.italic = on;
                }
            }
            b"u" if !self.in_paragraph_properties => {
                let on = underline_property(e)?;
                if let Some(run) = self.run.as_mut() {
                    run.underline = on;
                }
            }
            b"t" if !is_empty => self.in_text = true,
            b"tab" if !self.in_paragraph_properties => self.push_text("\t"),
            b"br" | b"cr" => self.push_text(" "),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, local: &[u8]) {
        if local == b"tbl" {
            self.table_depth = self.table_depth.saturating_sub(1);
            return;
        }
        if self.table_depth > 0 {
            return;
        }
        match local {
            b"p" => self.finish_paragraph(),
            b"pPr" => self.in_paragraph_properties = false,
            b"r" => self.finish_run(),
            b"t" => self.in_text = false,
            _ => {}
        }
    }
}

fn parse_document(
    xml: &str,
    style_names: &HashMap<String, String>,
) -> Result<Vec<RichParagraph>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut state = DocumentState::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => state.open(&e, false, style_names)?,
            Event::Empty(e) => state.open(&e, true, style_names)?,
            Event::End(e) => state.close(e.local_name().as_ref()),
            Event::Text(t) if state.in_text && state.table_depth == 0 => {
                let text = t.unescape()?;
                state.push_text(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    state.finish_paragraph();
    Ok(state.paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const W: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

    fn docx_with(document_body: &str, styles: Option<&str>) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        zip.start_file(DOCUMENT_PART, options).unwrap();
        write!(zip, r#"<?xml version="1.0"?><w:document {W}><w:body>{document_body}</w:body></w:document>"#).unwrap();
        if let Some(styles) = styles {
            zip.start_file(STYLES_PART, options).unwrap();
            write!(zip, r#"<?xml version="1.0"?><w:styles {W}>{styles}</w:styles>"#).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_runs_and_emphasis() {
        let bytes = docx_with(
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Bold</w:t></w:r><w:r><w:t xml:space="preserve"> and </w:t></w:r><w:r><w:rPr><w:i w:val="1"/><w:u w:val="single"/></w:rPr><w:t>both</w:t></w:r><w:r><w:rPr><w:b w:val="0"/></w:rPr><w:t>!</w:t></w:r></w:p>"#,
            None,
        );
        let paragraphs = read_rich_document(&bytes).unwrap();
        assert_eq!(paragraphs.len(), 1);
        let runs = &paragraphs[0].runs;
        assert_eq!(runs.len(), 4);
        assert!(runs[0].bold);
        assert_eq!(runs[1].text, " and ");
        assert!(runs[2].italic && runs[2].underline && !runs[2].bold);
        assert!(!runs[3].bold);
    }

    #[test]
    fn test_style_display_names() {
        let bytes = docx_with(
            r#"<w:p><w:pPr><w:pStyle w:val="Ttulo2"/><w:rPr><w:b/></w:rPr></w:pPr><w:r><w:t>Achados</w:t></w:r></w:p>"#,
            Some(r#"<w:style w:type="paragraph" w:styleId="Ttulo2"><w:name w:val="heading 2"/></w:style>"#),
        );
        let paragraphs = read_rich_document(&bytes).unwrap();
        assert_eq!(paragraphs[0].style.as_deref(), Some("heading 2"));
        assert!(!paragraphs[0].runs[0].bold);
    }

    #[test]
    fn test_style_id_without_styles_part() {
        let bytes = docx_with(
            r#"<w:p><w:pPr><w:pStyle w:val="Heading3"/><w:jc w:val="center"/></w:pPr><w:r><w:t>x</w:t></w:r></w:p>"#,
            None,
        );
        let paragraphs = read_rich_document(&bytes).unwrap();
        assert_eq!(paragraphs[0].style.as_deref(), Some("Heading3"));
        assert_eq!(paragraphs[0].alignment, Alignment::Center);
    }

    #[test]
    fn test_tables_skipped_and_breaks() {
        let bytes = docx_with(
            r#"<w:p/><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c &amp; d</w:t></w:r></w:p>"#,
            None,
        );
        let paragraphs = read_rich_document(&bytes).unwrap();
        assert_eq!(paragraphs.len(), 2);
        assert!(paragraphs[0].runs.is_empty());
        assert_eq!(paragraphs[1].runs[0].text, "a b\tc & d");
    }

    #[test]
    fn test_not_an_archive() {
        let err = read_rich_document(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ConversionError::Archive(_)));
    }

    #[test]
    fn test_missing_document_part() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        let err = read_rich_document(&bytes).unwrap_err();
        assert!(matches!(err, ConversionError::MissingPart(ref p) if p == DOCUMENT_PART));
    }

    #[test]
    fn test_malformed_xml() {
        let bytes = docx_with("<w:p><w:r><w:t>open</w:r></w:p>", None);
        assert!(matches!(read_rich_document(&bytes), Err(ConversionError::Xml(_))));
    }
}
