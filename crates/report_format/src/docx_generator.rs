use std::io::{Cursor, Seek, Write};

use quick_xml::escape::escape;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::ConversionError;
use crate::classifier::HeadingLevel;
use crate::rich::{RichParagraph, RichRun};
use crate::rules::FormatRules;

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Writes formatted paragraphs as a minimal DOCX package.
pub struct DocxGenerator {
    paragraphs: Vec<RichParagraph>,
    font_family: String,
    body_half_points: u32,
}

impl DocxGenerator {
    /// An empty paragraph list still produces a valid document holding one
    /// empty paragraph.
    pub fn new(paragraphs: Vec<RichParagraph>, rules: &FormatRules) -> Self {
        DocxGenerator {
            paragraphs,
            font_family: rules.font_family.clone(),
            body_half_points: rules.body_half_points(),
        }
    }

    pub fn write_to_vec(&self) -> Result<Vec<u8>, ConversionError> {
        let cursor = self.write_to(Cursor::new(Vec::new()))?;
        Ok(cursor.into_inner())
    }

    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W, ConversionError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.generate_content_types().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(self.generate_package_rels().as_bytes())?;

        zip.start_file("word/_rels/document.xml.rels", options)?;
        zip.write_all(self.generate_document_rels().as_bytes())?;

        zip.start_file("word/styles.xml", options)?;
        zip.write_all(self.generate_styles().as_bytes())?;

        zip.start_file("word/document.xml", options)?;
        zip.write_all(self.generate_document().as_bytes())?;

        let writer = zip.finish()?;
        tracing::debug!(paragraphs = self.paragraphs.len(), "wrote rich document");
        Ok(writer)
    }

    fn generate_content_types(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#
            .to_string()
    }

    fn generate_package_rels(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
            .to_string()
    }

    fn generate_document_rels(&self) -> String {
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#
            .to_string()
    }

    fn generate_styles(&self) -> String {
        let font = escape(self.font_family.as_str());
        let size = self.body_half_points;
        let headings: String = (HeadingLevel::MIN..=HeadingLevel::MAX)
            .map(|n| {
                format!(
                    r#"<w:style w:type="paragraph" w:styleId="Heading{n}"><w:name w:val="heading {n}"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:rPr><w:b/></w:rPr></w:style>
"#
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="{WORDPROCESSING_NS}">
<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:before="0" w:after="0" w:line="240" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>
<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
{headings}</w:styles>"#
        )
    }

    fn generate_document(&self) -> String {
        let mut body = String::new();
        if self.paragraphs.is_empty() {
            let empty = RichParagraph {
                font_family: self.font_family.clone(),
                half_points: self.body_half_points,
                ..Default::default()
            };
            push_paragraph(&mut body, &empty);
        }
        for paragraph in &self.paragraphs {
            push_paragraph(&mut body, paragraph);
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{WORDPROCESSING_NS}">
<w:body>
{body}<w:sectPr/>
</w:body>
</w:document>"#
        )
    }
}

/// `Heading 2` → `Heading2`.
fn style_id(style: &str) -> String {
    style.split_whitespace().collect()
}

fn push_paragraph(out: &mut String, paragraph: &RichParagraph) {
    out.push_str("<w:p><w:pPr>");
    if let Some(style) = &paragraph.style {
        out.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, escape(style_id(style).as_str())));
    }
    out.push_str(r#"<w:spacing w:before="0" w:after="0" w:line="240" w:lineRule="auto"/>"#);
    out.push_str(&format!(r#"<w:jc w:val="{}"/></w:pPr>"#, paragraph.alignment.as_docx()));

    for run in paragraph.runs.iter().filter(|r| !r.text.is_empty()) {
        push_run(out, run, paragraph);
    }
    out.push_str("</w:p>\n");
}

fn push_run(out: &mut String, run: &RichRun, paragraph: &RichParagraph) {
    let font = escape(paragraph.font_family.as_str());
    let size = paragraph.half_points;

    out.push_str("<w:r><w:rPr>");
    out.push_str(&format!(r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#));
    if run.bold {
        out.push_str("<w:b/><w:bCs/>");
    }
    if run.italic {
        out.push_str("<w:i/><w:iCs/>");
    }
    out.push_str(&format!(r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#));
    if run.underline {
        out.push_str(r#"<w:u w:val="single"/>"#);
    }
    out.push_str("</w:rPr>");

    // tabs are elements of their own in WordprocessingML
    for (i, piece) in run.text.split('\t').enumerate() {
        if i > 0 {
            out.push_str("<w:tab/>");
        }
        if !piece.is_empty() {
            out.push_str(&format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape(piece)));
        }
    }
    out.push_str("</w:r>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx_reader::read_rich_document;
    use crate::rich::Alignment;
    use std::io::Read;
    use zip::ZipArchive;

    fn paragraph(text: &str) -> RichParagraph {
        RichParagraph {
            font_family: "Arial".into(),
            half_points: 20,
            runs: vec![RichRun { text: text.into(), ..Default::default() }],
            ..Default::default()
        }
    }

    fn part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_package_parts() {
        let bytes = DocxGenerator::new(vec![paragraph("x")], &FormatRules::default())
            .write_to_vec()
            .unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "word/_rels/document.xml.rels",
                "word/document.xml",
                "word/styles.xml",
            ]
        );
        let styles = part(&bytes, "word/styles.xml");
        assert!(styles.contains(r#"w:styleId="Heading6""#));
        assert!(styles.contains(r#"w:ascii="Arial""#));
    }

    #[test]
    fn test_empty_input_writes_one_paragraph() {
        let bytes = DocxGenerator::new(Vec::new(), &FormatRules::default())
            .write_to_vec()
            .unwrap();
        let document = part(&bytes, "word/document.xml");
        assert_eq!(document.matches("<w:p>").count(), 1);
        assert_eq!(read_rich_document(&bytes).unwrap().len(), 1);
    }

    #[test]
    fn test_escaping_and_tabs() {
        let bytes = DocxGenerator::new(vec![paragraph("a < b & \"c\"\td")], &FormatRules::default())
            .write_to_vec()
            .unwrap();
        let document = part(&bytes, "word/document.xml");
        assert!(document.contains("a &lt; b &amp; &quot;c&quot;"));
        assert!(document.contains("<w:tab/>"));

        let paragraphs = read_rich_document(&bytes).unwrap();
        assert_eq!(paragraphs[0].runs[0].text, "a < b & \"c\"\td");
    }

    #[test]
    fn test_run_properties() {
        let mut p = paragraph("x");
        p.style = Some("Heading 3".into());
        p.alignment = Alignment::Center;
        p.half_points = 16;
        p.runs[0].bold = true;
        p.runs[0].italic = true;
        p.runs[0].underline = true;
        let bytes = DocxGenerator::new(vec![p], &FormatRules::default())
            .write_to_vec()
            .unwrap();
        let document = part(&bytes, "word/document.xml");
        assert!(document.contains(r#"<w:pStyle w:val="Heading3"/>"#));
        assert!(document.contains(r#"<w:jc w:val="center"/>"#));
        assert!(document.contains(r#"<w:sz w:val="16"/>"#));
        assert!(document.contains(r#"<w:u w:val="single"/>"#));

        let read = read_rich_document(&bytes).unwrap();
        assert_eq!(read[0].style.as_deref(), Some("heading 3"));
        assert!(read[0].runs[0].bold && read[0].runs[0].italic && read[0].runs[0].underline);
    }
}
