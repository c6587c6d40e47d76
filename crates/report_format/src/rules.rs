//! Formatting conventions of the report templates.
//!
//! Defaults reproduce the house style (Arial 10pt body, 8pt italic closing
//! line, Portuguese section headers). Every field can be overridden from a
//! TOML table; missing keys keep their default.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FormatRules {
    /// Font family written on every run.
    pub font_family: String,
    /// Body text size in points.
    pub body_size_pt: u32,
    /// Size of the last non-blank line in points.
    pub last_line_size_pt: u32,
    /// Line prefixes (compared case-insensitively) that open a report section.
    pub section_keywords: Vec<String>,
    /// Treat short plain-text lines ending with `:` as section headers.
    pub colon_headings: bool,
    /// Longest line, in characters, the colon rule applies to.
    pub colon_heading_max_len: usize,
    pub legacy: LegacyRules,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            body_size_pt: 10,
            last_line_size_pt: 8,
            section_keywords: [
                "técnica do exame:",
                "aspectos observados:",
                "impressão:",
                "informe clínico:",
                "indicação clínica:",
                "indicação:",
                "technique:",
                "findings:",
                "impression:",
                "clinical information:",
                "indication:",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            colon_headings: true,
            colon_heading_max_len: 120,
            legacy: LegacyRules::default(),
        }
    }
}

impl FormatRules {
    /// Whether `text` opens with one of the section keywords.
    pub fn starts_with_section_keyword(&self, text: &str) -> bool {
        let lowered = text.trim().to_lowercase();
        self.section_keywords
            .iter()
            .any(|k| lowered.starts_with(&k.to_lowercase()))
    }

    /// Short line ending with a colon, e.g. `Conclusão:`.
    pub fn is_colon_heading(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.colon_headings
            && trimmed.ends_with(':')
            && trimmed.chars().count() <= self.colon_heading_max_len
    }

    /// Font sizes in the half-point unit used by DOCX.
    pub fn body_half_points(&self) -> u32 {
        self.body_size_pt * 2
    }

    pub fn last_line_half_points(&self) -> u32 {
        self.last_line_size_pt * 2
    }
}

/// Heuristics for text recovered from legacy RTF templates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LegacyRules {
    /// Words that mark an all-caps line as the exam title.
    pub title_keywords: Vec<String>,
    /// Phrases that mark a line as belonging to a section header.
    pub section_phrases: Vec<String>,
    /// Words a section header line must start with to be emboldened.
    pub section_starts: Vec<String>,
    /// Words that mark a disclaimer/footnote line, rendered italic.
    pub footnote_keywords: Vec<String>,
    /// Lines consisting only of one of these names are font-table residue.
    pub font_names: Vec<String>,
}

impl Default for LegacyRules {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            title_keywords: owned(&["TOMOGRAFIA", "ANGIO", "COMPUTADORIZADA"]),
            section_phrases: owned(&[
                "indicação clínica",
                "técnica do exame",
                "aspectos observados",
                "impressão",
            ]),
            section_starts: owned(&["indicação", "técnica", "aspectos", "impressão"]),
            footnote_keywords: owned(&["probabilidade", "médico", "diagnóstica"]),
            font_names: owned(&[
                "times new roman",
                "arial",
                "calibri",
                "helvetica",
                "trebuchet ms",
                "cambria",
                "times",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_keyword_case_insensitive() {
        let rules = FormatRules::default();
        assert!(rules.starts_with_section_keyword("TÉCNICA DO EXAME: helicoidal"));
        assert!(rules.starts_with_section_keyword("  Findings: clear."));
        assert!(!rules.starts_with_section_keyword("Sem achados relevantes."));
    }

    #[test]
    fn test_colon_heading() {
        let mut rules = FormatRules::default();
        assert!(rules.is_colon_heading("Conclusão:"));
        assert!(!rules.is_colon_heading("Conclusão: normal"));
        assert!(!rules.is_colon_heading(&format!("{}:", "x".repeat(120))));

        rules.colon_headings = false;
        assert!(!rules.is_colon_heading("Conclusão:"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let rules: FormatRules = toml::from_str(
            r#"
            font_family = "Calibri"

            [legacy]
            footnote_keywords = ["aviso"]
            "#,
        )
        .unwrap();
        assert_eq!(rules.font_family, "Calibri");
        assert_eq!(rules.body_size_pt, 10);
        assert_eq!(rules.legacy.footnote_keywords, vec!["aviso".to_string()]);
        assert_eq!(rules.legacy.title_keywords.len(), 3);
    }
}
