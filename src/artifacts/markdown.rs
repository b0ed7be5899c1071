use crate::artifacts::document::{reference_lines, NO_SOURCES_TEXT, REFERENCES_HEADING};
use crate::types::{ReportDraft, Source};

/// Markdown report: title, sections with bodies verbatim, then references.
pub fn render_markdown(draft: &ReportDraft, sources: &[Source]) -> String {
    let mut out = format!("# {}\n", draft.title);

    for section in &draft.sections {
        out.push('\n');
        if !section.heading.is_empty() {
            out.push_str(&format!("## {}\n\n", section.heading));
        }
        out.push_str(section.body.trim_end());
        out.push('\n');
    }

    out.push_str(&format!("\n## {}\n\n", REFERENCES_HEADING));
    if sources.is_empty() {
        out.push_str(NO_SOURCES_TEXT);
        out.push('\n');
    } else {
        // Blank line between entries so each renders on its own line
        out.push_str(&reference_lines(sources).join("\n\n"));
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Section;

    #[test]
    fn test_render_markdown() {
        let draft = ReportDraft {
            title: "Tides".to_string(),
            sections: vec![
                Section {
                    heading: "Introduction".to_string(),
                    body: "The moon pulls [1].\n\n- spring\n- neap\n".to_string(),
                },
                Section {
                    heading: "Conclusion".to_string(),
                    body: "Done.".to_string(),
                },
            ],
            citations: Vec::new(),
        };
        let sources = vec![Source {
            title: "Tide".to_string(),
            url: Some("https://en.wikipedia.org/wiki/Tide".to_string()),
            summary: "s".to_string(),
            query: "tides".to_string(),
        }];

        let expected = "# Tides\n\n## Introduction\n\nThe moon pulls [1].\n\n- spring\n- neap\n\n## Conclusion\n\nDone.\n\n## References\n\n[1] Tide (https://en.wikipedia.org/wiki/Tide)\n";
        assert_eq!(render_markdown(&draft, &sources), expected);
    }

    #[test]
    fn test_render_markdown_without_sources() {
        let draft = ReportDraft {
            title: "Tides".to_string(),
            sections: Vec::new(),
            citations: Vec::new(),
        };
        let md = render_markdown(&draft, &[]);
        assert!(md.ends_with("## References\n\nNo external sources were retrieved for this report.\n"));
    }
}
