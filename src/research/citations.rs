use std::collections::BTreeSet;

use crate::types::{ReportDraft, Section, Source};

/// Longest bracket body considered a citation, e.g. `1, 2, 4-6`.
const MAX_MARKER_LEN: usize = 32;
/// Widest range a single marker may span.
const MAX_RANGE: usize = 20;

/// Make a draft's citations consistent with the sources it was given.
///
/// Markers may cite one source (`[2]`), a list (`[1, 3]`) or a range
/// (`[2-4]`). Numbers outside `1..=sources.len()` are removed from section
/// bodies, a marker left with no valid number is dropped entirely, and
/// `citations` is rebuilt as the cited sources in numbering order.
pub fn normalize_citations(draft: ReportDraft, sources: &[Source]) -> ReportDraft {
    let mut cited = BTreeSet::new();

    let sections = draft
        .sections
        .into_iter()
        .map(|section| Section {
            body: rewrite_markers(&section.body, sources.len(), &mut cited),
            heading: section.heading,
        })
        .collect();

    ReportDraft {
        title: draft.title,
        sections,
        citations: cited.into_iter().map(|n| sources[n - 1].clone()).collect(),
    }
}

fn rewrite_markers(body: &str, source_count: usize, cited: &mut BTreeSet<usize>) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let marker = after
            .find(']')
            .map(|close| &after[..close])
            .and_then(|inner| parse_marker(inner).map(|numbers| (inner, numbers)));

        let Some((inner, numbers)) = marker else {
            out.push('[');
            rest = after;
            continue;
        };
        rest = &after[inner.len() + 1..];

        let mut kept: Vec<usize> = numbers
            .iter()
            .copied()
            .filter(|n| (1..=source_count).contains(n))
            .collect();
        kept.dedup();
        cited.extend(kept.iter().copied());

        if kept.len() == numbers.len() {
            out.push('[');
            out.push_str(inner);
            out.push(']');
        } else if !kept.is_empty() {
            let list: Vec<String> = kept.iter().map(usize::to_string).collect();
            out.push('[');
            out.push_str(&list.join(", "));
            out.push(']');
        } else if rest.is_empty() || rest.starts_with(['.', ',', ';', ':', '!', '?', ')']) {
            // Dropped marker; don't leave "word ." behind
            let kept_len = out.trim_end_matches(' ').len();
            out.truncate(kept_len);
        } else if (out.is_empty() || out.ends_with([' ', '\n'])) && rest.starts_with(' ') {
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

/// Numbers cited by a bracket body such as `3`, `1, 2` or `2-4`.
fn parse_marker(inner: &str) -> Option<Vec<usize>> {
    if inner.is_empty() || inner.len() > MAX_MARKER_LEN {
        return None;
    }

    let mut numbers = Vec::new();
    for part in inner.split(',') {
        let (start, end) = match part.split_once(['-', '\u{2013}']) {
            Some((a, b)) => (parse_number(a)?, parse_number(b)?),
            None => {
                let n = parse_number(part)?;
                (n, n)
            }
        };
        if end < start || end - start > MAX_RANGE {
            return None;
        }
        numbers.extend(start..=end);
    }
    Some(numbers)
}

fn parse_number(text: &str) -> Option<usize> {
    let text = text.trim();
    if text.is_empty() || text.len() > 4 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
