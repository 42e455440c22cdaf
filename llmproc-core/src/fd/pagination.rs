//! Deterministic, line-boundary-preferring pagination (spec §4.B).
//!
//! Pages are split on whole lines wherever possible; a single line longer
//! than `page_size` characters is split at `page_size` character boundaries.
//! Concatenating every page's content reproduces the source exactly, and
//! consecutive pages' line ranges are adjacent (only a line that itself got
//! split spans more than one page, in which case its number repeats).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-indexed.
    pub page_number: usize,
    pub content: String,
    /// 1-indexed, inclusive.
    pub line_start: usize,
    /// 1-indexed, inclusive.
    pub line_end: usize,
}

/// Number of lines in `content`: line terminators plus one if `content`
/// does not end with a terminator (spec §8 invariant 3).
pub fn count_lines(content: &str) -> usize {
    content.matches('\n').count() + usize::from(content.is_empty() || !content.ends_with('\n'))
}

fn chunk_by_chars(s: &str, page_size: usize) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    if page_size == 0 {
        return vec![s.to_string()];
    }
    chars
        .chunks(page_size)
        .map(|c| c.iter().collect())
        .collect()
}

/// Split `content` into pages of at most `page_size` characters each,
/// preferring line boundaries.
pub fn paginate(content: &str, page_size: usize) -> Vec<Page> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let mut pages = Vec::new();
    let mut idx = 0usize;
    let mut page_number = 1usize;
    let page_size = page_size.max(1);

    while idx < lines.len() {
        let line = lines[idx];
        let line_char_len = line.chars().count();

        if line_char_len > page_size {
            for chunk in chunk_by_chars(line, page_size) {
                pages.push(Page {
                    page_number,
                    content: chunk,
                    line_start: idx + 1,
                    line_end: idx + 1,
                });
                page_number += 1;
            }
            idx += 1;
            continue;
        }

        let line_start = idx + 1;
        let mut line_end = idx + 1;
        let mut page_content = String::new();
        let mut page_char_len = 0usize;

        while idx < lines.len() {
            let candidate_len = lines[idx].chars().count();
            if candidate_len > page_size {
                break;
            }
            if page_char_len + candidate_len > page_size && !page_content.is_empty() {
                break;
            }
            page_content.push_str(lines[idx]);
            page_char_len += candidate_len;
            line_end = idx + 1;
            idx += 1;
        }

        pages.push(Page {
            page_number,
            content: page_content,
            line_start,
            line_end,
        });
        page_number += 1;
    }

    if pages.is_empty() {
        pages.push(Page {
            page_number: 1,
            content: String::new(),
            line_start: 1,
            line_end: 1,
        });
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenation_reproduces_source() {
        let content = (1..=50)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = paginate(&content, 100);
        let rebuilt: String = pages.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn total_lines_counts_missing_trailing_terminator() {
        assert_eq!(count_lines("a\nb\nc"), 3);
        assert_eq!(count_lines("a\nb\nc\n"), 3);
        assert_eq!(count_lines(""), 1);
    }

    #[test]
    fn oversized_single_line_splits_at_page_size() {
        let content = "x".repeat(250);
        let pages = paginate(&content, 100);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].content.len(), 100);
        assert_eq!(pages[1].content.len(), 100);
        assert_eq!(pages[2].content.len(), 50);
        assert!(pages.iter().all(|p| p.line_start == 1 && p.line_end == 1));
    }

    #[test]
    fn line_ranges_are_adjacent_and_cover_every_line() {
        let content = (1..=20)
            .map(|n| format!("Line {n}"))
            .collect::<Vec<_>>()
            .join("\n");
        let pages = paginate(&content, 30);
        let total = count_lines(&content);
        assert_eq!(pages.first().unwrap().line_start, 1);
        assert_eq!(pages.last().unwrap().line_end, total);
        for window in pages.windows(2) {
            assert!(window[1].line_start <= window[0].line_end + 1);
        }
    }
}
