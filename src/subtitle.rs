//! SRT codec.
//!
//! Parsing is lenient: a block that lacks a numeric index line, a
//! `HH:MM:SS,mmm --> HH:MM:SS,mmm` timing line, or at least one text line
//! is skipped rather than failing the whole document. Third-party subtitle
//! files are often slightly broken and a partial document is more useful
//! than none.
//!
//! Timestamps are carried as the strings found in the source and are
//! never reinterpreted.

use once_cell::sync::Lazy;
use regex::Regex;

static TIMING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2}:\d{2}:\d{2},\d{3})\s*-->\s*(\d{2}:\d{2}:\d{2},\d{3})")
        .expect("timing pattern is valid")
});

/// A blank line between blocks; may carry stray spaces or tabs
static BLOCK_SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n[ \t]*\n").expect("separator pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    /// Sequence number as written in the source, gaps included
    pub index: u32,
    pub start: String,
    pub end: String,
    /// Cue text; may span several lines
    pub text: String,
}

/// Parse SRT bytes into entries in source order.
pub fn parse(content: &[u8]) -> Vec<SubtitleEntry> {
    let text = String::from_utf8_lossy(content);
    let text = text.trim_start_matches('\u{feff}');
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    BLOCK_SEPARATOR_RE
        .split(&normalized)
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<SubtitleEntry> {
    let block = block.trim();
    if block.is_empty() {
        return None;
    }

    let lines: Vec<&str> = block.split('\n').collect();
    if lines.len() < 3 {
        return None;
    }

    let index = lines[0].trim().parse::<u32>().ok()?;
    let timing = TIMING_RE.captures(lines[1])?;
    let text = lines[2..].join("\n").trim().to_string();
    if text.is_empty() {
        return None;
    }

    Some(SubtitleEntry {
        index,
        start: timing[1].to_string(),
        end: timing[2].to_string(),
        text,
    })
}

/// Serialize entries in the order given. No sorting or renumbering.
pub fn format(entries: &[SubtitleEntry]) -> String {
    let mut out = String::new();

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n",
            entry.index, entry.start, entry.end, entry.text
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello there.\n\n\
                          3\n00:00:03,000 --> 00:00:05,000\n<i>Two</i>\nlines\n\n\
                          7\n00:01:00,000 --> 00:01:02,000\nLast one.\n";

    #[test]
    fn test_parse_keeps_indices_and_timestamps() {
        let entries = parse(SAMPLE.as_bytes());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 3, 7]);
        assert_eq!(entries[0].start, "00:00:01,000");
        assert_eq!(entries[0].end, "00:00:02,500");
        assert_eq!(entries[1].text, "<i>Two</i>\nlines");
    }

    #[test]
    fn test_format_reproduces_well_formed_input() {
        let entries = parse(SAMPLE.as_bytes());
        assert_eq!(format(&entries), SAMPLE);
    }

    #[test]
    fn test_crlf_input_round_trips_modulo_line_endings() {
        let crlf = SAMPLE.replace('\n', "\r\n");
        let entries = parse(crlf.as_bytes());
        assert_eq!(entries, parse(SAMPLE.as_bytes()));
        assert_eq!(format(&entries), SAMPLE);
    }

    #[test]
    fn test_malformed_blocks_are_dropped() {
        let input = "x\n00:00:01,000 --> 00:00:02,000\nbad index\n\n\
                     2\n00:00:01 --> 00:00:02\nbad timing\n\n\
                     3\n00:00:04,000 --> 00:00:05,000\n\n\
                     4\n00:00:06,000 --> 00:00:07,000\nkept\n";
        let entries = parse(input.as_bytes());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].index, 4);
        assert_eq!(entries[0].text, "kept");
    }

    #[test]
    fn test_whitespace_only_separator_splits_blocks() {
        let input = "1\n00:00:01,000 --> 00:00:02,000\nA\n \n\
                     2\n00:00:03,000 --> 00:00:04,000\nB\n\t\n\n\
                     3\n00:00:05,000 --> 00:00:06,000\nC\n";
        let entries = parse(input.as_bytes());
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].text, "A");
        assert_eq!(entries[1].index, 2);
        assert_eq!(entries[1].start, "00:00:03,000");
        assert_eq!(entries[1].text, "B");
        assert_eq!(entries[2].text, "C");
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let input = format!("\u{feff}{}", SAMPLE);
        assert_eq!(parse(input.as_bytes()).len(), 3);
    }

    #[test]
    fn test_format_preserves_given_order() {
        let mut entries = parse(SAMPLE.as_bytes());
        entries.reverse();
        let out = format(&entries);
        assert!(out.starts_with("7\n00:01:00,000 --> 00:01:02,000\n"));
    }
}
