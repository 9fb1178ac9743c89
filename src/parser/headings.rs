use std::fmt;

use regex::{Regex, RegexBuilder};

/// Which of the two required sections a span of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionLabel {
    First,
    Second,
}

impl fmt::Display for SectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionLabel::First => f.write_str("first"),
            SectionLabel::Second => f.write_str("second"),
        }
    }
}

/// A located heading: byte offset into the raw text, label, and the matched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingMatch {
    pub start: usize,
    pub label: SectionLabel,
    pub text: String,
}

// Optional "1)", "2.", "##", plus stray emphasis around them.
const PREFIX: &str = r"[ \t]*[*_]*[ \t]*(?:#{1,6}[ \t]*)?(?:\d{1,3}[.)][ \t]*)?[*_]*[ \t]*";

/// Recognizer for one section's canonical heading phrase.
#[derive(Debug, Clone)]
pub struct HeadingPattern {
    label: SectionLabel,
    phrase: String,
    line_re: Regex,
    anywhere_re: Regex,
    lead_re: Regex,
}

impl HeadingPattern {
    pub fn new(label: SectionLabel, phrase: &str) -> Self {
        let phrase = phrase.trim();
        let body = phrase_pattern(phrase);

        let line_re = build(&format!("^{PREFIX}{body}"), true);
        let anywhere_re = build(&body, false);
        let lead_re = build(
            &format!(r"^{PREFIX}{body}(?:[*_]+|\b)[ \t]*(?:[:\-–—][ \t]*(?P<rest>.*))?"),
            false,
        );

        HeadingPattern {
            label,
            phrase: phrase.to_string(),
            line_re,
            anywhere_re,
            lead_re,
        }
    }

    /// The canonical phrase, as configured.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// First occurrence of this heading in `text`.
    ///
    /// A heading that opens a line wins over anything else; a bare substring
    /// search is only used when no line carries the heading. Prose that
    /// mentions the phrase before the real heading can still mis-split when
    /// the heading itself is inlined, which is accepted as a heuristic limit.
    pub fn find(&self, text: &str) -> Option<HeadingMatch> {
        let m = self
            .line_re
            .find(text)
            .or_else(|| self.anywhere_re.find(text))?;
        Some(HeadingMatch {
            start: m.start(),
            label: self.label,
            text: m.as_str().to_string(),
        })
    }

    /// For a line that opens with this heading, the text after a `:` or dash
    /// separator. Empty when nothing follows or the heading runs straight
    /// into prose. `None` when the line does not start with the heading.
    pub fn strip_heading<'a>(&self, line: &'a str) -> Option<&'a str> {
        let caps = self.lead_re.captures(line.trim())?;
        Some(caps.name("rest").map_or("", |m| m.as_str().trim()))
    }
}

/// Escaped phrase with any run of spaces loosened to `[ \t]+`.
fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"[ \t]+")
}

fn build(pattern: &str, multi_line: bool) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(multi_line)
        .build()
        .expect("escaped heading phrase always compiles")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review() -> HeadingPattern {
        HeadingPattern::new(SectionLabel::Second, "Student Review")
    }

    #[test]
    fn bare_heading() {
        let m = review().find("intro\nStudent Review\nbody").unwrap();
        assert_eq!(m.start, 6);
        assert_eq!(m.label, SectionLabel::Second);
        assert_eq!(m.text, "Student Review");
    }

    #[test]
    fn ordinal_and_markdown_prefixes() {
        for text in [
            "x\n2) Student Review\n",
            "x\n2. Student Review\n",
            "x\n### Student Review\n",
            "x\n## 2. Student Review\n",
            "x\n**2) Student Review**\n",
            "x\n  student review: foo\n",
        ] {
            let m = review().find(text).unwrap();
            assert_eq!(m.start, 2, "wrong start for {text:?}");
        }
    }

    #[test]
    fn line_heading_beats_earlier_prose() {
        let text = "We will add a student review later.\n\n2) Student Review\n- ok";
        let m = review().find(text).unwrap();
        assert_eq!(&text[m.start..m.start + 2], "2)");
    }

    #[test]
    fn substring_fallback_when_no_line_heading() {
        let text = "Summary done. Student Review: good work";
        let m = review().find(text).unwrap();
        assert_eq!(m.start, 14);
    }

    #[test]
    fn missing_heading() {
        assert!(review().find("nothing here").is_none());
    }

    #[test]
    fn loose_inner_whitespace() {
        let p = HeadingPattern::new(SectionLabel::First, "Noi dung  bai hoc");
        assert_eq!(p.phrase(), "Noi dung  bai hoc");
        assert!(p.find("1) NOI DUNG BAI\tHOC").is_some());
    }

    #[test]
    fn strip_leading_heading() {
        let p = review();
        assert_eq!(p.strip_heading("Student Review"), Some(""));
        assert_eq!(p.strip_heading("2) Student Review:"), Some(""));
        assert_eq!(p.strip_heading("## student review"), Some(""));
        assert_eq!(p.strip_heading("### 2) Student Review"), Some(""));
        assert_eq!(p.strip_heading("__Student Review__"), Some(""));
        assert_eq!(p.strip_heading("2) Student Review - An"), Some("An"));
        assert_eq!(p.strip_heading("Student Review: good work "), Some("good work"));
        assert_eq!(p.strip_heading("Student Review is due Friday"), Some(""));
        assert_eq!(p.strip_heading("Student Reviewers"), None);
        assert_eq!(p.strip_heading("- Student Review"), None);
        assert_eq!(p.strip_heading("A Student Review"), None);
    }
}
