use std::sync::LazyLock;

use regex::Regex;

use super::headings::HeadingPattern;

/// Marks the model leaves where it filled a gap with a guess.
const PLACEHOLDERS: &[&str] = &["giả định", "assumption"];

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = PLACEHOLDERS
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)[ \t]*\(?[ \t]*(?:{alternatives})[ \t]*\)?")).unwrap()
});
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)([-*•]|\d{1,3}[.)])[ \t]+(.*)$").unwrap());

/// Clean one section for display: drop its heading, strip `*` emphasis
/// and placeholder notes, and make every remaining line a list item.
///
/// A line opening with the heading is discarded; text after a `:` or dash
/// separator survives as an item. Blank lines are dropped outright, so the
/// result never holds an empty line. Idempotent: the output is a fixed point.
pub fn normalize(section: &str, heading: &HeadingPattern) -> String {
    let mut lines = Vec::new();

    for line in section.lines() {
        let item = match after_heading(&clean(line), heading) {
            Some(rest) => bullet_line(&rest),
            None => bullet_line(line),
        };
        if let Some(item) = item {
            lines.push(item);
        }
    }

    lines.join("\n").trim().to_string()
}

/// What is left of a cleaned line once every leading heading is peeled off,
/// or None when the line does not open with the heading.
fn after_heading(cleaned: &str, heading: &HeadingPattern) -> Option<String> {
    let mut rest = heading.strip_heading(cleaned)?.to_string();
    while let Some(next) = heading.strip_heading(&rest) {
        if next.len() >= rest.len() {
            break;
        }
        rest = next.to_string();
    }
    Some(rest)
}

/// One output line, or None when nothing is left after cleaning.
fn bullet_line(line: &str) -> Option<String> {
    // A "* " marker has to be taken before emphasis stripping eats it.
    let (marker, body) = match split_marker(line) {
        Some((marker, rest)) => (Some(marker), clean(rest)),
        None => {
            let cleaned = clean(line);
            match split_marker(&cleaned) {
                Some((marker, rest)) => (Some(marker), rest.trim().to_string()),
                None => (None, cleaned),
            }
        }
    };

    if body.is_empty() {
        return None;
    }
    Some(match marker {
        Some(marker) => format!("{} {}", marker, body),
        None => format!("- {}", body),
    })
}

/// Leading indent + list marker, and the text after it.
fn split_marker(line: &str) -> Option<(String, &str)> {
    let caps = MARKER_RE.captures(line)?;
    let marker = format!("{}{}", &caps[1], &caps[2]);
    let rest = caps.get(3).map_or("", |m| m.as_str());
    Some((marker, rest))
}

/// Remove every `*` and placeholder note, then trim.
fn clean(text: &str) -> String {
    let mut out = text.replace('*', "");
    // Removing one note can splice the halves of another back together.
    while PLACEHOLDER_RE.is_match(&out) {
        out = PLACEHOLDER_RE.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}
