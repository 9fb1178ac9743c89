use tracing::debug;

use super::Headings;

/// Which rule produced a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Both headings found, in order.
    Headings,
    /// Only the second heading was usable; text split around it.
    Delimiter,
    /// No second heading: everything lands in section 1.
    Whole,
}

/// Two raw sections, each still carrying its heading line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub section1: String,
    pub section2: String,
    pub strategy: SplitStrategy,
}

/// Partition raw model output into the two required sections.
///
/// Never fails: missing or reordered headings degrade to the delimiter split,
/// then to returning the whole text as section 1.
pub fn split(raw: &str, headings: &Headings) -> Split {
    let first = headings.first.find(raw);
    let second = headings.second.find(raw);

    if let (Some(f), Some(s)) = (&first, &second) {
        if f.start <= s.start {
            debug!(first = %f.text, second = %s.text, "split on both headings");
            return Split {
                section1: raw[f.start..s.start].trim().to_string(),
                section2: raw[s.start..].trim().to_string(),
                strategy: SplitStrategy::Headings,
            };
        }
        debug!(
            first_at = f.start,
            second_at = s.start,
            "headings out of order, falling back to delimiter split"
        );
    }

    let Some(s) = second else {
        debug!(found_first = first.is_some(), "no second heading, keeping whole text");
        return Split {
            section1: raw.trim().to_string(),
            section2: String::new(),
            strategy: SplitStrategy::Whole,
        };
    };

    let phrase = headings.second.phrase();
    let right = raw[s.start..].trim();
    let section2 = if right.to_lowercase().starts_with(&phrase.to_lowercase()) {
        right.to_string()
    } else {
        format!("{}\n{}", phrase, right)
    };

    debug!(label = %s.label, at = s.start, heading = %s.text, "split on one heading only");
    Split {
        section1: raw[..s.start].trim().to_string(),
        section2,
        strategy: SplitStrategy::Delimiter,
    }
}

// ── Tests ──
