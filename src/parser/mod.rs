pub mod bullets;
pub mod headings;
pub mod sections;

use serde::Serialize;
use tracing::debug;

use crate::prompt::Language;
use headings::{HeadingPattern, SectionLabel};

/// The two required headings, in output order.
#[derive(Debug, Clone)]
pub struct Headings {
    pub first: HeadingPattern,
    pub second: HeadingPattern,
}

impl Headings {
    pub fn new(first: &str, second: &str) -> Self {
        Headings {
            first: HeadingPattern::new(SectionLabel::First, first),
            second: HeadingPattern::new(SectionLabel::Second, second),
        }
    }

    /// Headings the prompt asks the model to use for `language`.
    pub fn for_language(language: Language) -> Self {
        match language {
            Language::Vi => Headings::new("Noi dung bai hoc", "Nhan xet hoc sinh"),
            Language::En => Headings::new("Lesson Content", "Student Review"),
        }
    }

    pub fn get(&self, label: SectionLabel) -> &HeadingPattern {
        match label {
            SectionLabel::First => &self.first,
            SectionLabel::Second => &self.second,
        }
    }
}

/// Final, display-ready pair of sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewSections {
    pub section1: String,
    pub section2: String,
}

/// Two-stage pipeline: raw model output → split → normalized sections.
pub fn structure(raw: &str, headings: &Headings) -> ReviewSections {
    let split = sections::split(raw, headings);
    debug!(
        strategy = ?split.strategy,
        section1_chars = split.section1.len(),
        section2_chars = split.section2.len(),
        "sections located"
    );

    ReviewSections {
        section1: bullets::normalize(&split.section1, headings.get(SectionLabel::First)),
        section2: bullets::normalize(&split.section2, headings.get(SectionLabel::Second)),
    }
}
