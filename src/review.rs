use serde::{Deserialize, Serialize};
use tracing::info;

use crate::completion::CompletionEngine;
use crate::fetcher::PageFetcher;
use crate::parser::{self, Headings, ReviewSections};
use crate::prompt::{self, Language, PromptInput};

const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("student name must be 1-100 characters, got {0}")]
    StudentName(usize),
}

/// One review job as the client submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub url: String,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
}

impl ReviewRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        let parsed = reqwest::Url::parse(&self.url).map_err(|e| RequestError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(RequestError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }
        if let Some(name) = &self.student_name {
            let len = name.chars().count();
            if len == 0 || len > MAX_NAME_CHARS {
                return Err(RequestError::StudentName(len));
            }
        }
        Ok(())
    }

    /// Trimmed name, with blank treated as absent.
    fn student_name(&self) -> Option<&str> {
        self.student_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Result envelope: `{ ok: true, section1, section2 }` or `{ ok: false, error }`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReviewResponse {
    pub fn success(sections: ReviewSections) -> Self {
        ReviewResponse {
            ok: true,
            section1: Some(sections.section1),
            section2: Some(sections.section2),
            error: None,
        }
    }

    pub fn failure(err: &anyhow::Error) -> Self {
        ReviewResponse {
            ok: false,
            section1: None,
            section2: None,
            error: Some(format!("{:#}", err)),
        }
    }
}

/// Prompt for a request, fetching the page first.
pub async fn prepare_prompt<F: PageFetcher>(
    request: &ReviewRequest,
    fetcher: &F,
    char_limit: usize,
) -> anyhow::Result<String> {
    request.validate()?;
    let page_text = fetcher.fetch(&request.url).await?;
    let headings = Headings::for_language(request.language);
    Ok(prompt::build_prompt(
        &PromptInput {
            url: &request.url,
            page_text: &page_text,
            student_name: request.student_name(),
            language: request.language,
        },
        &headings,
        char_limit,
    ))
}

/// Full review: validate → fetch → prompt → complete → structure.
pub async fn run<F: PageFetcher, E: CompletionEngine>(
    request: &ReviewRequest,
    fetcher: &F,
    engine: &E,
    char_limit: usize,
) -> anyhow::Result<ReviewSections> {
    let prompt = prepare_prompt(request, fetcher, char_limit).await?;
    let raw = engine.complete(&prompt).await?;

    let headings = Headings::for_language(request.language);
    let sections = parser::structure(&raw, &headings);
    info!(
        "Structured review for {} ({} + {} chars)",
        request.url,
        sections.section1.len(),
        sections.section2.len()
    );

    Ok(with_teacher_notes(sections, request))
}

/// Put the teacher's ticked strengths/weaknesses in front of the model's assessment.
/// Left untouched when the teacher ticked nothing.
pub fn with_teacher_notes(mut sections: ReviewSections, request: &ReviewRequest) -> ReviewSections {
    if request.strengths.is_empty() && request.weaknesses.is_empty() {
        return sections;
    }

    let (good, bad, none) = match request.language {
        Language::Vi => ("Ưu điểm:", "Nhược điểm:", "- Không có"),
        Language::En => ("Strengths:", "Weaknesses:", "- None"),
    };
    let list = |items: &[String]| -> String {
        if items.is_empty() {
            none.to_string()
        } else {
            items
                .iter()
                .map(|s| format!("- {}", s.trim()))
                .collect::<Vec<_>>()
                .join("\n")
        }
    };

    let notes = format!(
        "{}\n{}\n\n{}\n{}",
        good,
        list(&request.strengths),
        bad,
        list(&request.weaknesses)
    );
    sections.section2 = format!("{}\n\n{}", notes, sections.section2)
        .trim()
        .to_string();
    sections
}
