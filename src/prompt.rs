use serde::{Deserialize, Serialize};

use crate::parser::Headings;

/// Reply language requested from the model. Only affects prompt text and
/// the heading phrases the model is asked to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Vi,
    En,
}

pub struct PromptInput<'a> {
    pub url: &'a str,
    pub page_text: &'a str,
    pub student_name: Option<&'a str>,
    pub language: Language,
}

/// Build the single-turn prompt for a portfolio review.
pub fn build_prompt(input: &PromptInput, headings: &Headings, char_limit: usize) -> String {
    let page_text = truncate_chars(input.page_text, char_limit);
    let first = headings.first.phrase();
    let second = headings.second.phrase();

    match input.language {
        Language::Vi => {
            let name = input
                .student_name
                .map(|n| format!("Tên học sinh: {}", n))
                .unwrap_or_default();
            format!(
                "Bạn là giáo viên bộ môn CNTT, đang được yêu cầu viết báo cáo nhận xét dựa trên portfolio (đường link: {url}). Hãy trả lời bằng tiếng Việt.

Dưới đây là văn bản đã trích xuất từ trang portfolio (rút gọn, có thể có thiếu sót):
---
{page_text}
---

Yêu cầu đầu ra: Viết đúng 2 phần lớn, theo thứ tự như sau (không thêm phần mở đầu/kết):

1) {first}
- Tóm tắt các kiến thức/kỹ năng mà học sinh đã học hoặc áp dụng qua portfolio này (ví dụ: công nghệ, công cụ, quy trình, tư duy thiết kế, kỹ năng mềm).
- Liệt kê có cấu trúc, súc tích, song vẫn đủ chiều sâu, trích dẫn ví dụ cụ thể từ portfolio.

2) {second}
- Đánh giá điểm mạnh: kỹ thuật, thẩm mỹ, cách trình bày, mức độ hoàn thiện, tính sáng tạo.
- Góp ý cải thiện: rõ ràng, khả năng mở rộng, tổ chức code/nội dung, kiểm thử, hiệu năng, bảo mật, khả năng trình bày.
- Đưa ra 3-5 việc làm cụ thể để nâng cấp portfolio trong 1-2 tuần tới.

Yêu cầu trình bày:
- Viết bằng tiếng Việt phổ thông, lịch sự, khách quan.
- Dùng gạch đầu dòng, tiêu đề rõ ràng.
- Gọi học sinh bằng \"em\".
- Nếu dữ liệu trang thiếu, hãy nêu giả định hợp lý và ghi chú \"(giả định)\".
- Kết quả phải chứa đúng hai phần, đánh dấu rõ bằng tiêu đề: \"{first}\" và \"{second}\".

{name}",
                url = input.url,
            )
        }
        Language::En => {
            let name = input
                .student_name
                .map(|n| format!("Student name: {}", n))
                .unwrap_or_default();
            format!(
                "You are an IT teacher asked to write a review report based on a student portfolio (link: {url}). Reply in English.

Below is the text extracted from the portfolio page (shortened, may be incomplete):
---
{page_text}
---

Output requirements: write exactly 2 main parts, in this order (no introduction or closing):

1) {first}
- Summarize the knowledge and skills the student learned or applied in this portfolio (technologies, tools, process, design thinking, soft skills).
- Keep it structured and concise but with enough depth, citing concrete examples from the portfolio.

2) {second}
- Strengths: technique, aesthetics, presentation, completeness, creativity.
- Improvements: clarity, scalability, code/content organization, testing, performance, security, presentation.
- Give 3-5 concrete actions to upgrade the portfolio over the next 1-2 weeks.

Presentation requirements:
- Plain, polite, objective English.
- Use bullet points and clear headings.
- Address the student directly.
- If the page data is missing something, state a reasonable assumption and mark it \"(assumption)\".
- The result must contain exactly two parts, clearly marked with the headings: \"{first}\" and \"{second}\".

{name}",
                url = input.url,
            )
        }
    }
}

/// First `max` characters of `text`, on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(language: Language, name: Option<&'static str>) -> PromptInput<'static> {
        PromptInput {
            url: "https://student.example.com",
            page_text: "Portfolio of An. Projects: Weather app, Todo list.",
            student_name: name,
            language,
        }
    }

    #[test]
    fn vietnamese_prompt_names_both_headings() {
        let p = build_prompt(
            &input(Language::Vi, Some("An")),
            &Headings::for_language(Language::Vi),
            14_000,
        );
        assert!(p.contains("1) Noi dung bai hoc"));
        assert!(p.contains("2) Nhan xet hoc sinh"));
        assert!(p.contains("Hãy trả lời bằng tiếng Việt."));
        assert!(p.contains("https://student.example.com"));
        assert!(p.contains("Weather app"));
        assert!(p.trim_end().ends_with("Tên học sinh: An"));
    }

    #[test]
    fn english_prompt_without_name() {
        let p = build_prompt(
            &input(Language::En, None),
            &Headings::for_language(Language::En),
            14_000,
        );
        assert!(p.contains("1) Lesson Content"));
        assert!(p.contains("2) Student Review"));
        assert!(p.contains("Reply in English."));
        assert!(!p.contains("Student name:"));
    }

    #[test]
    fn page_text_is_capped() {
        let long = "ă".repeat(50);
        let i = PromptInput {
            url: "https://student.example.com",
            page_text: &long,
            student_name: None,
            language: Language::En,
        };
        let p = build_prompt(&i, &Headings::for_language(Language::En), 10);
        assert!(p.contains(&"ă".repeat(10)));
        assert!(!p.contains(&"ă".repeat(11)));
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("", 0), "");
    }
}
