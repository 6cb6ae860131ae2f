//! Markdown rendering for web tool results.

use std::fmt::Write as _;

use super::{WebCrawlResponse, WebExtractResponse, WebMapResponse, WebSearchResponse};
use crate::models::{WebCrawlRequest, WebSearchRequest};
use crate::report::{error_icon, truncate_chars};
use crate::sources::SourceError;

/// Raw page characters shown under a search result
const RAW_PREVIEW: usize = 200;

/// Page characters shown per crawled page
const PAGE_PREVIEW: usize = 500;

const IMAGE_LIMIT: usize = 5;

pub fn search_report(request: &WebSearchRequest, response: &WebSearchResponse) -> String {
    if response.results.is_empty() {
        return format!("No results found for '{}'", request.query);
    }

    let mut out = format!(
        "# 🌐 Found {} results for '{}'\n",
        response.results.len(),
        request.query
    );

    if request.include_answer {
        if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
            let _ = writeln!(out, "\n## Answer\n\n{}", answer.trim());
        }
    }

    out.push_str("\n## Results\n");
    for (i, result) in response.results.iter().enumerate() {
        let _ = writeln!(out, "\n{}. **{}**", i + 1, result.title);
        let _ = writeln!(out, "   - URL: {}", result.url);
        if let Some(score) = result.score {
            let _ = writeln!(out, "   - Score: {:.2}", score);
        }
        if !result.content.trim().is_empty() {
            let _ = writeln!(out, "   - {}", result.content.trim());
        }
        if let Some(raw) = result.raw_content.as_deref().filter(|r| !r.trim().is_empty()) {
            let _ = writeln!(out, "   - Raw: {}", truncate_chars(raw, RAW_PREVIEW));
        }
    }

    if request.include_images && !response.images.is_empty() {
        out.push_str("\n## Images\n\n");
        for image in response.images.iter().take(IMAGE_LIMIT) {
            let _ = writeln!(out, "- {}", image.url());
        }
    }

    out
}

pub fn extract_report(response: &WebExtractResponse) -> String {
    let mut out = format!(
        "# 📄 Extracted {} pages ({} failed)\n",
        response.results.len(),
        response.failed_results.len()
    );

    for page in &response.results {
        let _ = writeln!(out, "\n## {}\n\n{}", page.url, page.raw_content.trim());
    }

    if !response.failed_results.is_empty() {
        out.push_str("\n## Failed\n\n");
        for failed in &response.failed_results {
            let _ = writeln!(out, "- {}: {}", failed.url, failed.error);
        }
    }

    out
}

pub fn crawl_report(request: &WebCrawlRequest, response: &WebCrawlResponse) -> String {
    if response.results.is_empty() {
        return format!("No pages crawled from {}", request.url);
    }

    let mut out = format!(
        "# 🕸️ {} pages crawled from {}\n",
        response.results.len(),
        request.url
    );
    if let Some(instructions) = &request.instructions {
        let _ = writeln!(out, "\n**Instructions:** {}", instructions);
    }

    for (i, page) in response.results.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n## {}. {}\n\n{}",
            i + 1,
            page.url,
            truncate_chars(&page.raw_content, PAGE_PREVIEW)
        );
    }

    out
}

pub fn map_report(request: &WebCrawlRequest, response: &WebMapResponse) -> String {
    if response.results.is_empty() {
        return format!("No pages found under {}", request.url);
    }

    let mut out = format!(
        "# 🗺️ {} URLs mapped from {}\n\n",
        response.results.len(),
        request.url
    );
    for url in &response.results {
        let _ = writeln!(out, "- {}", url);
    }

    out
}

/// A failed web call, with the same icon and hint as paper-source failures
pub fn failure_report(action: &str, err: &SourceError) -> String {
    format!(
        "{} Tavily {} failed: {}\n\n💡 Suggestion: {}",
        error_icon(err),
        action,
        err,
        err.hint()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::{FailedPage, WebImage, WebPage, WebResult};

    fn result(title: &str) -> WebResult {
        WebResult {
            title: title.to_string(),
            url: format!("https://example.com/{}", title.to_lowercase()),
            content: "Summary text".to_string(),
            score: Some(0.876),
            raw_content: None,
        }
    }

    #[test]
    fn test_search_report_with_answer() {
        let mut request = WebSearchRequest::new("test query");
        request.include_answer = true;
        let response = WebSearchResponse {
            answer: Some("This is the answer".to_string()),
            results: vec![result("First"), result("Second")],
            images: Vec::new(),
        };

        let text = search_report(&request, &response);
        assert!(text.starts_with("# 🌐 Found 2 results"));
        assert!(text.contains("## Answer\n\nThis is the answer"));
        assert!(text.contains("1. **First**"));
        assert!(text.contains("2. **Second**"));
        assert!(text.contains("Score: 0.88"));
    }

    #[test]
    fn test_answer_hidden_unless_requested() {
        let request = WebSearchRequest::new("q");
        let response = WebSearchResponse {
            answer: Some("unrequested".to_string()),
            results: vec![result("Only")],
            images: Vec::new(),
        };
        assert!(!search_report(&request, &response).contains("unrequested"));
    }

    #[test]
    fn test_search_report_empty() {
        let text = search_report(&WebSearchRequest::new("nothing"), &WebSearchResponse::default());
        assert_eq!(text, "No results found for 'nothing'");
    }

    #[test]
    fn test_raw_content_and_images_are_capped() {
        let mut request = WebSearchRequest::new("q");
        request.include_images = true;
        let mut long = result("Long");
        long.raw_content = Some("x".repeat(RAW_PREVIEW + 50));
        let response = WebSearchResponse {
            answer: None,
            results: vec![long],
            images: (0..8)
                .map(|i| WebImage::Url(format!("https://img.example/{}.png", i)))
                .collect(),
        };

        let text = search_report(&request, &response);
        assert!(text.contains(&format!("Raw: {}...", "x".repeat(RAW_PREVIEW))));
        assert!(text.contains("https://img.example/4.png"));
        assert!(!text.contains("https://img.example/5.png"));
    }

    #[test]
    fn test_extract_report_lists_failures() {
        let response = WebExtractResponse {
            results: vec![WebPage {
                url: "https://a.example".to_string(),
                raw_content: "Page body".to_string(),
                images: Vec::new(),
            }],
            failed_results: vec![FailedPage {
                url: "https://b.example".to_string(),
                error: "Timeout".to_string(),
            }],
        };

        let text = extract_report(&response);
        assert!(text.starts_with("# 📄 Extracted 1 pages (1 failed)"));
        assert!(text.contains("## https://a.example\n\nPage body"));
        assert!(text.contains("- https://b.example: Timeout"));
    }

    #[test]
    fn test_failure_report_carries_hint() {
        let err = SourceError::RateLimit("Tavily is throttling requests".to_string());
        let text = failure_report("search", &err);
        assert!(text.contains("Tavily search failed: Rate limit exceeded"));
        assert!(text.contains(&format!("💡 Suggestion: {}", err.hint())));
    }

    #[test]
    fn test_crawl_and_map_reports() {
        let request = WebCrawlRequest::new("https://docs.example");
        let crawled = WebCrawlResponse {
            base_url: "docs.example".to_string(),
            results: vec![WebPage {
                url: "https://docs.example/intro".to_string(),
                raw_content: "Intro".to_string(),
                images: Vec::new(),
            }],
        };
        assert!(crawl_report(&request, &crawled).contains("1 pages crawled"));
        assert_eq!(
            crawl_report(&request, &WebCrawlResponse::default()),
            "No pages crawled from https://docs.example"
        );

        let mapped = WebMapResponse {
            base_url: "docs.example".to_string(),
            results: vec!["https://docs.example/a".to_string()],
        };
        let text = map_report(&request, &mapped);
        assert!(text.contains("1 URLs mapped"));
        assert!(text.contains("- https://docs.example/a"));
    }
}
