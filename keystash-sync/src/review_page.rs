//! Store-page HTML parsing for the review facet.
//!
//! Everything here is pure string-in, value-out so the brittle markup logic
//! can be tested against fixture HTML without a network. The parsed
//! document is never held across an await point (it is not `Send`).

use std::sync::LazyLock;

use keystash_catalog::ReviewSummary;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::SyncError;

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector is valid")
}

static AGE_GATE: LazyLock<Selector> =
    LazyLock::new(|| sel(".agegate_text_container, .agegate_birthday_selector, #app_agegate"));
static SUMMARY_ROW: LazyLock<Selector> = LazyLock::new(|| sel("div.user_reviews_summary_row"));
static SUMMARY_ANY: LazyLock<Selector> = LazyLock::new(|| sel(".game_review_summary"));
static SUMMARY_SPAN: LazyLock<Selector> = LazyLock::new(|| sel("span.game_review_summary"));
static TOOLTIP_ATTR: LazyLock<Selector> = LazyLock::new(|| sel("[data-tooltip-html]"));
static REVIEWS_COUNT_EL: LazyLock<Selector> = LazyLock::new(|| sel(".user_reviews_count"));
static DEV_ROW: LazyLock<Selector> = LazyLock::new(|| sel(".dev_row .summary"));

/// Numeric phrases seen in review tooltips, most specific first.
static TOOLTIP_COUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"the ([0-9,]+) user reviews",
        r"([0-9,]+) reviews",
        r"([0-9,.]+) user reviews",
        r"of the ([0-9,]+) user",
        r"based on ([0-9,]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static review-count pattern is valid"))
    .collect()
});

static PAGE_COUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([0-9,]+) reviews").expect("static review-count pattern is valid"));

/// Whether the page is an age-verification interstitial rather than the
/// product page itself.
pub fn is_age_gated(html: &str) -> bool {
    let doc = Html::parse_document(html);
    doc.select(&AGE_GATE).next().is_some()
}

/// Text candidates available to review-count extraction strategies,
/// gathered once from the chosen summary block and the page.
pub struct CountSource {
    /// Hover tooltip text from the summary block, if any.
    pub tooltip: Option<String>,
    /// Page-level "N reviews" element texts.
    pub count_texts: Vec<String>,
}

/// One way of digging a review count out of page text.
pub type CountStrategy = fn(&CountSource) -> Option<u64>;

/// Ordered extraction chain; the first strategy that produces a count wins.
/// New strategies are appended here without touching callers.
const COUNT_STRATEGIES: &[CountStrategy] = &[count_from_tooltip, count_from_page_elements];

/// Run the strategy chain. `None` is a normal outcome, not a failure: some
/// pages simply never expose a count.
pub fn extract_review_count(source: &CountSource) -> Option<u64> {
    COUNT_STRATEGIES.iter().find_map(|strategy| strategy(source))
}

fn count_from_tooltip(source: &CountSource) -> Option<u64> {
    let tooltip = source.tooltip.as_deref()?;
    for pattern in TOOLTIP_COUNT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(tooltip) {
            // Strip thousands separators; both "," and "." appear.
            let raw = caps[1].replace([',', '.'], "");
            if let Ok(count) = raw.parse() {
                return Some(count);
            }
        }
    }
    None
}

fn count_from_page_elements(source: &CountSource) -> Option<u64> {
    for text in &source.count_texts {
        if let Some(caps) = PAGE_COUNT_PATTERN.captures(text) {
            if let Ok(count) = caps[1].replace(',', "").parse() {
                return Some(count);
            }
        }
    }
    None
}

/// Parse the aggregate review summary out of a (non-gated) store page.
///
/// Block selection mirrors what the page actually serves: the "All Reviews"
/// row when labeled, else the row carrying a tooltip, else the second
/// summary row (the first is usually "Recent Reviews"), else the first.
pub fn parse_review_summary(html: &str) -> Result<ReviewSummary, SyncError> {
    let doc = Html::parse_document(html);

    let mut candidates: Vec<ElementRef> = doc.select(&SUMMARY_ROW).collect();
    if candidates.is_empty() {
        candidates = doc.select(&SUMMARY_ANY).collect();
    }
    if candidates.is_empty() {
        return Err(SyncError::MissingMarkup("review summary block"));
    }

    let block = candidates
        .iter()
        .copied()
        .find(|el| {
            element_text(*el).contains("All Reviews")
                || el.value().attr("data-tooltip-html").is_some()
        })
        .unwrap_or_else(|| {
            if candidates.len() > 1 {
                candidates[1]
            } else {
                candidates[0]
            }
        });

    let summary_span = block.select(&SUMMARY_SPAN).next();
    let rating_text = summary_span
        .map(element_text)
        .unwrap_or_else(|| element_text(block))
        .trim()
        .to_string();
    if rating_text.is_empty() {
        return Err(SyncError::MissingMarkup("review summary text"));
    }

    let tooltip = summary_span
        .and_then(|el| el.value().attr("data-tooltip-html"))
        .or_else(|| block.value().attr("data-tooltip-html"))
        .map(str::to_string)
        .or_else(|| {
            block
                .select(&TOOLTIP_ATTR)
                .next()
                .and_then(|el| el.value().attr("data-tooltip-html"))
                .map(str::to_string)
        })
        .or_else(|| {
            doc.select(&REVIEWS_COUNT_EL)
                .map(|el| element_text(el))
                .find(|t| t.to_lowercase().contains("reviews"))
        });

    let count_texts = doc.select(&REVIEWS_COUNT_EL).map(element_text).collect();
    let review_count = extract_review_count(&CountSource {
        tooltip,
        count_texts,
    });

    Ok(ReviewSummary {
        rating_text,
        review_count,
        age_restricted: false,
    })
}

/// Pull the developer name from the labeled developer row, when present.
pub fn parse_developer_row(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&DEV_ROW)
        .next()
        .map(|el| element_text(el).trim().to_string())
        .filter(|s| !s.is_empty())
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    const GATED_PAGE: &str = r#"<html><body>
        <div class="agegate_text_container">Please enter your birth date</div>
    </body></html>"#;

    const FULL_PAGE: &str = r#"<html><body>
        <div class="user_reviews_summary_row">
            Recent Reviews: <span class="game_review_summary">Mixed</span>
        </div>
        <div class="user_reviews_summary_row" data-tooltip-html="91% of the 104,549 user reviews for this game are positive.">
            All Reviews: <span class="game_review_summary">Very Positive</span>
        </div>
    </body></html>"#;

    const NO_TOOLTIP_PAGE: &str = r#"<html><body>
        <div class="user_reviews_summary_row">
            All Reviews: <span class="game_review_summary">Positive</span>
        </div>
    </body></html>"#;

    const UNLABELED_PAGE: &str = r#"<html><body>
        <div class="user_reviews_summary_row">
            <span class="game_review_summary">Mixed</span>
        </div>
        <div class="user_reviews_summary_row">
            <span class="game_review_summary">Mostly Positive</span>
            <span class="user_reviews_count">(2,411 reviews)</span>
        </div>
    </body></html>"#;

    #[test]
    fn detects_age_gate() {
        assert!(is_age_gated(GATED_PAGE));
        assert!(!is_age_gated(FULL_PAGE));
    }

    #[test]
    fn prefers_the_all_reviews_block() {
        let summary = parse_review_summary(FULL_PAGE).unwrap();
        assert_eq!(summary.rating_text, "Very Positive");
        assert_eq!(summary.review_count, Some(104549));
        assert!(!summary.age_restricted);
    }

    #[test]
    fn missing_count_is_not_a_failure() {
        let summary = parse_review_summary(NO_TOOLTIP_PAGE).unwrap();
        assert_eq!(summary.rating_text, "Positive");
        assert_eq!(summary.review_count, None);
    }

    #[test]
    fn falls_back_to_second_candidate_when_unlabeled() {
        let summary = parse_review_summary(UNLABELED_PAGE).unwrap();
        assert_eq!(summary.rating_text, "Mostly Positive");
        // Count comes from the page-level "N reviews" scan.
        assert_eq!(summary.review_count, Some(2411));
    }

    #[test]
    fn no_summary_markup_fails_the_facet() {
        let err = parse_review_summary("<html><body><p>storefront</p></body></html>");
        assert!(matches!(err, Err(SyncError::MissingMarkup(_))));
    }

    #[test]
    fn tooltip_patterns_strip_separators() {
        let source = CountSource {
            tooltip: Some("based on 1,234 lifetime ratings".to_string()),
            count_texts: Vec::new(),
        };
        assert_eq!(extract_review_count(&source), Some(1234));
    }

    #[test]
    fn strategy_chain_falls_through_to_page_counts() {
        let source = CountSource {
            tooltip: Some("no numbers here".to_string()),
            count_texts: vec!["(17 reviews)".to_string()],
        };
        assert_eq!(extract_review_count(&source), Some(17));
    }

    #[test]
    fn developer_row_is_trimmed() {
        let html = r#"<div class="dev_row"><div class="summary">  Valve </div></div>"#;
        assert_eq!(parse_developer_row(html).as_deref(), Some("Valve"));
        assert_eq!(parse_developer_row("<div></div>"), None);
    }
}
