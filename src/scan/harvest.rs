//! Row discovery and text extraction against a moving DOM target.

use tracing::debug;

use crate::{
    domain::ExtractedMessage,
    hosts::SelectorSet,
    page::{ElementHandle, HostPage, PageError},
};

/// Fallback lines shorter than this are icon glyphs or timestamps, not
/// message text.
const MIN_LINE_LEN: usize = 3;

/// Locate candidate message rows. Selectors are alternates for layout
/// variants: the first one returning a non-empty set wins outright,
/// later ones are never unioned in.
pub async fn find_rows(
    page: &dyn HostPage,
    selectors: &SelectorSet,
) -> Result<Vec<ElementHandle>, PageError> {
    for selector in selectors.rows {
        let rows = page.query(selector).await?;
        if !rows.is_empty() {
            debug!(target: "harvest", selector, count = rows.len(), "row selector matched");
            return Ok(rows);
        }
    }
    Ok(Vec::new())
}

/// Pull subject and snippet out of one row, falling back to raw text
/// splitting when the structured selectors all miss. The combined text
/// may still be too short to classify; the caller decides that with
/// [`ExtractedMessage::is_classifiable`].
pub async fn extract_message(
    page: &dyn HostPage,
    selectors: &SelectorSet,
    element: &ElementHandle,
) -> Result<ExtractedMessage, PageError> {
    let mut subject = first_text(page, element, selectors.subject).await?;
    let mut snippet = first_text(page, element, selectors.snippet).await?;

    if subject.is_empty() && snippet.is_empty() {
        let full = page.inner_text(element).await?;
        let mut lines = full
            .lines()
            .map(str::trim)
            .filter(|line| line.chars().count() >= MIN_LINE_LEN);
        subject = lines.next().unwrap_or_default().to_string();
        snippet = lines.next().unwrap_or_default().to_string();
    }

    let text = format!("{} {}", subject, snippet).trim().to_string();
    Ok(ExtractedMessage {
        element: element.clone(),
        text,
    })
}

async fn first_text(
    page: &dyn HostPage,
    scope: &ElementHandle,
    selectors: &[&str],
) -> Result<String, PageError> {
    for selector in selectors {
        for candidate in page.query_within(scope, selector).await? {
            let text = page.inner_text(&candidate).await?;
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
    }
    Ok(String::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hosts::selectors::GMAIL;
    use crate::page::fake::{el, FakePage};

    fn gmail_page() -> FakePage {
        FakePage::new("https://mail.google.com/mail/u/0/")
    }

    #[tokio::test]
    async fn first_matching_row_selector_wins() {
        let page = gmail_page();
        page.add_page_matches(GMAIL.rows[0], &["r1", "r2"]);
        page.add_page_matches(GMAIL.rows[1], &["other"]);

        let rows = find_rows(&page, &GMAIL).await.unwrap();
        assert_eq!(rows, vec![el("r1"), el("r2")]);
    }

    #[tokio::test]
    async fn later_selector_variant_is_used_only_when_earlier_ones_miss() {
        let page = gmail_page();
        page.add_page_matches(GMAIL.rows[1], &["v2-row"]);

        let rows = find_rows(&page, &GMAIL).await.unwrap();
        assert_eq!(rows, vec![el("v2-row")]);
    }

    #[tokio::test]
    async fn no_selector_matching_yields_empty() {
        let page = gmail_page();
        assert!(find_rows(&page, &GMAIL).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn structured_subject_and_snippet_are_combined() {
        let page = gmail_page();
        page.add_scoped_matches("r1", GMAIL.subject[0], &["s1"]);
        page.add_scoped_matches("r1", GMAIL.snippet[0], &["p1"]);
        page.set_text("s1", "Quarterly report");
        page.set_text("p1", "numbers attached for review");

        let message = extract_message(&page, &GMAIL, &el("r1")).await.unwrap();
        assert_eq!(message.text, "Quarterly report numbers attached for review");
        assert!(message.is_classifiable());
    }

    #[tokio::test]
    async fn subject_fallback_chain_is_ordered() {
        let page = gmail_page();
        // Primary subject selector matches an element with blank text;
        // the second variant carries the real subject.
        page.add_scoped_matches("r1", GMAIL.subject[0], &["blank"]);
        page.add_scoped_matches("r1", GMAIL.subject[1], &["s2"]);
        page.set_text("blank", "   ");
        page.set_text("s2", "Lunch on Friday?");

        let message = extract_message(&page, &GMAIL, &el("r1")).await.unwrap();
        assert_eq!(message.text, "Lunch on Friday?");
    }

    #[tokio::test]
    async fn line_split_fallback_skips_short_lines() {
        let page = gmail_page();
        page.set_text(
            "r1",
            "\u{2605}\n  \nRe: invoice overdue\nplease see the attached reminder\n9:41",
        );

        let message = extract_message(&page, &GMAIL, &el("r1")).await.unwrap();
        assert_eq!(
            message.text,
            "Re: invoice overdue please see the attached reminder"
        );
    }

    #[tokio::test]
    async fn rows_with_no_usable_text_are_not_classifiable() {
        let page = gmail_page();
        page.set_text("r1", "\u{2605}\n--\n9:41");

        let message = extract_message(&page, &GMAIL, &el("r1")).await.unwrap();
        assert!(!message.is_classifiable());
    }

    #[tokio::test]
    async fn stale_row_surfaces_as_page_error() {
        let page = gmail_page();
        page.mark_stale("r1");
        assert!(matches!(
            extract_message(&page, &GMAIL, &el("r1")).await,
            Err(PageError::Stale)
        ));
    }
}
