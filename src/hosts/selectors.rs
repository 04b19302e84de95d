use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered fallback queries for one host UI. Selectors are tried in order
/// and the first non-empty result wins; later entries cover layout
/// variants the host ships without notice, they are never unioned.
#[derive(Debug)]
pub struct SelectorSet {
    pub rows: &'static [&'static str],
    pub subject: &'static [&'static str],
    pub snippet: &'static [&'static str],
    pub spam_action: &'static [&'static str],
    pub toolbar: &'static [&'static str],
    /// Host keyboard shortcut for "report spam", escalation stage 4.
    pub spam_shortcut: &'static str,
    pub menu_item: &'static str,
    menu_label: &'static Lazy<Regex>,
}

impl SelectorSet {
    pub fn menu_label(&self) -> &Regex {
        self.menu_label
    }
}

static GMAIL_MENU_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)report spam|spam").expect("valid gmail menu regex"));
static OUTLOOK_MENU_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)junk|report").expect("valid outlook menu regex"));

pub static GMAIL: SelectorSet = SelectorSet {
    rows: &[
        "tr.zA",
        "div[role='main'] table tbody tr[jsaction]",
        "div[role='main'] div[role='row']",
    ],
    subject: &["span.bog", "span.bqe", "div.y6 > span:first-child"],
    snippet: &["span.y2", "div.y6 + div span"],
    spam_action: &[
        "div[aria-label='Report spam']",
        "div[data-tooltip='Report spam']",
        "div.T-I[role='button'][aria-label*='spam']",
    ],
    toolbar: &["div[gh='mtb']", "div[role='toolbar']"],
    spam_shortcut: "!",
    menu_item: "div[role='menuitem']",
    menu_label: &GMAIL_MENU_LABEL,
};

pub static OUTLOOK: SelectorSet = SelectorSet {
    rows: &[
        "div[role='listbox'] div[role='option']",
        "div.customScrollBar div[draggable='true']",
        "div[data-convid]",
    ],
    subject: &[
        "span[role='heading']",
        "div[role='option'] span[title]",
        "div.jGG6V span",
    ],
    snippet: &["span.fontColorSecondary", "div[aria-hidden='true'] > span"],
    spam_action: &[
        "button[aria-label='Junk']",
        "button[name='Junk']",
        "button[title*='junk' i]",
    ],
    toolbar: &["div[role='menubar']", "div[data-app-section='CommandBar']"],
    spam_shortcut: "j",
    menu_item: "button[role='menuitem']",
    menu_label: &OUTLOOK_MENU_LABEL,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_carry_at_least_one_fallback_per_slot() {
        for set in [&GMAIL, &OUTLOOK] {
            assert!(!set.rows.is_empty());
            assert!(!set.subject.is_empty());
            assert!(!set.snippet.is_empty());
            assert!(!set.spam_action.is_empty());
            assert!(!set.toolbar.is_empty());
            assert!(!set.spam_shortcut.is_empty());
        }
    }

    #[test]
    fn menu_labels_match_native_item_captions() {
        assert!(GMAIL.menu_label().is_match("Report spam"));
        assert!(!GMAIL.menu_label().is_match("Archive"));
        assert!(OUTLOOK.menu_label().is_match("Mark as junk"));
        assert!(!OUTLOOK.menu_label().is_match("Delete"));
    }
}
