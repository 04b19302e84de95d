pub mod selectors;

use url::Url;

pub use selectors::SelectorSet;

/// Supported webmail front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Gmail,
    Outlook,
    Unknown,
}

impl HostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKind::Gmail => "gmail",
            HostKind::Outlook => "outlook",
            HostKind::Unknown => "unknown",
        }
    }

    /// Selector strategy table for this host, `None` for `Unknown`.
    pub fn selectors(&self) -> Option<&'static SelectorSet> {
        match self {
            HostKind::Gmail => Some(&selectors::GMAIL),
            HostKind::Outlook => Some(&selectors::OUTLOOK),
            HostKind::Unknown => None,
        }
    }
}

/// Identify the active host UI from the page origin. Pure; unsupported
/// origins map to `Unknown` and downstream components become no-ops.
pub fn detect_host(url: &Url) -> HostKind {
    match url.host_str() {
        Some("mail.google.com") => HostKind::Gmail,
        Some("outlook.live.com") | Some("outlook.office.com") | Some("outlook.office365.com") => {
            HostKind::Outlook
        }
        _ => HostKind::Unknown,
    }
}
