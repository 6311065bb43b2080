//! Status-change note parser.
//!
//! Transitions are rendered into the activity log as prose:
//!
//! ```text
//! Status changed from "Waiting Assessment" to "In Progress" (0.42 days in previous status)
//! ```
//!
//! For jobs that predate the `status_events` table this prose is the only
//! surviving history, so the parser turns it back into structured label
//! pairs. The trailing duration annotation is informational and never
//! re-parsed.

use regex::Regex;

/// Marker every rendered status-change note starts its pattern with.
/// Notes containing the marker but failing the full pattern are treated
/// as ordinary notes, not errors.
const TRIGGER: &str = "Status changed from \"";

/// A status change extracted from one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedStatusChange {
    pub from_label: String,
    pub to_label: String,
}

/// Parser over the canonical status-change note format.
pub struct StatusChangeParser {
    pattern: Regex,
}

impl Default for StatusChangeParser {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusChangeParser {
    pub fn new() -> Self {
        // Non-greedy: the "to" label ends at the first closing quote, so
        // labels containing quotes are truncated there. The legacy note
        // format has no escaping.
        let pattern = Regex::new(r#"Status changed from "(.*?)" to "(.*?)""#)
            .expect("status-change pattern is valid");
        Self { pattern }
    }

    /// Extracts the status change encoded in `note`, if any.
    /// Returns `None` for ordinary notes and for malformed ones.
    pub fn parse(&self, note: &str) -> Option<ParsedStatusChange> {
        if !note.contains(TRIGGER) {
            return None;
        }
        let captures = self.pattern.captures(note)?;
        Some(ParsedStatusChange {
            from_label: captures[1].to_string(),
            to_label: captures[2].to_string(),
        })
    }

    /// Whether `note` encodes a status change.
    pub fn is_status_change(&self, note: &str) -> bool {
        self.parse(note).is_some()
    }
}

/// Renders the canonical status-change note, with the informational
/// duration suffix the parser ignores.
pub fn render_status_change_note(
    from_label: &str,
    to_label: &str,
    days_in_previous: f64,
) -> String {
    format!(
        "Status changed from \"{}\" to \"{}\" ({:.2} days in previous status)",
        from_label, to_label, days_in_previous
    )
}
