use serde::{Deserialize, Serialize};

use crate::time::EpochSecs;
use crate::types::Classification;

/// Longest reason kept in the error log, in characters.
pub const MAX_REASON_CHARS: usize = 500;

/// Per-record verdict. Identifiers are the raw cell text submitted to the run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Succeeded { id: String },
    Failed { id: String, reason: String },
}

impl Outcome {
    pub fn id(&self) -> &str {
        match self {
            Outcome::Succeeded { id } | Outcome::Failed { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub id: String,
    pub reason: String,
    pub at_unix: EpochSecs,
}

impl ErrorEntry {
    pub fn new(id: impl Into<String>, reason: &str, at_unix: EpochSecs) -> Self {
        Self {
            id: id.into(),
            reason: single_line_reason(reason),
            at_unix,
        }
    }

    /// One log line. The identifier is always written in full, with line
    /// breaks and other control characters escaped.
    pub fn render(&self) -> String {
        format!("[{}] Error processing record {}: {}", self.at_unix, escape_breaks(&self.id), self.reason)
    }
}

/// Append-only, processing-ordered log of failed records.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    pub(crate) fn push(&mut self, entry: ErrorEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(identifier, reason)` pairs in processing order.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.entries.iter().map(|e| (e.id.as_str(), e.reason.as_str())).collect()
    }

    pub fn render(&self) -> String {
        let mut s = String::new();
        for e in &self.entries {
            s.push_str(&e.render());
            s.push('\n');
        }
        s
    }
}

fn is_break(c: char) -> bool {
    c.is_control() || c == '\u{2028}' || c == '\u{2029}'
}

fn escape_breaks(id: &str) -> String {
    if !id.chars().any(is_break) {
        return id.to_string();
    }
    id.chars()
        .map(|c| if is_break(c) { c.escape_default().to_string() } else { c.to_string() })
        .collect()
}

fn single_line_reason(reason: &str) -> String {
    let joined = reason
        .split(is_break)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if joined.chars().count() <= MAX_REASON_CHARS {
        return joined;
    }
    let mut cut: String = joined.chars().take(MAX_REASON_CHARS - 1).collect();
    cut.push('…');
    cut
}

impl Classification {
    /// `None` only when nothing was processed, which validation rules out.
    pub fn from_counts(success_count: usize, error_count: usize) -> Option<Self> {
        match (success_count, error_count) {
            (0, 0) => None,
            (_, 0) => Some(Classification::AllSucceeded),
            (0, _) => Some(Classification::AllFailed),
            _ => Some(Classification::PartialSuccess),
        }
    }

    pub fn export_offer(self) -> ExportOffer {
        match self {
            Classification::AllSucceeded => ExportOffer { success_rows: true, error_log: false },
            Classification::PartialSuccess => ExportOffer { success_rows: true, error_log: true },
            Classification::AllFailed => ExportOffer { success_rows: false, error_log: true },
        }
    }
}

/// Which artifacts are offered for download after a completed run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOffer {
    pub success_rows: bool,
    pub error_log: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_from_counts() {
        assert_eq!(Classification::from_counts(3, 0), Some(Classification::AllSucceeded));
        assert_eq!(Classification::from_counts(2, 1), Some(Classification::PartialSuccess));
        assert_eq!(Classification::from_counts(0, 4), Some(Classification::AllFailed));
        assert_eq!(Classification::from_counts(0, 0), None);
        // stable under recomputation
        assert_eq!(Classification::from_counts(2, 1), Classification::from_counts(2, 1));
    }

    #[test]
    fn offers_follow_classification() {
        assert_eq!(
            Classification::AllSucceeded.export_offer(),
            ExportOffer { success_rows: true, error_log: false }
        );
        assert_eq!(
            Classification::PartialSuccess.export_offer(),
            ExportOffer { success_rows: true, error_log: true }
        );
        assert_eq!(
            Classification::AllFailed.export_offer(),
            ExportOffer { success_rows: false, error_log: true }
        );
    }

    #[test]
    fn reason_collapsed_to_one_line() {
        let e = ErrorEntry::new("id-1", "first line\n  second line\r\n\nthird", 7);
        assert_eq!(e.reason, "first line second line third");
        assert_eq!(e.render(), "[7] Error processing record id-1: first line second line third");
    }

    #[test]
    fn every_line_break_kind_is_collapsed() {
        let e = ErrorEntry::new("id-1", "first\rsecond\u{2028}third\u{0b}fourth\u{85}fifth", 0);
        assert_eq!(e.reason, "first second third fourth fifth");
        assert_eq!(e.render().lines().count(), 1);
    }

    #[test]
    fn identifier_with_line_break_stays_on_one_line() {
        let mut log = ErrorLog::default();
        log.push(ErrorEntry::new("id\n-1", "locked record", 0));
        assert_eq!(log.entries()[0].id, "id\n-1");
        let rendered = log.render();
        assert_eq!(rendered, "[0] Error processing record id\\n-1: locked record\n");
        assert_eq!(rendered.lines().count(), 1);
    }

    #[test]
    fn long_reason_capped_but_identifier_kept() {
        let long = "x".repeat(MAX_REASON_CHARS * 2);
        let id = "y".repeat(200);
        let e = ErrorEntry::new(id.clone(), &long, 0);
        assert_eq!(e.reason.chars().count(), MAX_REASON_CHARS);
        assert!(e.reason.ends_with('…'));
        assert!(e.render().contains(&id));
    }

    #[test]
    fn log_renders_in_order() {
        let mut log = ErrorLog::default();
        log.push(ErrorEntry::new("b", "locked", 1));
        log.push(ErrorEntry::new("a", "gone", 2));
        assert_eq!(log.pairs(), vec![("b", "locked"), ("a", "gone")]);
        assert_eq!(
            log.render(),
            "[1] Error processing record b: locked\n[2] Error processing record a: gone\n"
        );
    }
}
