use std::fmt::{self, Formatter};

use crate::{ConversionOutcome, OutcomeKind};

/// One line of the file details in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultEntry {
    pub group: String,
    pub stem: String,
    pub kind: OutcomeKind,
    /// Diagnostic text of a failed conversion
    pub detail: Option<String>,
}

impl fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} - {}", self.group, self.stem, self.kind.label())
    }
}

/// Counts the outcomes of a run and remembers them in the order in which the tasks were processed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStatistics {
    converted: usize,
    skipped: usize,
    failed: usize,
    entries: Vec<ResultEntry>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a task.
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::{ConversionOutcome, RunStatistics};
    /// let mut statistics = RunStatistics::new();
    /// statistics.record("Aurora", "Idle", &ConversionOutcome::Converted);
    /// assert_eq!(statistics.converted(), 1);
    /// assert_eq!(statistics.entries()[0].to_string(), "Aurora/Idle - Converted");
    /// ```
    pub fn record(&mut self, group: impl Into<String>, stem: impl Into<String>, outcome: &ConversionOutcome) {
        let kind = outcome.kind();
        match kind {
            OutcomeKind::Converted => self.converted += 1,
            OutcomeKind::Skipped => self.skipped += 1,
            OutcomeKind::Failed => self.failed += 1,
        }
        let detail = match outcome {
            ConversionOutcome::Failed(detail) => Some(detail.to_string()),
            ConversionOutcome::Converted | ConversionOutcome::Skipped(_) => None,
        };
        self.entries.push(ResultEntry {
            group: group.into(),
            stem: stem.into(),
            kind,
            detail,
        });
    }

    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Number of recorded outcomes.
    pub fn total(&self) -> usize {
        self.converted + self.skipped + self.failed
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    /// Returns the entries of the failed conversions.
    pub fn failures(&self) -> impl Iterator<Item = &ResultEntry> {
        self.entries.iter().filter(|entry| entry.kind == OutcomeKind::Failed)
    }

    /// Returns the entries of a single group.
    #[cfg(test)]
    pub(crate) fn entries_of<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ResultEntry> + 'a {
        self.entries.iter().filter(move |entry| entry.group == group)
    }

    /// A run is successful when nothing failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FailureDetail, SkipReason};

    #[test]
    fn counts_and_order() {
        let mut statistics = RunStatistics::new();
        statistics.record("Aurora", "a", &ConversionOutcome::Converted);
        statistics.record("Aurora", "b", &ConversionOutcome::Failed(FailureDetail::ExitCode { code: 2, stderr: String::new() }));
        statistics.record("Great_Sword", "c", &ConversionOutcome::Skipped(SkipReason::AlreadyExists));

        assert_eq!(statistics.converted(), 1);
        assert_eq!(statistics.failed(), 1);
        assert_eq!(statistics.skipped(), 1);
        assert_eq!(statistics.total(), 3);
        assert!(!statistics.is_success());

        let lines = statistics.entries().iter().map(ToString::to_string).collect::<Vec<_>>();
        assert_eq!(
            lines,
            vec!["Aurora/a - Converted", "Aurora/b - Failed", "Great_Sword/c - Skipped (exists)"]
        );
        assert_eq!(statistics.entries_of("Aurora").count(), 2);

        let failures = statistics.failures().collect::<Vec<_>>();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].detail.as_deref(), Some("Exit code: 2"));
        assert_eq!(statistics.entries()[0].detail, None);
    }

    #[test]
    fn empty_run_is_successful() {
        let statistics = RunStatistics::new();
        assert!(statistics.is_success());
        assert_eq!(statistics.total(), 0);
    }
}
