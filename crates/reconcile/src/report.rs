use ledgersync_core::SourceAccountId;
use tracing::warn;

use crate::error::{ReconcileError, Scope};

/// Everything a run skipped or aborted, plus record counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub issues: Vec<ReconcileError>,
    pub records_seen: usize,
    pub already_imported: usize,
    pub outside_dates: usize,
}

impl RunReport {
    pub fn push(&mut self, issue: ReconcileError) {
        warn!("{issue}");
        self.issues.push(issue);
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn count(&self, scope: Scope) -> usize {
        self.issues.iter().filter(|i| i.scope() == scope).count()
    }

    /// Source accounts whose whole group was abandoned.
    pub fn aborted_sources(&self) -> Vec<&SourceAccountId> {
        self.issues
            .iter()
            .filter_map(|i| match i {
                ReconcileError::UnresolvedAccount { source_account, .. }
                | ReconcileError::MappingStore { source_account, .. } => Some(source_account),
                _ => None,
            })
            .collect()
    }

    pub fn merge(&mut self, other: RunReport) {
        self.issues.extend(other.issues);
        self.records_seen += other.records_seen;
        self.already_imported += other.already_imported;
        self.outside_dates += other.outside_dates;
    }
}
