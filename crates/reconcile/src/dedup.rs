use ledgersync_core::{ExternalId, NormalizedTransaction, RemoteTransaction};
use std::collections::HashSet;

/// External ids already present in the ledger for one destination account.
#[derive(Debug, Clone, Default)]
pub struct RemoteIndex {
    ids: HashSet<ExternalId>,
}

impl RemoteIndex {
    pub fn from_remote(remote: &[RemoteTransaction]) -> Self {
        Self {
            ids: remote.iter().filter_map(|t| t.external_id.clone()).collect(),
        }
    }

    pub fn contains(&self, id: &ExternalId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Splits off the records the ledger already has. Returns the new ones in
    /// input order and how many were dropped.
    pub fn filter_new(&self, batch: Vec<NormalizedTransaction>) -> (Vec<NormalizedTransaction>, usize) {
        let before = batch.len();
        let fresh: Vec<_> = batch
            .into_iter()
            .filter(|t| !self.contains(&t.external_id))
            .collect();
        let dropped = before - fresh.len();
        (fresh, dropped)
    }
}

/// Records of `batch` whose external id appears in none of `remote`.
pub fn filter_new(
    batch: Vec<NormalizedTransaction>,
    remote: &[RemoteTransaction],
) -> Vec<NormalizedTransaction> {
    RemoteIndex::from_remote(remote).filter_new(batch).0
}
