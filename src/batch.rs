use crate::GroupId;

/// Splits `ids` into consecutive chunks of `size` ids, the last one possibly shorter.
/// A `size` of 0 is treated as 1.
pub fn chunk_ids(ids: &[GroupId], size: usize) -> Vec<&[GroupId]> {
    ids.chunks(size.max(1)).collect()
}

/// Terminal result of processing one id. Retries happen before this exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub id: GroupId,
    pub success: bool,
    /// The artifact was already on disk, nothing was requested.
    pub skipped: bool,
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn skipped(id: GroupId) -> Self {
        Self {
            id,
            success: true,
            skipped: true,
            error: None,
        }
    }

    pub fn fetched(id: GroupId) -> Self {
        Self {
            id,
            success: true,
            skipped: false,
            error: None,
        }
    }

    pub fn failed(id: GroupId, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            skipped: false,
            error: Some(error.into()),
        }
    }
}

/// Counts for one batch. Skipped ids count as succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchSummary {
    /// 0-based position of the batch in the run.
    pub index: usize,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes(index: usize, outcomes: &[FetchOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.success).count();
        let skipped = outcomes.iter().filter(|o| o.skipped).count();
        Self {
            index,
            total: outcomes.len(),
            succeeded,
            skipped,
            failed: outcomes.len() - succeeded,
        }
    }
}

/// Everything one run produced: per-batch counts and every outcome in input order.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub batches: Vec<BatchSummary>,
    pub outcomes: Vec<FetchOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.batches.iter().map(|b| b.succeeded).sum()
    }

    pub fn skipped(&self) -> usize {
        self.batches.iter().map(|b| b.skipped).sum()
    }

    pub fn failed(&self) -> usize {
        self.batches.iter().map(|b| b.failed).sum()
    }
}
