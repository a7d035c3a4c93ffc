use tracing::{debug, warn};

use crate::error::SqlExecError;

/// Physical shape chosen for a clause execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPlan {
    /// No batches: the pending state runs as one statement.
    Single,
    /// All batch rows merged into one multi-row statement.
    Bulk { rows: usize },
    /// One statement with one committed parameter set per batch row.
    Sequential { rows: usize },
}

/// Committed batch rows of one clause plus the bulk-merge request.
#[derive(Debug, Clone)]
pub(crate) struct BatchCoordinator<E> {
    entries: Vec<E>,
    bulk: bool,
}

impl<E> Default for BatchCoordinator<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            bulk: false,
        }
    }
}

impl<E> BatchCoordinator<E> {
    /// Request bulk merging; only honored when the dialect supports it.
    pub(crate) fn request_bulk(&mut self, requested: bool, supported: bool) {
        if requested && !supported {
            warn!("bulk batch merging unsupported by dialect, executing batches one by one");
        }
        self.bulk = requested && supported;
    }

    pub(crate) fn commit(&mut self, entry: E) {
        self.entries.push(entry);
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[E] {
        &self.entries
    }

    /// Decide how the accumulated state executes.
    ///
    /// # Errors
    /// Returns `SqlExecError::UnsupportedCombination` when literal rendering meets batching.
    pub(crate) fn plan(&self, use_literals: bool) -> Result<BatchPlan, SqlExecError> {
        if self.bulk && use_literals {
            return Err(SqlExecError::UnsupportedCombination(
                "Batch to bulk is not supported with literals".to_string(),
            ));
        }
        let plan = match (self.entries.len(), self.bulk) {
            (0, _) => BatchPlan::Single,
            _ if use_literals => {
                return Err(SqlExecError::UnsupportedCombination(
                    "Batches are not supported with literals".to_string(),
                ));
            }
            (rows, true) => BatchPlan::Bulk { rows },
            (rows, false) => BatchPlan::Sequential { rows },
        };
        debug!(?plan, "batch plan");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_rows(rows: usize) -> BatchCoordinator<usize> {
        let mut batches = BatchCoordinator::default();
        for row in 0..rows {
            batches.commit(row);
        }
        batches
    }

    #[test]
    fn plans_follow_batch_state() {
        assert_eq!(with_rows(0).plan(false).unwrap(), BatchPlan::Single);
        assert_eq!(
            with_rows(3).plan(false).unwrap(),
            BatchPlan::Sequential { rows: 3 }
        );

        let mut bulk = with_rows(3);
        bulk.request_bulk(true, true);
        assert_eq!(bulk.plan(false).unwrap(), BatchPlan::Bulk { rows: 3 });
    }

    #[test]
    fn unsupported_bulk_falls_back() {
        let mut batches = with_rows(2);
        batches.request_bulk(true, false);
        assert_eq!(
            batches.plan(false).unwrap(),
            BatchPlan::Sequential { rows: 2 }
        );
        // without an effective bulk request literals only conflict with batches
        assert_eq!(with_rows(0).plan(true).unwrap(), BatchPlan::Single);
    }

    #[test]
    fn literals_conflict_with_batching() {
        assert!(matches!(
            with_rows(1).plan(true),
            Err(SqlExecError::UnsupportedCombination(_))
        ));

        let mut bulk = with_rows(0);
        bulk.request_bulk(true, true);
        assert!(matches!(
            bulk.plan(true),
            Err(SqlExecError::UnsupportedCombination(_))
        ));
    }

    #[test]
    fn clear_drops_rows_only() {
        let mut batches = with_rows(2);
        batches.request_bulk(true, true);
        batches.clear();
        assert!(batches.is_empty());
        batches.commit(7);
        assert_eq!(batches.plan(false).unwrap(), BatchPlan::Bulk { rows: 1 });
    }
}
