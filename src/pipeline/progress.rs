/// Outcome of recording one finished extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// Batch still running; report `(completed, total)`
    Progress { completed: usize, total: usize },
    /// This completion was the last one
    Complete,
    /// The batch had already completed; nothing to report
    AlreadyComplete,
}

/// Counts finished extraction tasks against the batch size.
///
/// The counter starts at 1, so the batch is complete when it reaches
/// `total + 1` and the progress values reported along the way run from
/// 2 to `total`. A batch of zero videos is complete from the start.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    completed: usize,
    total: usize,
}

impl ProgressAggregator {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 1,
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total + 1
    }

    pub fn record_completion(&mut self) -> Tally {
        if self.is_complete() {
            return Tally::AlreadyComplete;
        }
        self.completed += 1;
        if self.is_complete() {
            Tally::Complete
        } else {
            Tally::Progress {
                completed: self.completed,
                total: self.total,
            }
        }
    }
}
