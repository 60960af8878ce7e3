use std::fmt;

use tracing::{debug, warn};

use crate::error::AppResult;

/// Phases of one `clean` invocation. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CleanStage {
    Idle,
    Extracting,
    Fetching,
    Filtering,
    Deciding,
    Deleting,
    Done,
    Failed,
}

impl CleanStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CleanStage::Done | CleanStage::Failed)
    }
}

impl fmt::Display for CleanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CleanStage::Idle => "idle",
            CleanStage::Extracting => "extracting",
            CleanStage::Fetching => "fetching",
            CleanStage::Filtering => "filtering",
            CleanStage::Deciding => "deciding",
            CleanStage::Deleting => "deleting",
            CleanStage::Done => "done",
            CleanStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct CleanProgress {
    stage: CleanStage,
}

impl Default for CleanProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl CleanProgress {
    pub fn new() -> Self {
        Self {
            stage: CleanStage::Idle,
        }
    }

    pub fn stage(&self) -> CleanStage {
        self.stage
    }

    /// Moves to `next` if it lies ahead of the current stage. Returns whether
    /// the transition happened.
    pub fn advance(&mut self, next: CleanStage) -> bool {
        if self.stage.is_terminal() || next <= self.stage || next == CleanStage::Failed {
            warn!(from = %self.stage, to = %next, "ignored clean stage transition");
            return false;
        }
        debug!(from = %self.stage, to = %next, "clean stage");
        self.stage = next;
        true
    }

    pub fn fail(&mut self) {
        if !self.stage.is_terminal() {
            debug!(from = %self.stage, "clean stage failed");
            self.stage = CleanStage::Failed;
        }
    }

    /// Passes `result` through, moving to `Failed` on error.
    pub fn check<T>(&mut self, result: AppResult<T>) -> AppResult<T> {
        if result.is_err() {
            self.fail();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[test]
    fn moves_forward_only() {
        let mut progress = CleanProgress::new();
        assert!(progress.advance(CleanStage::Extracting));
        assert!(progress.advance(CleanStage::Fetching));
        assert!(!progress.advance(CleanStage::Extracting));
        assert!(!progress.advance(CleanStage::Fetching));
        assert_eq!(progress.stage(), CleanStage::Fetching);
        assert!(progress.advance(CleanStage::Deleting));
        assert!(progress.advance(CleanStage::Done));
        assert!(!progress.advance(CleanStage::Done));
    }

    #[test]
    fn failure_is_terminal() {
        let mut progress = CleanProgress::new();
        progress.advance(CleanStage::Deciding);
        let result: AppResult<()> = progress.check(Err(AppError::NothingToDelete));
        assert!(result.is_err());
        assert_eq!(progress.stage(), CleanStage::Failed);
        assert!(!progress.advance(CleanStage::Deleting));
        assert_eq!(progress.stage(), CleanStage::Failed);
    }

    #[test]
    fn success_keeps_stage() {
        let mut progress = CleanProgress::new();
        progress.advance(CleanStage::Extracting);
        assert_eq!(progress.check(Ok(7)).unwrap(), 7);
        assert_eq!(progress.stage(), CleanStage::Extracting);
    }
}
