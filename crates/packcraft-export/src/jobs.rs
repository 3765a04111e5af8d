//! Supersede-on-new-request tracking for in-flight exports.

use crate::error::{ExportError, ExportResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Issues export tickets; only the most recently issued ticket stays current.
#[derive(Debug, Clone, Default)]
pub struct ExportJobs {
    generation: Arc<AtomicU64>,
}

impl ExportJobs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new export, superseding every earlier ticket.
    pub fn begin(&self) -> ExportTicket {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        ExportTicket {
            generation,
            latest: Arc::clone(&self.generation),
        }
    }

    /// Supersede all outstanding tickets without starting a new export.
    pub fn cancel_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// Handle carried by one export run.
#[derive(Debug, Clone)]
pub struct ExportTicket {
    generation: u64,
    latest: Arc<AtomicU64>,
}

impl ExportTicket {
    /// A ticket that can never be superseded, for one-off exports.
    pub fn detached() -> Self {
        Self {
            generation: 0,
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Fail with [`ExportError::Superseded`] once a newer export has begun.
    pub fn check(&self) -> ExportResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            log::warn!("Export #{} superseded by a newer request", self.generation);
            Err(ExportError::Superseded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_ticket_wins() {
        let jobs = ExportJobs::new();
        let first = jobs.begin();
        assert!(first.is_current());

        let second = jobs.begin();
        assert!(!first.is_current());
        assert!(second.is_current());
        assert_eq!(first.check(), Err(ExportError::Superseded));
        assert_eq!(second.check(), Ok(()));
    }

    #[test]
    fn test_cancel_all() {
        let jobs = ExportJobs::new();
        let ticket = jobs.begin();
        jobs.cancel_all();
        assert!(!ticket.is_current());
        assert!(jobs.begin().is_current());
    }

    #[test]
    fn test_clones_share_generation() {
        let jobs = ExportJobs::new();
        let ticket = jobs.begin();
        let other = jobs.clone();
        let _newer = other.begin();
        assert!(!ticket.is_current());
    }

    #[test]
    fn test_detached_ticket_stays_current() {
        assert!(ExportTicket::detached().check().is_ok());
    }
}
