use std::time::Instant;

use locsync_domain::{Operation, OperationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validating,
    Resolving,
    Applying,
    DryRun,
    Reported,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Resolving => "resolving",
            Self::Applying => "applying",
            Self::DryRun => "dry-run",
            Self::Reported => "reported",
        }
    }

    fn rank(self) -> u8 {
        match self {
            Self::Validating => 0,
            Self::Resolving => 1,
            Self::Applying | Self::DryRun => 2,
            Self::Reported => 3,
        }
    }
}

/// Tracks one operation through its phases and logs each transition.
/// Dropping a run that never reached [`Phase::Reported`] logs an abort.
#[derive(Debug)]
pub struct Run {
    operation: Operation,
    dry_run: bool,
    phase: Phase,
    started: Instant,
}

impl Run {
    pub fn start(operation: Operation, dry_run: bool) -> Self {
        tracing::debug!(event = "run_phase", op = operation.as_str(), phase = Phase::Validating.as_str(), dry_run = dry_run);
        Self {
            operation,
            dry_run,
            phase: Phase::Validating,
            started: Instant::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn resolving(&mut self) {
        self.advance(Phase::Resolving);
    }

    /// Enter `Applying`, or `DryRun` when nothing may be written.
    pub fn applying(&mut self) {
        let next = if self.dry_run {
            Phase::DryRun
        } else {
            Phase::Applying
        };
        self.advance(next);
    }

    pub fn finish(mut self, report: OperationReport) -> OperationReport {
        self.advance(Phase::Reported);
        tracing::info!(
            event = "run_reported",
            op = self.operation.as_str(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            summary = %report.summary
        );
        report
    }

    fn advance(&mut self, next: Phase) {
        debug_assert!(
            next.rank() > self.phase.rank(),
            "phase {} cannot follow {}",
            next.as_str(),
            self.phase.as_str()
        );
        tracing::debug!(
            event = "run_phase",
            op = self.operation.as_str(),
            from = self.phase.as_str(),
            phase = next.as_str()
        );
        self.phase = next;
    }
}

impl Drop for Run {
    fn drop(&mut self) {
        if self.phase != Phase::Reported {
            tracing::debug!(event = "run_aborted", op = self.operation.as_str(), phase = self.phase.as_str());
        }
    }
}
