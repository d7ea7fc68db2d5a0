//! Error context.
//!
//! Two recovery paths:
//!
//! - non-self-solvable: the operator resigns the error with reset, then
//!   confirms the restart with start;
//! - self-solvable: the subsystem reports the error solved, then a single
//!   reset leaves. Resets and starts before that have no effect.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SelfSolvable,
    NonSelfSolvable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorContext {
    pub kind: ErrorKind,
    pub resolved: bool,
    pub resigned_by_operator: bool,
    pub requires_restart_confirmation: bool,
}

impl ErrorContext {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            resolved: false,
            resigned_by_operator: false,
            requires_restart_confirmation: kind == ErrorKind::NonSelfSolvable,
        }
    }

    /// Reset pressed. Returns `true` if the error is cleared.
    pub fn on_reset(&mut self) -> bool {
        match self.kind {
            ErrorKind::NonSelfSolvable => {
                self.resigned_by_operator = true;
                false
            }
            ErrorKind::SelfSolvable if self.resolved => {
                self.resigned_by_operator = true;
                true
            }
            ErrorKind::SelfSolvable => {
                debug!("Reset ignored: error not solved yet");
                false
            }
        }
    }

    /// Start pressed. Returns `true` if the error is cleared.
    pub fn on_start(&mut self) -> bool {
        self.requires_restart_confirmation && self.resigned_by_operator
    }

    /// Subsystem reports the error solved.
    pub fn on_self_solved(&mut self) {
        match self.kind {
            ErrorKind::SelfSolvable => self.resolved = true,
            ErrorKind::NonSelfSolvable => debug!("Self-solved ignored for non-self-solvable error"),
        }
    }
}
