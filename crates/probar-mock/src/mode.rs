//! Mode Controller
//!
//! Decides what the next call on a mock means: a real invocation, the
//! definition of a stub, or a verification query.
//!
//! Protocol: `enter` arms exactly one capture and returns a ticket. The next
//! matching call is captured, the mode drops back to [`Mode::Live`] inside that
//! same dispatch, and the capture waits under its ticket until the holder
//! takes it. Arming a new capture keeps earlier unclaimed captures, so two
//! enter-first verifications can be compared afterwards. Only one capture is
//! armed at a time: arming replaces a capture that has not seen its call yet.

use crate::ledger::TargetId;
use crate::matcher::ArgMatcherList;
use crate::stub::StubHandle;
use crate::verification::VerificationSpec;
use std::collections::HashMap;

/// Meaning of the next mock call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Record the call and run its stub
    #[default]
    Live,
    /// Capture the call as a stub definition
    DefiningStub,
    /// Capture the call as a verification query
    Verifying,
}

/// A captured stub definition or verification query
#[derive(Debug)]
pub enum Captured {
    /// Registered stub group awaiting its action
    Stub(StubHandle),
    /// Verification query
    Verification(VerificationSpec),
}

#[derive(Debug)]
struct Armed {
    ticket: u64,
    target: Option<TargetId>,
    matchers: Option<ArgMatcherList>,
}

/// Mode flag plus pending captures by ticket
#[derive(Debug, Default)]
pub struct ModeController {
    mode: Mode,
    armed: Option<Armed>,
    pending: HashMap<u64, Captured>,
    next_ticket: u64,
}

impl ModeController {
    /// Create a controller in live mode
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// Back to live mode, dropping every armed or pending capture
    pub fn enter_live(&mut self) {
        self.mode = Mode::Live;
        self.armed = None;
        self.pending.clear();
    }

    /// Arm a capture for the next call on `target` (any mock when `None`)
    ///
    /// Explicit `matchers` replace the captured call's own arguments.
    pub fn enter(
        &mut self,
        mode: Mode,
        target: Option<TargetId>,
        matchers: Option<ArgMatcherList>,
    ) -> u64 {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.mode = mode;
        self.armed = match mode {
            Mode::Live => None,
            Mode::DefiningStub | Mode::Verifying => Some(Armed {
                ticket,
                target,
                matchers,
            }),
        };
        ticket
    }

    /// Mode that applies to a call on `target`
    #[must_use]
    pub fn route(&self, target: TargetId) -> Mode {
        match &self.armed {
            Some(armed) if armed.target.map_or(true, |t| t == target) => self.mode,
            _ => Mode::Live,
        }
    }

    /// Consume the armed capture, returning to live mode
    ///
    /// Returns the capture's ticket and its explicit matchers, if any.
    pub fn begin_capture(&mut self) -> Option<(u64, Option<ArgMatcherList>)> {
        self.mode = Mode::Live;
        self.armed.take().map(|a| (a.ticket, a.matchers))
    }

    /// Park a capture for its ticket holder
    pub fn store(&mut self, ticket: u64, captured: Captured) {
        self.pending.insert(ticket, captured);
    }

    /// Take the capture belonging to `ticket`
    pub fn take_pending(&mut self, ticket: u64) -> Option<Captured> {
        self.pending.remove(&ticket)
    }

    /// Abandon the capture of `ticket`, whether still armed or pending
    pub fn disarm(&mut self, ticket: u64) {
        if self.armed.as_ref().is_some_and(|a| a.ticket == ticket) {
            self.armed = None;
            self.mode = Mode::Live;
        }
        self.pending.remove(&ticket);
    }
}
