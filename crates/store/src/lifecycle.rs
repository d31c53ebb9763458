// Path: crates/store/src/lifecycle.rs

//! The open/close state machine shared by catalogs, caches and dictionaries.
//!
//! ```text
//! Closed --begin_open--> Opening --finish_open--> Open
//!   ^                       |                       |
//!   +------abort_open-------+                  begin_close
//!   |                                               v
//!   +--------------finish_close--------------- Closing
//! ```
//!
//! Opening an open object and closing a closed one are no-ops. Owners hold
//! the [`Lifecycle`] behind a mutex for the whole transition, so concurrent
//! callers serialize.

use lexdb_types::LexError;
use std::fmt;

/// The four lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Not usable; configuration may change.
    #[default]
    Closed,
    /// Binding resources.
    Opening,
    /// Usable; configuration is frozen.
    Open,
    /// Releasing resources.
    Closing,
}

impl LifecycleState {
    fn name(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a requested transition has work to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The caller should perform the transition.
    Proceed,
    /// The object is already in the requested state.
    Noop,
}

/// A lifecycle state with guarded transitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lifecycle {
    state: LifecycleState,
}

impl Lifecycle {
    /// A closed lifecycle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the state is [`LifecycleState::Open`].
    pub fn is_open(&self) -> bool {
        self.state == LifecycleState::Open
    }

    fn illegal(&self, to: LifecycleState) -> LexError {
        LexError::IllegalTransition {
            from: self.state.name(),
            to: to.name(),
        }
    }

    /// Closed to Opening.
    pub fn begin_open(&mut self) -> Result<Transition, LexError> {
        match self.state {
            LifecycleState::Open => Ok(Transition::Noop),
            LifecycleState::Closed => {
                self.state = LifecycleState::Opening;
                Ok(Transition::Proceed)
            }
            _ => Err(self.illegal(LifecycleState::Opening)),
        }
    }

    /// Opening to Open.
    pub fn finish_open(&mut self) -> Result<(), LexError> {
        match self.state {
            LifecycleState::Opening => {
                self.state = LifecycleState::Open;
                Ok(())
            }
            _ => Err(self.illegal(LifecycleState::Open)),
        }
    }

    /// Opening back to Closed after a failed open.
    pub fn abort_open(&mut self) {
        if self.state == LifecycleState::Opening {
            self.state = LifecycleState::Closed;
        }
    }

    /// Open to Closing.
    pub fn begin_close(&mut self) -> Result<Transition, LexError> {
        match self.state {
            LifecycleState::Closed => Ok(Transition::Noop),
            LifecycleState::Open => {
                self.state = LifecycleState::Closing;
                Ok(Transition::Proceed)
            }
            _ => Err(self.illegal(LifecycleState::Closing)),
        }
    }

    /// Closing to Closed.
    pub fn finish_close(&mut self) -> Result<(), LexError> {
        match self.state {
            LifecycleState::Closing => {
                self.state = LifecycleState::Closed;
                Ok(())
            }
            _ => Err(self.illegal(LifecycleState::Closed)),
        }
    }

    /// Fails with [`LexError::ObjectClosed`] unless open.
    pub fn require_open(&self) -> Result<(), LexError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(LexError::ObjectClosed)
        }
    }

    /// Fails with [`LexError::ObjectOpen`] unless closed.
    pub fn require_closed(&self) -> Result<(), LexError> {
        if self.state == LifecycleState::Closed {
            Ok(())
        } else {
            Err(LexError::ObjectOpen)
        }
    }
}
