//! Bot lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed, never started.
    Created,
    /// Start hook completed.
    Started,
    /// Stop hook completed.
    Stopped,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Started,
            2 => Self::Stopped,
            _ => Self::Created,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Created => 0,
            Self::Started => 1,
            Self::Stopped => 2,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Started => write!(f, "Started"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Atomic lifecycle state shared between hooks.
///
/// Transitions are compare-and-swap, so two concurrent `start` calls cannot
/// both win.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Created` state.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created.as_u8()),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns whether the bot is started.
    pub fn is_started(&self) -> bool {
        self.state() == LifecycleState::Started
    }

    /// Moves `Created`/`Stopped` to `Started`.
    ///
    /// Returns the previous state, or `None` if already started.
    pub fn begin_start(&self) -> Option<LifecycleState> {
        for from in [LifecycleState::Created, LifecycleState::Stopped] {
            if self
                .state
                .compare_exchange(
                    from.as_u8(),
                    LifecycleState::Started.as_u8(),
                    Ordering::AcqRel,
                    Ordering::Acquire,
                )
                .is_ok()
            {
                return Some(from);
            }
        }
        None
    }

    /// Moves `Started` to `Stopped`. Returns `false` if not started.
    pub fn begin_stop(&self) -> bool {
        self.state
            .compare_exchange(
                LifecycleState::Started.as_u8(),
                LifecycleState::Stopped.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Restores `previous` after a failed start.
    pub fn rollback(&self, previous: LifecycleState) {
        self.state.store(previous.as_u8(), Ordering::Release);
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
