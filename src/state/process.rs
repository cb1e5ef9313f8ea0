//! Form process states and the transitions between them.

use std::fmt;
use std::str::FromStr;

use crate::state::StateError;

/// Where the subscription form is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessState {
    /// Nothing submitted yet.
    Initialized,
    /// The user is editing the URL.
    Filling,
    /// A submission is being validated.
    Validating,
    /// The submission passed validation.
    Validated,
    /// The submission failed validation.
    Invalidated,
    /// The feed is being loaded.
    Loading,
    /// The feed was added.
    Added,
    /// The feed could not be retrieved.
    NetworkError,
    /// The feed could not be parsed.
    ParserError,
    /// The feed is handed over to polling.
    Monitoring,
}

impl ProcessState {
    /// Every state.
    pub const ALL: [ProcessState; 10] = [
        ProcessState::Initialized,
        ProcessState::Filling,
        ProcessState::Validating,
        ProcessState::Validated,
        ProcessState::Invalidated,
        ProcessState::Loading,
        ProcessState::Added,
        ProcessState::NetworkError,
        ProcessState::ParserError,
        ProcessState::Monitoring,
    ];

    /// The state name as used in the UI layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessState::Initialized => "initialized",
            ProcessState::Filling => "filling",
            ProcessState::Validating => "validating",
            ProcessState::Validated => "validated",
            ProcessState::Invalidated => "invalidated",
            ProcessState::Loading => "loading",
            ProcessState::Added => "added",
            ProcessState::NetworkError => "networkError",
            ProcessState::ParserError => "parserError",
            ProcessState::Monitoring => "monitoring",
        }
    }

    /// Whether the form may move from `self` to `next`.
    ///
    /// `Loading -> Filling` is only taken when a load fails with an
    /// unexpected error and the form has to be handed back to the user.
    pub fn can_transition_to(&self, next: ProcessState) -> bool {
        use ProcessState::*;

        matches!(
            (self, next),
            (Initialized, Filling)
                | (Filling, Validating)
                | (Validating, Validated)
                | (Validating, Invalidated)
                | (Validated, Loading)
                | (Loading, Added)
                | (Loading, NetworkError)
                | (Loading, ParserError)
                | (Loading, Monitoring)
                | (Loading, Filling)
                | (Added, Filling)
                | (Monitoring, Filling)
                | (NetworkError, Filling)
                | (ParserError, Filling)
                | (Invalidated, Filling)
        )
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessState {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| StateError::UnknownProcessState(s.to_string()))
    }
}
