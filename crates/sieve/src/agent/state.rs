//! States of a single agent invocation.

use crate::error::GenerationError;

/// Prompt and response threaded through one agent invocation.
///
/// The prompt is fixed at creation. The response is filled in once, by the
/// transition into [`AgentState::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleaningState {
    input_text: String,
    structured_response: Option<String>,
}

impl CleaningState {
    /// Create a state holding a rendered prompt and no response.
    pub fn new(input_text: impl Into<String>) -> Self {
        Self {
            input_text: input_text.into(),
            structured_response: None,
        }
    }

    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// The model's answer, or `""` before the agent has finished.
    pub fn structured_response(&self) -> &str {
        self.structured_response.as_deref().unwrap_or_default()
    }

    /// Whether the terminal transition has fired.
    pub fn is_complete(&self) -> bool {
        self.structured_response.is_some()
    }

    /// Take the response out of a completed state.
    pub fn into_response(self) -> String {
        self.structured_response.unwrap_or_default()
    }

    /// New state with the same prompt and the given response.
    pub(super) fn complete(self, response: String) -> Self {
        Self {
            input_text: self.input_text,
            structured_response: Some(response),
        }
    }
}

/// Position of an invocation in the agent's state machine.
///
/// ```text
/// Start -> Invoked(1) -> Done
///              |
///              +-> Retrying(n) -> Invoked(n + 1) -> ...
///              |
///              +-> Failed
/// ```
///
/// `Retrying` is only reachable while attempts remain under the agent's
/// retry limit. With no retries the flow is `Start -> Invoked -> Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentState {
    /// Prompt rendered, nothing sent yet.
    Start(CleaningState),
    /// About to call the generator. `attempt` is 1-based.
    Invoked { state: CleaningState, attempt: u32 },
    /// The last attempt failed and another one is allowed.
    Retrying {
        state: CleaningState,
        attempt: u32,
        error: GenerationError,
    },
    /// Terminal: the response is populated.
    Done(CleaningState),
    /// Terminal: every allowed attempt failed.
    Failed { error: GenerationError, attempts: u32 },
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::Done(_) | AgentState::Failed { .. })
    }

    /// Short lowercase label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            AgentState::Start(_) => "start",
            AgentState::Invoked { .. } => "invoked",
            AgentState::Retrying { .. } => "retrying",
            AgentState::Done(_) => "done",
            AgentState::Failed { .. } => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_empty_until_complete() {
        let state = CleaningState::new("prompt");
        assert_eq!(state.structured_response(), "");
        assert!(!state.is_complete());

        let done = state.complete("a\n1".to_string());
        assert_eq!(done.input_text(), "prompt");
        assert_eq!(done.structured_response(), "a\n1");
        assert!(done.is_complete());
        assert_eq!(done.into_response(), "a\n1");
    }

    #[test]
    fn test_terminal_states() {
        let state = CleaningState::new("p");
        assert!(!AgentState::Start(state.clone()).is_terminal());
        assert!(AgentState::Done(state).is_terminal());
        assert!(AgentState::Failed {
            error: GenerationError::EmptyResponse,
            attempts: 1
        }
        .is_terminal());
    }
}
