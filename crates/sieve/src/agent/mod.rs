//! The cleaning agent: one generator call per batch, driven as a state machine.

mod state;

pub use state::{AgentState, CleaningState};

use thiserror::Error;

use crate::batch::Batch;
use crate::error::GenerationError;
use crate::input::ContextHints;
use crate::llm::prompts;
use crate::llm::TextGenerator;

/// The agent gave up on an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed after {attempts} attempt(s): {error}")]
pub struct AgentFailure {
    /// Error from the last attempt.
    #[source]
    pub error: GenerationError,
    /// Number of generator calls made.
    pub attempts: u32,
}

/// Turns a batch into a prompt and the prompt into a cleaned response.
pub struct CleaningAgent<'g> {
    generator: &'g dyn TextGenerator,
    context: ContextHints,
    max_retries: u32,
}

impl<'g> CleaningAgent<'g> {
    /// Create an agent that calls `generator` once per invocation.
    pub fn new(generator: &'g dyn TextGenerator) -> Self {
        Self {
            generator,
            context: ContextHints::default(),
            max_retries: 0,
        }
    }

    /// Add context hints to every prompt.
    pub fn with_context(mut self, context: ContextHints) -> Self {
        self.context = context;
        self
    }

    /// Allow up to `max_retries` further calls after a failed one.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Render the prompt for a batch.
    pub fn prepare(&self, batch: &Batch<'_>) -> Result<CleaningState, GenerationError> {
        prompts::cleaning_prompt(batch, &self.context)
            .map(CleaningState::new)
            .map_err(|e| GenerationError::Prompt(e.to_string()))
    }

    /// Perform one transition. Terminal states are returned unchanged.
    pub fn advance(&self, state: AgentState) -> AgentState {
        let next = match state {
            AgentState::Start(state) => AgentState::Invoked { state, attempt: 1 },
            AgentState::Invoked { state, attempt } => {
                match self.generator.generate(state.input_text()) {
                    Ok(response) => AgentState::Done(state.complete(response)),
                    Err(error) if attempt <= self.max_retries => {
                        tracing::warn!(
                            attempt,
                            max_retries = self.max_retries,
                            error = %error,
                            "generation failed, retrying"
                        );
                        AgentState::Retrying {
                            state,
                            attempt,
                            error,
                        }
                    }
                    Err(error) => AgentState::Failed {
                        error,
                        attempts: attempt,
                    },
                }
            }
            AgentState::Retrying { state, attempt, .. } => AgentState::Invoked {
                state,
                attempt: attempt + 1,
            },
            terminal => return terminal,
        };
        tracing::trace!(state = next.name(), "agent transition");
        next
    }

    /// Drive a prepared state to a terminal one.
    ///
    /// On success, also returns the number of generator calls made.
    pub fn run_state(&self, state: CleaningState) -> Result<(CleaningState, u32), AgentFailure> {
        let mut current = AgentState::Start(state);
        let mut attempts = 0;
        loop {
            current = self.advance(current);
            match current {
                AgentState::Invoked { attempt, .. } => attempts = attempt,
                AgentState::Done(state) => return Ok((state, attempts)),
                AgentState::Failed { error, attempts } => {
                    return Err(AgentFailure { error, attempts });
                }
                _ => {}
            }
        }
    }

    /// Clean one batch.
    pub fn run(&self, batch: &Batch<'_>) -> Result<CleaningState, AgentFailure> {
        self.run_counted(batch).map(|(state, _)| state)
    }

    /// Clean one batch and report how many generator calls it took.
    pub fn run_counted(&self, batch: &Batch<'_>) -> Result<(CleaningState, u32), AgentFailure> {
        let span = tracing::debug_span!("agent", batch = batch.number(), rows = batch.len());
        let _guard = span.enter();
        let state = self
            .prepare(batch)
            .map_err(|error| AgentFailure { error, attempts: 0 })?;
        self.run_state(state)
    }
}
