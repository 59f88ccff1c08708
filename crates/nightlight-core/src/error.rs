// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error types for the nightlight runtime

use crate::command_table::CommandTableFull;
use crate::engine::StateId;
use thiserror::Error;

/// Faults in the state stack
///
/// These mean the configured behaviors are wired wrong (too many states on
/// the stack, too many modes). They are never recovered from.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("state stack overflow: pushing {state} past the depth limit of {max_depth}")]
    StackOverflow { state: StateId, max_depth: usize },

    #[error("state stack under-run: removing {0} from an empty stack")]
    StackUnderrun(StateId),

    #[error("unknown state handle {0}")]
    UnknownState(StateId),

    #[error("state {0} is already on the stack")]
    StateAlreadyActive(StateId),

    #[error(transparent)]
    CommandTableFull(#[from] CommandTableFull),
}

/// Node-level errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("engine fault: {0}")]
    Engine(#[from] EngineError),

    #[error("invalid configuration: {0}")]
    Config(#[from] nightlight_config::ConfigError),
}

/// Convenience result type
pub type Result<T, E = NodeError> = std::result::Result<T, E>;
