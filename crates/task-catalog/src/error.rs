//! Error types for catalog loading and resolution.

use thiserror::Error;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or resolving task definitions.
///
/// Any of these aborts the whole `parse`: the catalog stages into a scratch
/// table and only commits on success, so a failed load leaves the previous
/// state untouched.
#[derive(Debug, Error)]
pub enum Error {
    /// The task document is not a JSON object.
    #[error("task document is not a JSON object")]
    InvalidDocument,

    /// A task object failed to decode into its typed fields.
    #[error("failed to decode task '{name}': {source}")]
    Decode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required reference did not resolve to any task.
    #[error("unknown task '{name}'")]
    UnknownTask { name: String },

    /// Generation revisited a task that was still being generated.
    #[error("task '{name}' is generated cyclically")]
    CyclicDefinition { name: String },

    /// The `algorithm` tag string is not recognized.
    #[error("unknown algorithm '{algorithm}' in task '{name}'")]
    UnknownAlgorithm { name: String, algorithm: String },

    /// The `action` tag string is not recognized.
    #[error("unknown action '{action}' in task '{name}'")]
    UnknownAction { name: String, action: String },

    /// A list-field expression is malformed (operator arity, operand type,
    /// or parenthesis mismatch).
    #[error("invalid expression '{expr}' in task '{name}'")]
    InvalidExpression { name: String, expr: String },

    /// A list field contains an empty entry.
    #[error("task '{name}' has an empty entry in {list}")]
    EmptyListEntry { name: String, list: &'static str },

    /// A declared ROI exceeds the nominal window (debug builds).
    #[error("roi of task '{name}' is out of bounds")]
    RoiOutOfBounds { name: String },

    /// A task object carries a key outside its algorithm/action allow-list
    /// (debug builds).
    #[error("task '{name}' has unknown key '{key}'")]
    UnknownKey { name: String, key: String },

    /// A flow list continues past a JustReturn task (debug builds).
    #[error("{list} of task '{name}' has a not-final JustReturn task '{task}'")]
    NonFinalJustReturn {
        name: String,
        list: &'static str,
        task: String,
    },
}
