//! Error Types
//!
//! Every fallible operation returns [`PropagatorError`]. Nothing in the crate
//! panics on bad input; a mistake by the caller becomes an error value and a
//! `tracing` warning.

use thiserror::Error;

use crate::propagate::ValueError;

/// Errors raised by the propagator and by compute functions.
///
/// Grouped by when they surface:
///
/// - Registration: `DuplicateVariable`, `NoOutput`, `MultipleOutputs`,
///   `NoInputs`, `SelfDependency`, `ReadDuringDeclaration`,
///   `WriteDuringDeclaration`. These are accumulated and make `initialize`
///   fail.
/// - Initialization: `UnregisteredInput`, `CyclicDependency`,
///   `OutputNotSet`, `InitializationFailed`.
/// - Runtime usage: everything else.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropagatorError<V> {
    /// The identifier is already registered as a free or dependent variable.
    #[error("variable {0:?} is already registered")]
    DuplicateVariable(V),

    /// A compute function declared no output.
    #[error("compute function declares no output")]
    NoOutput,

    /// A compute function declared more than one output.
    #[error("compute function declares {} outputs: {0:?}", .0.len())]
    MultipleOutputs(Vec<V>),

    /// A compute function declared no inputs.
    #[error("compute function for {0:?} declares no inputs")]
    NoInputs(V),

    /// A compute function lists its own output among its inputs.
    #[error("variable {0:?} depends on itself")]
    SelfDependency(V),

    /// A compute function read a value while only declaring.
    #[error("value of {0:?} read while declaring dependencies")]
    ReadDuringDeclaration(V),

    /// A compute function wrote a value while only declaring.
    #[error("value of {0:?} written while declaring dependencies")]
    WriteDuringDeclaration(V),

    /// A declared input was never registered.
    #[error("{output:?} reads {input:?}, which is not registered")]
    UnregisteredInput { output: V, input: V },

    /// The dependency graph has a cycle. Lists every variable that could not
    /// be ordered.
    #[error("cyclic dependency among {0:?}")]
    CyclicDependency(Vec<V>),

    /// A compute function returned without writing its output.
    #[error("compute function for {0:?} did not set its output")]
    OutputNotSet(V),

    /// A compute function read a variable it did not declare as an input.
    #[error("{output:?} read undeclared input {input:?}")]
    UndeclaredRead { output: V, input: V },

    /// A compute function wrote a variable other than its declared output.
    #[error("{output:?} wrote undeclared output {target:?}")]
    UndeclaredWrite { output: V, target: V },

    /// `initialize` found one or more problems. All of them are listed.
    #[error("initialization failed with {} error(s)", .0.len())]
    InitializationFailed(Vec<PropagatorError<V>>),

    /// `initialize` already ran, or registration was attempted after it.
    #[error("propagator is already initialized")]
    AlreadyInitialized,

    /// Values were requested before a successful `initialize`.
    #[error("propagator is not initialized")]
    NotInitialized,

    /// The identifier is not registered at all.
    #[error("unknown variable {0:?}")]
    UnknownVariable(V),

    /// Updates may only target free variables.
    #[error("{0:?} is not a free variable")]
    NotFreeVariable(V),

    /// A stored value could not be read as the requested type.
    #[error("variable {variable:?}: {source}")]
    Value {
        variable: V,
        #[source]
        source: ValueError,
    },
}

impl<V> PropagatorError<V> {
    /// Whether this error belongs to the registration phase.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            PropagatorError::DuplicateVariable(_)
                | PropagatorError::NoOutput
                | PropagatorError::MultipleOutputs(_)
                | PropagatorError::NoInputs(_)
                | PropagatorError::SelfDependency(_)
                | PropagatorError::ReadDuringDeclaration(_)
                | PropagatorError::WriteDuringDeclaration(_)
        )
    }
}
