//! Compute Function Accessor
//!
//! A compute function never touches the value store directly. It receives an
//! [`Accessor`], which runs in one of two modes:
//!
//! 1. **Declare** mode, once, at registration. The function calls
//!    [`Accessor::input`] and [`Accessor::output`] to announce what it reads
//!    and writes. [`Accessor::do_compute`] returns `false`, so the function
//!    returns before doing any real work.
//!
//! 2. **Compute** mode, at initialization and on every recomputation. The
//!    declarations are no-ops, [`Accessor::do_compute`] returns `true`, and the
//!    function reads its inputs with [`Accessor::get`] and writes its output
//!    with [`Accessor::set`].
//!
//! The same function value runs in both modes, so it must declare the same
//! inputs and output every time. In compute mode the accessor enforces the
//! declaration: reading anything but a declared input, or writing anything
//! but the declared output, is an error.
//!
//! # Example
//!
//! ```rust,ignore
//! propagator.add_dependent_var(|acc| {
//!     acc.input(Var::Price).input(Var::Quantity).output(Var::Total);
//!     if !acc.do_compute() {
//!         return Ok(());
//!     }
//!     let price: f64 = acc.get(Var::Price)?;
//!     let quantity: i64 = acc.get(Var::Quantity)?;
//!     acc.set(Var::Total, price * quantity as f64)
//! })?;
//! ```

use std::hash::Hash;

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::value::{FromValue, Value};
use crate::error::PropagatorError;

/// Inputs and outputs recorded in declare mode.
#[derive(Debug, Clone)]
pub(crate) struct Declaration<V> {
    pub(crate) inputs: SmallVec<[V; 4]>,
    pub(crate) outputs: SmallVec<[V; 1]>,
}

impl<V> Default for Declaration<V> {
    fn default() -> Self {
        Self {
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
        }
    }
}

enum Mode<'a, V> {
    Declare(Declaration<V>),
    Compute {
        output: V,
        inputs: &'a [V],
        values: &'a IndexMap<V, Value>,
        written: Option<Value>,
    },
}

/// The handle a compute function uses to declare and access variables.
pub struct Accessor<'a, V> {
    mode: Mode<'a, V>,
}

impl<'a, V> Accessor<'a, V>
where
    V: Copy + Eq + Hash,
{
    /// Accessor for the registration-time declaration pass.
    pub(crate) fn declaring() -> Self {
        Self {
            mode: Mode::Declare(Declaration::default()),
        }
    }

    /// Accessor for evaluating the variable `output`.
    pub(crate) fn computing(
        output: V,
        inputs: &'a [V],
        values: &'a IndexMap<V, Value>,
    ) -> Self {
        Self {
            mode: Mode::Compute {
                output,
                inputs,
                values,
                written: None,
            },
        }
    }

    /// Whether the function should do its real work.
    pub fn do_compute(&self) -> bool {
        matches!(self.mode, Mode::Compute { .. })
    }

    /// Declare that the function reads `id`.
    pub fn input(&mut self, id: V) -> &mut Self {
        if let Mode::Declare(declaration) = &mut self.mode {
            if !declaration.inputs.contains(&id) {
                declaration.inputs.push(id);
            }
        }
        self
    }

    /// Declare that the function writes `id`.
    pub fn output(&mut self, id: V) -> &mut Self {
        if let Mode::Declare(declaration) = &mut self.mode {
            if !declaration.outputs.contains(&id) {
                declaration.outputs.push(id);
            }
        }
        self
    }

    /// Read a declared input as `T`.
    pub fn get<T: FromValue>(&self, id: V) -> Result<T, PropagatorError<V>> {
        let value = self.value(id)?;
        value.get().map_err(|source| PropagatorError::Value {
            variable: id,
            source,
        })
    }

    /// Borrow the boxed value of a declared input.
    pub fn value(&self, id: V) -> Result<&Value, PropagatorError<V>> {
        match &self.mode {
            Mode::Declare(_) => Err(PropagatorError::ReadDuringDeclaration(id)),
            Mode::Compute {
                output,
                inputs,
                values,
                ..
            } => {
                if !inputs.contains(&id) {
                    return Err(PropagatorError::UndeclaredRead {
                        output: *output,
                        input: id,
                    });
                }
                values.get(&id).ok_or(PropagatorError::UnknownVariable(id))
            }
        }
    }

    /// Write the declared output.
    pub fn set(&mut self, id: V, value: impl Into<Value>) -> Result<(), PropagatorError<V>> {
        match &mut self.mode {
            Mode::Declare(_) => Err(PropagatorError::WriteDuringDeclaration(id)),
            Mode::Compute {
                output, written, ..
            } => {
                if id != *output {
                    return Err(PropagatorError::UndeclaredWrite {
                        output: *output,
                        target: id,
                    });
                }
                *written = Some(value.into());
                Ok(())
            }
        }
    }

    /// What the function declared. Empty in compute mode.
    pub(crate) fn into_declaration(self) -> Declaration<V> {
        match self.mode {
            Mode::Declare(declaration) => declaration,
            Mode::Compute { .. } => Declaration::default(),
        }
    }

    /// The value the function wrote, if any. `None` in declare mode.
    pub(crate) fn into_written(self) -> Option<Value> {
        match self.mode {
            Mode::Declare(_) => None,
            Mode::Compute { written, .. } => written,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::propagate::{ValueError, ValueKind};

    #[test]
    fn declare_mode_records_without_duplicates() {
        let mut acc = Accessor::declaring();
        acc.input('a').input('b').input('a').output('x').output('x');

        assert!(!acc.do_compute());
        let declaration = acc.into_declaration();
        assert_eq!(declaration.inputs.as_slice(), &['a', 'b']);
        assert_eq!(declaration.outputs.as_slice(), &['x']);
    }

    #[test]
    fn declare_mode_rejects_access() {
        let mut acc: Accessor<'_, char> = Accessor::declaring();

        assert_eq!(
            acc.get::<i64>('a'),
            Err(PropagatorError::ReadDuringDeclaration('a'))
        );
        assert_eq!(
            acc.set('x', 1),
            Err(PropagatorError::WriteDuringDeclaration('x'))
        );
    }

    #[test]
    fn compute_mode_reads_inputs_and_writes_output() {
        let mut values = IndexMap::new();
        values.insert('a', Value::from(20));
        let inputs = ['a'];

        let mut acc = Accessor::computing('x', &inputs, &values);
        assert!(acc.do_compute());

        let a: i64 = acc.get('a').unwrap();
        acc.set('x', a * 2).unwrap();

        assert_eq!(acc.into_written(), Some(Value::Int(40)));
    }

    #[test]
    fn compute_mode_enforces_declaration() {
        let mut values = IndexMap::new();
        values.insert('a', Value::from(1));
        values.insert('b', Value::from(2));
        let inputs = ['a'];

        let mut acc = Accessor::computing('x', &inputs, &values);

        assert_eq!(
            acc.get::<i64>('b'),
            Err(PropagatorError::UndeclaredRead {
                output: 'x',
                input: 'b'
            })
        );
        assert_eq!(
            acc.set('y', 0),
            Err(PropagatorError::UndeclaredWrite {
                output: 'x',
                target: 'y'
            })
        );
        assert_eq!(acc.into_written(), None);
    }

    #[test]
    fn compute_mode_reports_type_mismatch() {
        let mut values = IndexMap::new();
        values.insert('a', Value::from("text"));
        let inputs = ['a'];

        let acc = Accessor::computing('x', &inputs, &values);

        assert_eq!(
            acc.get::<bool>('a'),
            Err(PropagatorError::Value {
                variable: 'a',
                source: ValueError::TypeMismatch {
                    expected: ValueKind::Bool,
                    found: ValueKind::Text,
                },
            })
        );
    }

    #[test]
    fn declarations_are_ignored_when_computing() {
        let values = IndexMap::new();
        let inputs = ['a'];

        let mut acc = Accessor::computing('x', &inputs, &values);
        acc.input('z').output('q');

        let declaration = acc.into_declaration();
        assert!(declaration.inputs.is_empty());
        assert!(declaration.outputs.is_empty());
    }
}
