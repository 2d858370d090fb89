//! Propagator
//!
//! The propagator owns the variable registry, the compute functions, the
//! current values and the affected-set cache, and drives evaluation.
//!
//! # Lifecycle
//!
//! 1. **Registration.** `add_free_var` and `add_dependent_var` build the
//!    registry. Mistakes are returned to the caller and also remembered, so
//!    `initialize` can report all of them at once.
//!
//! 2. **Initialization.** `initialize` checks that every input is registered,
//!    adds one edge per input to the graph, sorts it topologically and
//!    evaluates every dependent variable once in that order. It runs once.
//!
//! 3. **Update cycles.** `add_update` stages writes to free variables, and
//!    `compute` applies them and re-evaluates only the dependent variables
//!    reachable from what changed.
//!
//! # Incremental Recompute
//!
//! For a set `S` of updated free variables, the affected variables are the
//! dependent variables reachable from any member of `S`, ordered by the global
//! topological order. That list depends only on `S`, so it is cached under
//! `S` and reused the next time the same combination of variables changes.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::accessor::Accessor;
use super::cache::{update_key, AffectedCache, CacheStats};
use super::config::PropagatorConfig;
use super::value::{FromValue, Value, ValueError};
use crate::error::PropagatorError;
use crate::graph::Graph;

/// Variables changed by one `compute` call, with their new values.
///
/// Free variables come first in staging order, then dependent variables in
/// evaluation order.
pub type ChangeSet<V> = IndexMap<V, Value>;

/// A registered compute function.
pub(crate) type ComputeFn<V> =
    Box<dyn Fn(&mut Accessor<'_, V>) -> Result<(), PropagatorError<V>>>;

/// Where a propagator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropagatorState {
    /// Nothing registered yet.
    Unregistered,
    /// At least one registration call was made.
    Registering,
    /// `initialize` succeeded. Update cycles are allowed.
    Initialized,
    /// `initialize` failed. Terminal.
    Failed,
}

/// A dependent variable's declared inputs and its compute function.
struct DependentVar<V> {
    inputs: SmallVec<[V; 4]>,
    compute: ComputeFn<V>,
}

/// Evaluator for a graph of free and dependent variables.
pub struct Propagator<V>
where
    V: Copy + Eq + Hash + Debug + 'static,
{
    config: PropagatorConfig,
    state: PropagatorState,

    /// Every registered variable is a vertex; edges are added by `initialize`.
    graph: Graph<V>,

    free: IndexSet<V>,
    dependents: IndexMap<V, DependentVar<V>>,

    /// Current value of every variable. Free variables are seeded at
    /// registration, dependent ones at initialization.
    values: IndexMap<V, Value>,

    /// Dependent variables in topological order.
    order: Vec<V>,
    /// Position of each dependent variable in `order`.
    rank: HashMap<V, usize>,

    pending: IndexMap<V, Value>,
    cache: AffectedCache<V>,

    /// Registration errors, replayed by `initialize`.
    errors: Vec<PropagatorError<V>>,
}

/// Log a rejected request and hand the error back.
fn rejected<V: Debug>(error: PropagatorError<V>) -> PropagatorError<V> {
    warn!(%error, "propagator request rejected");
    error
}

impl<V> Propagator<V>
where
    V: Copy + Eq + Hash + Debug + 'static,
{
    /// Create a propagator with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PropagatorConfig::default())
    }

    pub fn with_config(config: PropagatorConfig) -> Self {
        let cache = AffectedCache::new(config.cache_affected_sets, config.cache_capacity);
        Self {
            config,
            state: PropagatorState::Unregistered,
            graph: Graph::new(),
            free: IndexSet::new(),
            dependents: IndexMap::new(),
            values: IndexMap::new(),
            order: Vec::new(),
            rank: HashMap::new(),
            pending: IndexMap::new(),
            cache,
            errors: Vec::new(),
        }
    }

    // ── Registration ───────────────────────────────────────────

    /// Register a free variable with its initial value.
    pub fn add_free_var(
        &mut self,
        id: V,
        initial: impl Into<Value>,
    ) -> Result<(), PropagatorError<V>> {
        self.begin_registration()?;

        if self.is_registered(id) {
            return Err(self.registration_error(PropagatorError::DuplicateVariable(id)));
        }

        self.free.insert(id);
        self.values.insert(id, initial.into());
        self.graph.add_vertex(id);
        Ok(())
    }

    /// Register a dependent variable by its compute function.
    ///
    /// The function runs once right away in declare mode to discover its
    /// inputs and output. Returns the output variable.
    pub fn add_dependent_var<F>(&mut self, compute: F) -> Result<V, PropagatorError<V>>
    where
        F: Fn(&mut Accessor<'_, V>) -> Result<(), PropagatorError<V>> + 'static,
    {
        self.begin_registration()?;

        let mut accessor = Accessor::declaring();
        if let Err(error) = compute(&mut accessor) {
            return Err(self.registration_error(error));
        }
        let declaration = accessor.into_declaration();

        let output = match declaration.outputs.as_slice() {
            [] => return Err(self.registration_error(PropagatorError::NoOutput)),
            [output] => *output,
            outputs => {
                let error = PropagatorError::MultipleOutputs(outputs.to_vec());
                return Err(self.registration_error(error));
            }
        };
        if declaration.inputs.is_empty() {
            return Err(self.registration_error(PropagatorError::NoInputs(output)));
        }
        if self.is_registered(output) {
            return Err(self.registration_error(PropagatorError::DuplicateVariable(output)));
        }
        if declaration.inputs.contains(&output) {
            return Err(self.registration_error(PropagatorError::SelfDependency(output)));
        }

        self.graph.add_vertex(output);
        self.dependents.insert(
            output,
            DependentVar {
                inputs: declaration.inputs,
                compute: Box::new(compute),
            },
        );
        Ok(output)
    }

    fn begin_registration(&mut self) -> Result<(), PropagatorError<V>> {
        match self.state {
            PropagatorState::Unregistered | PropagatorState::Registering => {
                self.state = PropagatorState::Registering;
                Ok(())
            }
            PropagatorState::Initialized | PropagatorState::Failed => {
                Err(rejected(PropagatorError::AlreadyInitialized))
            }
        }
    }

    fn registration_error(&mut self, error: PropagatorError<V>) -> PropagatorError<V> {
        warn!(%error, "registration rejected");
        self.errors.push(error.clone());
        error
    }

    // ── Initialization ─────────────────────────────────────────

    /// Validate the registry, build the graph and compute initial values.
    ///
    /// Runs once. Any failure leaves the propagator in the terminal
    /// [`PropagatorState::Failed`] state.
    pub fn initialize(&mut self) -> Result<(), PropagatorError<V>> {
        if matches!(
            self.state,
            PropagatorState::Initialized | PropagatorState::Failed
        ) {
            return Err(rejected(PropagatorError::AlreadyInitialized));
        }

        let mut problems = self.errors.clone();
        for (&output, var) in &self.dependents {
            for &input in &var.inputs {
                if !self.is_registered(input) {
                    problems.push(PropagatorError::UnregisteredInput { output, input });
                }
            }
        }
        if !problems.is_empty() {
            return Err(self.fail(PropagatorError::InitializationFailed(problems)));
        }

        for (&output, var) in &self.dependents {
            for &input in &var.inputs {
                self.graph.add_edge(input, output);
            }
        }

        let Some(order) = self.graph.try_topological_order() else {
            let remainder = self.graph.cyclic_remainder();
            return Err(self.fail(PropagatorError::CyclicDependency(remainder)));
        };

        let dependents = &self.dependents;
        self.order = order
            .into_iter()
            .filter(|id| dependents.contains_key(id))
            .collect();
        self.rank = self
            .order
            .iter()
            .enumerate()
            .map(|(position, &id)| (id, position))
            .collect();

        for position in 0..self.order.len() {
            let id = self.order[position];
            if let Err(error) = self.evaluate(id) {
                return Err(self.fail(error));
            }
        }

        self.state = PropagatorState::Initialized;
        debug!(
            free = self.free.len(),
            dependent = self.dependents.len(),
            edges = self.graph.edge_count(),
            "propagator initialized"
        );
        Ok(())
    }

    fn fail(&mut self, error: PropagatorError<V>) -> PropagatorError<V> {
        self.state = PropagatorState::Failed;
        warn!(%error, "propagator initialization failed");
        error
    }

    /// Run one dependent variable's compute function and store its output.
    fn evaluate(&mut self, id: V) -> Result<Value, PropagatorError<V>> {
        let var = self
            .dependents
            .get(&id)
            .ok_or(PropagatorError::UnknownVariable(id))?;

        let mut accessor = Accessor::computing(id, &var.inputs, &self.values);
        (var.compute)(&mut accessor)?;
        let value = accessor
            .into_written()
            .ok_or(PropagatorError::OutputNotSet(id))?;

        self.values.insert(id, value.clone());
        Ok(value)
    }

    // ── Reads ──────────────────────────────────────────────────

    /// Read a variable's current value as `T`.
    pub fn value<T: FromValue>(&self, id: V) -> Result<T, PropagatorError<V>> {
        self.stored(id)
            .and_then(|value| {
                value.get::<T>().map_err(|source| PropagatorError::Value {
                    variable: id,
                    source,
                })
            })
            .map_err(rejected)
    }

    /// Read a variable's current value, falling back to `T::default()`.
    ///
    /// Meant for display code that must always show something. The failure
    /// is still logged.
    pub fn value_or_default<T: FromValue + Default>(&self, id: V) -> T {
        self.value(id).unwrap_or_default()
    }

    /// The boxed value of a variable, if the propagator is initialized and
    /// knows it.
    pub fn raw_value(&self, id: V) -> Option<&Value> {
        self.stored(id).ok()
    }

    fn stored(&self, id: V) -> Result<&Value, PropagatorError<V>> {
        self.ensure_initialized()?;
        self.values
            .get(&id)
            .ok_or(PropagatorError::UnknownVariable(id))
    }

    fn ensure_initialized(&self) -> Result<(), PropagatorError<V>> {
        if self.state == PropagatorState::Initialized {
            Ok(())
        } else {
            Err(PropagatorError::NotInitialized)
        }
    }

    // ── Update cycles ──────────────────────────────────────────

    /// Stage a new value for a free variable. Takes effect on `compute`.
    ///
    /// Staging the same variable twice keeps the later value. Unless the
    /// configuration allows kind changes, a value of a different kind than
    /// the current one is rejected.
    pub fn add_update(
        &mut self,
        id: V,
        value: impl Into<Value>,
    ) -> Result<(), PropagatorError<V>> {
        let value = value.into();
        self.check_update(id, &value).map_err(rejected)?;
        self.pending.insert(id, value);
        Ok(())
    }

    fn check_update(&self, id: V, value: &Value) -> Result<(), PropagatorError<V>> {
        self.ensure_initialized()?;

        if !self.free.contains(&id) {
            return Err(if self.dependents.contains_key(&id) {
                PropagatorError::NotFreeVariable(id)
            } else {
                PropagatorError::UnknownVariable(id)
            });
        }

        if self.config.enforce_value_kinds {
            if let Some(current) = self.values.get(&id) {
                if current.kind() != value.kind() {
                    return Err(PropagatorError::Value {
                        variable: id,
                        source: ValueError::TypeMismatch {
                            expected: current.kind(),
                            found: value.kind(),
                        },
                    });
                }
            }
        }

        Ok(())
    }

    /// Drop every staged update. Returns how many were dropped.
    pub fn discard_updates(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Apply staged updates and re-evaluate the affected dependent variables.
    ///
    /// All or nothing: if a compute function fails, every value is restored
    /// to what it was before the call and the error is returned. The staged
    /// updates are dropped in that case, not kept for a retry.
    pub fn compute(&mut self) -> Result<ChangeSet<V>, PropagatorError<V>> {
        self.ensure_initialized().map_err(rejected)?;

        let mut changes = ChangeSet::new();
        if self.pending.is_empty() {
            trace!("compute called with no staged updates");
            return Ok(changes);
        }

        let graph = &self.graph;
        let dependents = &self.dependents;
        let rank = &self.rank;
        let pending = &self.pending;

        let key = update_key(pending.keys().filter_map(|&id| graph.index_of(id)));
        let affected = self.cache.get_or_insert_with(key, || {
            let mut affected: Vec<V> = graph
                .reachable_from_all(pending.keys().copied())
                .into_iter()
                .filter(|id| dependents.contains_key(id))
                .collect();
            affected.sort_by_key(|id| rank.get(id).copied().unwrap_or(usize::MAX));
            affected
        });
        trace!(
            updated = self.pending.len(),
            affected = affected.len(),
            cache = ?self.cache.stats(),
            "affected set resolved"
        );

        // Values overwritten so far, restored if a compute function fails.
        let mut previous: Vec<(V, Value)> =
            Vec::with_capacity(self.pending.len() + affected.len());

        for (id, value) in self.pending.drain(..) {
            if let Some(old) = self.values.insert(id, value.clone()) {
                previous.push((id, old));
            }
            changes.insert(id, value);
        }

        for &id in affected.iter() {
            if let Some(old) = self.values.get(&id) {
                previous.push((id, old.clone()));
            }
            match self.evaluate(id) {
                Ok(value) => {
                    changes.insert(id, value);
                }
                Err(error) => {
                    self.roll_back(previous);
                    return Err(rejected(error));
                }
            }
        }

        debug!(changed = changes.len(), "compute finished");
        Ok(changes)
    }

    fn roll_back(&mut self, previous: Vec<(V, Value)>) {
        debug!(restored = previous.len(), "compute failed, rolling back");
        for (id, value) in previous.into_iter().rev() {
            self.values.insert(id, value);
        }
    }

    // ── Introspection ──────────────────────────────────────────

    pub fn state(&self) -> PropagatorState {
        self.state
    }

    pub fn config(&self) -> &PropagatorConfig {
        &self.config
    }

    pub fn is_free(&self, id: V) -> bool {
        self.free.contains(&id)
    }

    pub fn is_dependent(&self, id: V) -> bool {
        self.dependents.contains_key(&id)
    }

    /// Whether `id` is registered as either kind of variable.
    pub fn is_registered(&self, id: V) -> bool {
        self.is_free(id) || self.is_dependent(id)
    }

    /// Declared inputs of a dependent variable.
    pub fn inputs_of(&self, id: V) -> Option<&[V]> {
        self.dependents.get(&id).map(|var| var.inputs.as_slice())
    }

    /// Dependent variables in evaluation order. Empty until initialized.
    pub fn evaluation_order(&self) -> &[V] {
        &self.order
    }

    /// The dependency graph. Edges exist once `initialize` has run.
    pub fn graph(&self) -> &Graph<V> {
        &self.graph
    }

    /// Every registration error so far.
    pub fn registration_errors(&self) -> &[PropagatorError<V>] {
        &self.errors
    }

    /// Number of staged, not yet computed updates.
    pub fn pending_updates(&self) -> usize {
        self.pending.len()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl<V> Default for Propagator<V>
where
    V: Copy + Eq + Hash + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Debug for Propagator<V>
where
    V: Copy + Eq + Hash + Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagator")
            .field("state", &self.state)
            .field("free", &self.free.len())
            .field("dependent", &self.dependents.len())
            .field("pending", &self.pending.len())
            .field("cache", &self.cache.stats())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
