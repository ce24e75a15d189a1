//! Default-value registry.
//!
//! A mutable mapping from [`TypeDescriptor`] to an example value or zero-arg
//! value factory. The registry is a caller-owned value threaded into each
//! verifier call, not module-global state; isolated test runs use isolated
//! registries. Callers sharing one registry across logically independent
//! checks are expected to [`reset`](DefaultValueRegistry::reset) it between
//! them (or save and reapply a [`snapshot`](DefaultValueRegistry::snapshot)).
//!
//! The built-in table maps every scalar and canonical-collection type to a
//! deliberately non-zero default, so that a property silently left at its
//! zero value shows up as a mismatch rather than a coincidental pass.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;


use crate::descriptor::TypeDescriptor;
use crate::value::{CollectionKind, MapKind, Value};

/// A registered default: either a fixed value or a factory invoked fresh on
/// every resolution (timestamps resolve to "now at resolution time").
#[derive(Clone)]
pub enum DefaultEntry {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultEntry {
    pub fn produce(&self) -> Value {
        match self {
            DefaultEntry::Value(value) => value.clone(),
            DefaultEntry::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultEntry::Value(value) => write!(f, "Value({})", value),
            DefaultEntry::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Builds the built-in table; `Value` is not `Sync`, so the table is
/// constructed per call rather than cached in a shared static. Retained
/// separately so `reset` is always possible regardless of prior mutation.
fn builtin_table() -> HashMap<TypeDescriptor, DefaultEntry> {
    let mut table = HashMap::new();
    let mut put = |ty: TypeDescriptor, value: Value| {
        table.insert(ty, DefaultEntry::Value(value));
    };

    put(TypeDescriptor::boolean(), Value::Bool(true));
    put(TypeDescriptor::character(), Value::Char('Z'));
    put(TypeDescriptor::i8(), Value::I8(42));
    put(TypeDescriptor::i16(), Value::I16(42));
    put(TypeDescriptor::i32(), Value::I32(42));
    put(TypeDescriptor::i64(), Value::I64(42));
    put(TypeDescriptor::f32(), Value::F32(3.14159));
    put(TypeDescriptor::f64(), Value::F64(3.14159));
    put(TypeDescriptor::string(), Value::str("String"));
    put(TypeDescriptor::decimal(), Value::decimal("3.14159"));
    put(
        TypeDescriptor::list(),
        Value::empty_collection(CollectionKind::List),
    );
    put(
        TypeDescriptor::set(),
        Value::empty_collection(CollectionKind::Set),
    );
    put(
        TypeDescriptor::sorted_set(),
        Value::empty_collection(CollectionKind::SortedSet),
    );
    put(TypeDescriptor::map(), Value::empty_map(MapKind::Map));
    put(
        TypeDescriptor::sorted_map(),
        Value::empty_map(MapKind::SortedMap),
    );
    table.insert(
        TypeDescriptor::timestamp(),
        DefaultEntry::Factory(Arc::new(|| Value::Timestamp(SystemTime::now()))),
    );
    table
}

/// Opaque saved registry state; reapplied with
/// [`DefaultValueRegistry::restore`].
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    entries: HashMap<TypeDescriptor, DefaultEntry>,
}

/// The mutable type → default mapping consulted by the resolver.
///
/// All operations are total; `register` overwrites silently (last write
/// wins) and `deregister` of an unknown type is a no-op.
#[derive(Debug, Clone)]
pub struct DefaultValueRegistry {
    entries: HashMap<TypeDescriptor, DefaultEntry>,
}

impl DefaultValueRegistry {
    /// A registry holding exactly the built-in table.
    pub fn new() -> Self {
        DefaultValueRegistry {
            entries: builtin_table(),
        }
    }

    /// Inserts or overwrites the default for `ty`.
    pub fn register(&mut self, ty: TypeDescriptor, value: Value) {
        self.entries.insert(ty, DefaultEntry::Value(value));
    }

    /// Inserts or overwrites a factory default for `ty`; the factory is
    /// invoked once per resolution.
    pub fn register_factory<F>(&mut self, ty: TypeDescriptor, factory: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.entries
            .insert(ty, DefaultEntry::Factory(Arc::new(factory)));
    }

    /// Removes the default for `ty`; resolution for that type then falls back
    /// to the structural rules.
    pub fn deregister(&mut self, ty: &TypeDescriptor) {
        self.entries.remove(ty);
    }

    /// Restores the registry to exactly the built-in table, discarding all
    /// caller mutations.
    pub fn reset(&mut self) {
        self.entries = builtin_table();
    }

    pub fn contains(&self, ty: &TypeDescriptor) -> bool {
        self.entries.contains_key(ty)
    }

    /// Produces the registered default for `ty`, if any.
    pub fn lookup(&self, ty: &TypeDescriptor) -> Option<Value> {
        self.entries.get(ty).map(DefaultEntry::produce)
    }

    /// Saves the current state, caller mutations included.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot {
            entries: self.entries.clone(),
        }
    }

    /// Reapplies a previously saved state.
    pub fn restore(&mut self, snapshot: RegistrySnapshot) {
        self.entries = snapshot.entries;
    }
}

impl Default for DefaultValueRegistry {
    fn default() -> Self {
        DefaultValueRegistry::new()
    }
}
