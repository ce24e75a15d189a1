//! Dynamic example-value model.
//!
//! Every value flowing between the verification engine and an object model is
//! a [`Value`]: the representative defaults produced by the resolver, the
//! arguments fed to constructors and accessors, and the instances the object
//! model hands back. Reference-backed variants are `Arc`-allocated so the
//! engine can distinguish *the exact object passed in* from an equal copy,
//! which is what catches accessors that defensively copy.

use std::cell::RefCell;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::SystemTime;

use crate::descriptor::{TypeDescriptor, TypeKind};

/// Ordered/unordered collection flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
    SortedSet,
}

/// Map flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapKind {
    Map,
    SortedMap,
}

/// A representative value for a declared type.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(Arc<str>),
    /// Arbitrary-precision decimal literal.
    Decimal(Arc<str>),
    Timestamp(SystemTime),
    Collection {
        kind: CollectionKind,
        items: Arc<Vec<Value>>,
    },
    Map {
        kind: MapKind,
        entries: Arc<Vec<(Value, Value)>>,
    },
    Array {
        component: TypeDescriptor,
        items: Arc<Vec<Value>>,
    },
    /// An enum constant. Constants are singletons in their object model, so
    /// value equality doubles as identity.
    Enum {
        ty: TypeDescriptor,
        constant: Arc<str>,
        ordinal: usize,
    },
    /// A composite instance handle.
    Object(ObjectRef),
}

impl Value {
    pub fn str(s: &str) -> Value {
        Value::Str(Arc::from(s))
    }

    pub fn decimal(literal: &str) -> Value {
        Value::Decimal(Arc::from(literal))
    }

    pub fn empty_collection(kind: CollectionKind) -> Value {
        Value::Collection {
            kind,
            items: Arc::new(Vec::new()),
        }
    }

    pub fn empty_map(kind: MapKind) -> Value {
        Value::Map {
            kind,
            entries: Arc::new(Vec::new()),
        }
    }

    pub fn collection(kind: CollectionKind, items: Vec<Value>) -> Value {
        Value::Collection {
            kind,
            items: Arc::new(items),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The zero value of a declared type: what array elements are left at
    /// when an array default is allocated. Never recursively resolved.
    pub fn zero_of(ty: &TypeDescriptor) -> Value {
        match ty.kind() {
            TypeKind::Bool => Value::Bool(false),
            TypeKind::Char => Value::Char('\0'),
            TypeKind::I8 => Value::I8(0),
            TypeKind::I16 => Value::I16(0),
            TypeKind::I32 => Value::I32(0),
            TypeKind::I64 => Value::I64(0),
            TypeKind::F32 => Value::F32(0.0),
            TypeKind::F64 => Value::F64(0.0),
            _ => Value::Null,
        }
    }

    /// Structural equality: contents compare equal regardless of identity.
    pub fn value_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (
                Value::Collection { kind: ka, items: ia },
                Value::Collection { kind: kb, items: ib },
            ) => ka == kb && ia.len() == ib.len() && ia.iter().zip(ib.iter()).all(|(a, b)| a.value_eq(b)),
            (
                Value::Map { kind: ka, entries: ea },
                Value::Map { kind: kb, entries: eb },
            ) => {
                ka == kb
                    && ea.len() == eb.len()
                    && ea
                        .iter()
                        .zip(eb.iter())
                        .all(|((k1, v1), (k2, v2))| k1.value_eq(k2) && v1.value_eq(v2))
            }
            (
                Value::Array { component: ca, items: ia },
                Value::Array { component: cb, items: ib },
            ) => ca == cb && ia.len() == ib.len() && ia.iter().zip(ib.iter()).all(|(a, b)| a.value_eq(b)),
            (
                Value::Enum { ty: ta, ordinal: oa, .. },
                Value::Enum { ty: tb, ordinal: ob, .. },
            ) => ta == tb && oa == ob,
            (Value::Object(a), Value::Object(b)) => {
                a.ptr_eq(b) || (a.ty() == b.ty() && a.fields_value_eq(b))
            }
            _ => false,
        }
    }

    /// Identity comparison: reference-backed variants must be the same
    /// allocation, scalars fall back to value equality. This is the accessor
    /// contract's comparison for reference-typed properties.
    pub fn identity_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Arc::ptr_eq(a, b),
            (Value::Decimal(a), Value::Decimal(b)) => Arc::ptr_eq(a, b),
            (Value::Collection { items: a, .. }, Value::Collection { items: b, .. }) => {
                Arc::ptr_eq(a, b)
            }
            (Value::Map { entries: a, .. }, Value::Map { entries: b, .. }) => Arc::ptr_eq(a, b),
            (Value::Array { items: a, .. }, Value::Array { items: b, .. }) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => self.value_eq(other),
        }
    }

    /// Content-equal clone behind fresh allocations. An accessor returning
    /// this instead of the stored value passes value equality but fails the
    /// identity comparison; the dynamic model uses it to emulate
    /// defensively-copying getters.
    pub fn detached_clone(&self) -> Value {
        match self {
            Value::Str(s) => Value::Str(Arc::from(&**s)),
            Value::Decimal(s) => Value::Decimal(Arc::from(&**s)),
            Value::Collection { kind, items } => Value::Collection {
                kind: *kind,
                items: Arc::new(items.as_ref().clone()),
            },
            Value::Map { kind, entries } => Value::Map {
                kind: *kind,
                entries: Arc::new(entries.as_ref().clone()),
            },
            Value::Array { component, items } => Value::Array {
                component: component.clone(),
                items: Arc::new(items.as_ref().clone()),
            },
            other => other.clone(),
        }
    }

    /// Deterministic content hash. Two values that are `value_eq` hash the
    /// same way; the dynamic model derives field-based hash codes from it.
    pub fn hash_code(&self) -> i64 {
        let mut hasher = DefaultHasher::new();
        self.feed(&mut hasher);
        hasher.finish() as i64
    }

    fn feed(&self, hasher: &mut DefaultHasher) {
        std::mem::discriminant(self).hash(hasher);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(hasher),
            Value::Char(v) => v.hash(hasher),
            Value::I8(v) => v.hash(hasher),
            Value::I16(v) => v.hash(hasher),
            Value::I32(v) => v.hash(hasher),
            Value::I64(v) => v.hash(hasher),
            Value::F32(v) => v.to_bits().hash(hasher),
            Value::F64(v) => v.to_bits().hash(hasher),
            Value::Str(v) => v.hash(hasher),
            Value::Decimal(v) => v.hash(hasher),
            Value::Timestamp(v) => v.hash(hasher),
            Value::Collection { kind, items } => {
                (*kind as u8).hash(hasher);
                for item in items.iter() {
                    item.feed(hasher);
                }
            }
            Value::Map { kind, entries } => {
                (*kind as u8).hash(hasher);
                for (k, v) in entries.iter() {
                    k.feed(hasher);
                    v.feed(hasher);
                }
            }
            Value::Array { component, items } => {
                component.hash(hasher);
                for item in items.iter() {
                    item.feed(hasher);
                }
            }
            Value::Enum { ty, ordinal, .. } => {
                ty.hash(hasher);
                ordinal.hash(hasher);
            }
            Value::Object(obj) => {
                obj.ty().hash(hasher);
                for (name, value) in obj.fields_snapshot() {
                    name.hash(hasher);
                    value.feed(hasher);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "\"{}\"", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{:?}", v),
            Value::Collection { kind, items } => write!(f, "{:?}[{}]", kind, items.len()),
            Value::Map { kind, entries } => write!(f, "{:?}[{}]", kind, entries.len()),
            Value::Array { component, items } => write!(f, "[{}; {}]", component, items.len()),
            Value::Enum { ty, constant, .. } => write!(f, "{}::{}", ty, constant),
            Value::Object(obj) => write!(f, "{}{{..}}", obj.ty()),
        }
    }
}

/// A composite instance: a typed, interior-mutable field map.
#[derive(Debug)]
pub struct Instance {
    ty: TypeDescriptor,
    fields: RefCell<BTreeMap<String, Value>>,
}

/// Shared handle to an [`Instance`]. Identity is allocation identity.
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<Instance>);

impl ObjectRef {
    pub fn new(ty: TypeDescriptor) -> Self {
        ObjectRef(Arc::new(Instance {
            ty,
            fields: RefCell::new(BTreeMap::new()),
        }))
    }

    /// An inert instance of an otherwise-unused type. The equality verifier
    /// instantiates one to prove `equals` rejects unrelated types.
    pub fn detached(ty: TypeDescriptor) -> Self {
        ObjectRef::new(ty)
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.0.ty
    }

    /// Field value, `Null` when the field was never set.
    pub fn get(&self, field: &str) -> Value {
        self.0
            .fields
            .borrow()
            .get(field)
            .cloned()
            .unwrap_or(Value::Null)
    }

    pub fn set(&self, field: &str, value: Value) {
        self.0.fields.borrow_mut().insert(field.to_string(), value);
    }

    /// Name-ordered snapshot of the populated fields.
    pub fn fields_snapshot(&self) -> BTreeMap<String, Value> {
        self.0.fields.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable per-allocation token, for identity-based hash codes.
    pub fn address(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    fn fields_value_eq(&self, other: &ObjectRef) -> bool {
        let a = self.fields_snapshot();
        let b = other.fields_snapshot();
        a.len() == b.len()
            && a.iter()
                .zip(b.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va.value_eq(vb))
    }
}
