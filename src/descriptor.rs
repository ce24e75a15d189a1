//! Type, property, constructor and method descriptors.
//!
//! Descriptors are the vocabulary shared between the verification engine and
//! the object-model introspector: the engine never sees a concrete host type,
//! only descriptors handed to it by an [`ObjectModelIntrospector`]
//! implementation and the values it produces for them.
//!
//! [`ObjectModelIntrospector`]: crate::introspect::ObjectModelIntrospector

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Property name that reflective platforms report as an artifact and that is
/// never treated as a real property.
pub const ALWAYS_EXCLUDED: &str = "class";

/// Structural kind of a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    Decimal,
    Timestamp,
    List,
    Set,
    SortedSet,
    Map,
    SortedMap,
    /// Array of a component type.
    Array(Box<TypeDescriptor>),
    /// Enumerated type with declaration-ordered constants.
    Enum,
    /// Composite (object) type.
    Object,
}

/// Identifies a declared type. Used as the registry key; equality and
/// hashing are by type identity (name plus kind).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    name: Arc<str>,
    kind: TypeKind,
}

impl TypeDescriptor {
    fn scalar(name: &str, kind: TypeKind) -> Self {
        TypeDescriptor {
            name: Arc::from(name),
            kind,
        }
    }

    pub fn boolean() -> Self {
        Self::scalar("bool", TypeKind::Bool)
    }

    pub fn character() -> Self {
        Self::scalar("char", TypeKind::Char)
    }

    pub fn i8() -> Self {
        Self::scalar("i8", TypeKind::I8)
    }

    pub fn i16() -> Self {
        Self::scalar("i16", TypeKind::I16)
    }

    pub fn i32() -> Self {
        Self::scalar("i32", TypeKind::I32)
    }

    pub fn i64() -> Self {
        Self::scalar("i64", TypeKind::I64)
    }

    pub fn f32() -> Self {
        Self::scalar("f32", TypeKind::F32)
    }

    pub fn f64() -> Self {
        Self::scalar("f64", TypeKind::F64)
    }

    pub fn string() -> Self {
        Self::scalar("string", TypeKind::Str)
    }

    pub fn decimal() -> Self {
        Self::scalar("decimal", TypeKind::Decimal)
    }

    pub fn timestamp() -> Self {
        Self::scalar("timestamp", TypeKind::Timestamp)
    }

    pub fn list() -> Self {
        Self::scalar("list", TypeKind::List)
    }

    pub fn set() -> Self {
        Self::scalar("set", TypeKind::Set)
    }

    pub fn sorted_set() -> Self {
        Self::scalar("sorted-set", TypeKind::SortedSet)
    }

    pub fn map() -> Self {
        Self::scalar("map", TypeKind::Map)
    }

    pub fn sorted_map() -> Self {
        Self::scalar("sorted-map", TypeKind::SortedMap)
    }

    /// Array of the given component type.
    pub fn array(component: TypeDescriptor) -> Self {
        TypeDescriptor {
            name: Arc::from(format!("[{}]", component.name)),
            kind: TypeKind::Array(Box::new(component)),
        }
    }

    /// Enumerated type. The constants themselves live in the object model and
    /// are obtained through the introspector, in declaration order.
    pub fn enumeration(name: &str) -> Self {
        TypeDescriptor {
            name: Arc::from(name),
            kind: TypeKind::Enum,
        }
    }

    /// Composite (object) type.
    pub fn object(name: &str) -> Self {
        TypeDescriptor {
            name: Arc::from(name),
            kind: TypeKind::Object,
        }
    }

    /// The universal base object type. A type whose `equals`/`hashCode` are
    /// not overridden reports this as their declaring type.
    pub fn base() -> Self {
        TypeDescriptor {
            name: Arc::from("object"),
            kind: TypeKind::Object,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Last path segment of the type name. Nested companion types are named
    /// `Outer::Inner`, and builder discovery matches on the simple name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit("::").next().unwrap_or(&self.name)
    }

    /// Whether values of this type compare by value rather than by identity.
    /// Primitive-typed properties use value equality in the accessor contract
    /// and are skipped by the null perturbation of the equality contract.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Bool
                | TypeKind::Char
                | TypeKind::I8
                | TypeKind::I16
                | TypeKind::I32
                | TypeKind::I64
                | TypeKind::F32
                | TypeKind::F64
        )
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Member visibility as reported by the introspector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// A constructor discovered on a type under test.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// Type the constructor belongs to.
    pub owner: TypeDescriptor,
    /// Declared parameter types, in order.
    pub params: Vec<TypeDescriptor>,
    pub visibility: Visibility,
}

/// A method discovered on a type under test.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Type the descriptor was obtained from.
    pub owner: TypeDescriptor,
    pub name: String,
    /// Declared parameter types, in order.
    pub params: Vec<TypeDescriptor>,
    /// `None` for methods that return nothing.
    pub return_type: Option<TypeDescriptor>,
    /// Type that declares the method. Inherited methods report the ancestor;
    /// non-overridden `equals`/`hashCode` report [`TypeDescriptor::base`].
    pub declared_by: TypeDescriptor,
    pub visibility: Visibility,
}

/// A property discovered on a type under test: name, declared type, and the
/// accessors that exist for it. Supplied by the introspector; the engine only
/// consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub declared_type: TypeDescriptor,
    /// Read accessor, if one exists.
    pub read: Option<MethodDescriptor>,
    /// Write accessor, if one exists.
    pub write: Option<MethodDescriptor>,
}

impl PropertyDescriptor {
    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }
}

/// Property and method names the caller wants skipped. The `"class"` artifact
/// of reflective introspection is always excluded, whether or not the caller
/// names it.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl ExclusionSet {
    /// No caller exclusions (the implicit `"class"` exclusion still applies).
    pub fn none() -> Self {
        ExclusionSet::default()
    }

    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExclusionSet {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        name == ALWAYS_EXCLUDED || self.names.contains(name)
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        ExclusionSet::of(iter)
    }
}
