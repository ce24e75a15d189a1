//! # beancheck
//!
//! An object-contract verification engine for data-holding types.
//!
//! Given a type described through an [`ObjectModelIntrospector`], the engine
//! synthesizes one representative value per declared property type, drives
//! the type through its construction protocol (mutable accessors, immutable
//! constructor, or staged builder), and asserts structural contracts:
//! accessor round-tripping, immutability, and the equals/hash-code duality.
//!
//! Value synthesis is deterministic: a [`DefaultValueRegistry`] maps each
//! type to exactly one example value (or factory), and the
//! [`DefaultValueResolver`] falls back to structural rules for arrays, enums,
//! and zero-argument-constructible types. There is no fuzzing and no random
//! object-graph mutation.
//!
//! The introspection boundary is an explicit trait, so the engine runs on any
//! platform that can describe its types; the bundled [`DynamicModel`] is a
//! declarative implementation used by the crate's own tests and by platforms
//! without runtime reflection.

pub mod accessor;
pub mod construction;
pub mod descriptor;
pub mod equality;
pub mod introspect;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod value;
pub mod violation;

pub use accessor::AccessorVerifier;
pub use construction::{BuilderConventions, BuilderVerifier, ConstructionVerifier};
pub use descriptor::{
    ConstructorDescriptor, ExclusionSet, MethodDescriptor, PropertyDescriptor, TypeDescriptor,
    TypeKind, Visibility, ALWAYS_EXCLUDED,
};
pub use equality::EqualityVerifier;
pub use introspect::ObjectModelIntrospector;
pub use model::{
    DynamicModel, MethodBehavior, OverridePoint, PropertyDef, ReadBehavior, TypeDef, WriteBehavior,
};
pub use registry::{DefaultEntry, DefaultValueRegistry, RegistrySnapshot};
pub use resolver::{DefaultValueResolver, DEFAULT_ARRAY_LENGTH};
pub use value::{CollectionKind, MapKind, ObjectRef, Value};
pub use violation::{ContractViolation, VerifyResult};
