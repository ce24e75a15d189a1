//! The object-model introspection boundary.
//!
//! The engine never reflects over host types itself; it drives a
//! [`ObjectModelIntrospector`] implemented once per target platform. On a
//! reflective platform the implementation wraps the runtime's introspection
//! facility; on a platform without reflection it can be backed by code
//! generation or explicit factories, like the declarative
//! [`DynamicModel`](crate::model::DynamicModel) shipped with this crate.

use crate::descriptor::{
    ConstructorDescriptor, MethodDescriptor, PropertyDescriptor, TypeDescriptor,
};
use crate::value::Value;
use crate::violation::VerifyResult;

/// Runtime discovery of a type's properties, constructors and methods, plus
/// the ability to construct instances and invoke members on them.
///
/// Failure mapping: enumeration problems are
/// [`Introspection`](crate::ContractViolation::Introspection) violations,
/// failed instantiation is [`Construction`](crate::ContractViolation::Construction),
/// and a member that throws when invoked is
/// [`Invocation`](crate::ContractViolation::Invocation).
pub trait ObjectModelIntrospector {
    /// The properties of `ty`, with whatever read/write accessors exist.
    fn properties(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<PropertyDescriptor>>;

    /// All declared constructors of `ty`.
    fn constructors(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<ConstructorDescriptor>>;

    /// The methods declared by `ty` itself, accessors excluded. Inherited
    /// members do not appear here; this is what the builder-shape sweep
    /// enumerates.
    fn declared_methods(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<MethodDescriptor>>;

    /// Resolves a method by name through the type's whole surface, inherited
    /// members included. `equals` and `hashCode` are always resolvable, with
    /// `declared_by` reporting [`TypeDescriptor::base`] when not overridden.
    fn lookup_method(&self, ty: &TypeDescriptor, name: &str) -> VerifyResult<MethodDescriptor>;

    /// The types nested inside `ty`, where builder companions are discovered.
    fn nested_types(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<TypeDescriptor>>;

    /// The constants of an enum type, in declaration order.
    fn enum_constants(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<Value>>;

    /// Instantiates through `ctor`. With `bypass_visibility` set the call
    /// must succeed even when the constructor's visibility would normally
    /// forbid it; private constructors are a supported, expected case.
    fn construct(
        &self,
        ctor: &ConstructorDescriptor,
        args: &[Value],
        bypass_visibility: bool,
    ) -> VerifyResult<Value>;

    /// Invokes a method or accessor on `receiver`.
    fn invoke(
        &self,
        method: &MethodDescriptor,
        receiver: &Value,
        args: &[Value],
    ) -> VerifyResult<Value>;
}
