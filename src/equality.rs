//! The equals/hash-code contract.
//!
//! Two instances produced the same way must be equal and hash alike, stay
//! reflexive and symmetric, and reject null and unrelated types. Mutable
//! beans additionally get a per-property perturbation: writing a value to one
//! instance must break equality, writing it to the other must restore it, and
//! for reference-typed properties the same dance is repeated with null.
//!
//! The declaring-type preconditions run before any instance is constructed,
//! so an asymmetric override is reported even for types that cannot be
//! instantiated.

use log::{debug, trace};

use crate::construction::{BuilderConventions, BuilderVerifier};
use crate::descriptor::{ExclusionSet, MethodDescriptor, TypeDescriptor};
use crate::introspect::ObjectModelIntrospector;
use crate::registry::DefaultValueRegistry;
use crate::resolver::{DefaultValueResolver, ResolutionMemo, DEFAULT_ARRAY_LENGTH};
use crate::value::{ObjectRef, Value};
use crate::violation::{ContractViolation, VerifyResult};

const EQUALS: &str = "equals";
const HASH_CODE: &str = "hashCode";

/// An inert instance of an otherwise-unused type, used to prove `equals`
/// rejects unrelated types.
fn sentinel() -> Value {
    Value::Object(ObjectRef::detached(TypeDescriptor::object("Sentinel")))
}

/// Verifies the equals/hash-code contract over any of the three construction
/// protocols.
pub struct EqualityVerifier<'a> {
    model: &'a dyn ObjectModelIntrospector,
    registry: &'a DefaultValueRegistry,
    array_length: usize,
}

impl<'a> EqualityVerifier<'a> {
    pub fn new(model: &'a dyn ObjectModelIntrospector, registry: &'a DefaultValueRegistry) -> Self {
        EqualityVerifier {
            model,
            registry,
            array_length: DEFAULT_ARRAY_LENGTH,
        }
    }

    pub fn with_array_length(mut self, length: usize) -> Self {
        self.array_length = length;
        self
    }

    fn resolver(&self) -> DefaultValueResolver<'a> {
        DefaultValueResolver::new(self.model, self.registry).with_array_length(self.array_length)
    }

    /// Contract over two zero-arg-constructed instances, followed by the
    /// per-property perturbation dance for writable properties.
    pub fn verify_default(&self, ty: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        debug!("verifying equality contract of `{}` (default construction)", ty);
        let (equals, hash) = self.preconditions(ty)?;
        let resolver = self.resolver();
        let one = resolver.instantiate_default(ty)?;
        let two = resolver.instantiate_default(ty)?;
        self.battery(ty, &equals, &hash, &one, &two)?;

        let mut memo = ResolutionMemo::new(resolver);
        for prop in self.model.properties(ty)? {
            if exclusions.contains(&prop.name) {
                continue;
            }
            let Some(write) = &prop.write else {
                continue;
            };
            trace!("perturbing property `{}` of `{}`", prop.name, ty);
            let value = memo.resolve(&prop.declared_type)?;
            self.perturb(ty, &equals, &hash, &one, &two, write, &prop.name, value)?;
            if !prop.declared_type.is_primitive() {
                self.perturb(
                    ty,
                    &equals,
                    &hash,
                    &one,
                    &two,
                    write,
                    &prop.name,
                    Value::Null,
                )?;
            }
        }
        Ok(())
    }

    /// Contract over each declared constructor: both instances are built from
    /// the same memoized arguments, then run through the battery.
    pub fn verify_constructed(&self, ty: &TypeDescriptor) -> VerifyResult {
        debug!("verifying equality contract of `{}` (per constructor)", ty);
        let (equals, hash) = self.preconditions(ty)?;
        let constructors = self.model.constructors(ty)?;
        if constructors.is_empty() {
            return Err(ContractViolation::construction(
                ty,
                "declares no constructors",
            ));
        }
        let mut memo = ResolutionMemo::new(self.resolver());
        for ctor in &constructors {
            let args = ctor
                .params
                .iter()
                .map(|param| memo.resolve(param))
                .collect::<VerifyResult<Vec<_>>>()?;
            let one = self.model.construct(ctor, &args, true)?;
            let two = self.model.construct(ctor, &args, true)?;
            self.battery(ty, &equals, &hash, &one, &two)?;
        }
        Ok(())
    }

    /// Contract over two products built through the conventional builder.
    pub fn verify_built(&self, product: &TypeDescriptor) -> VerifyResult {
        self.verify_built_with(product, &BuilderConventions::default(), &ExclusionSet::none())
    }

    /// Contract over two products built through a builder under explicit
    /// conventions. Both builds share one resolution memo, so the products
    /// carry identical values.
    pub fn verify_built_with(
        &self,
        product: &TypeDescriptor,
        conventions: &BuilderConventions,
        builder_exclusions: &ExclusionSet,
    ) -> VerifyResult {
        debug!("verifying equality contract of `{}` (built)", product);
        let (equals, hash) = self.preconditions(product)?;
        let builder_verifier = BuilderVerifier::new(self.model, self.registry)
            .with_conventions(conventions.clone())
            .with_array_length(self.array_length);
        let builder = builder_verifier.find_builder(product)?;
        let mut memo = ResolutionMemo::new(self.resolver());
        let one = builder_verifier.build_product(
            &builder,
            &conventions.build_method,
            builder_exclusions,
            &mut memo,
        )?;
        let two = builder_verifier.build_product(
            &builder,
            &conventions.build_method,
            builder_exclusions,
            &mut memo,
        )?;
        self.battery(product, &equals, &hash, &one, &two)
    }

    /// Declaring-type checks, run before anything is constructed.
    fn preconditions(
        &self,
        ty: &TypeDescriptor,
    ) -> VerifyResult<(MethodDescriptor, MethodDescriptor)> {
        let equals = self.model.lookup_method(ty, EQUALS)?;
        let hash = self.model.lookup_method(ty, HASH_CODE)?;
        if equals.declared_by != hash.declared_by {
            return Err(ContractViolation::EqualsHashCodeMismatch {
                type_name: ty.to_string(),
                reason: format!(
                    "`{}` is declared by `{}` but `{}` by `{}`",
                    EQUALS, equals.declared_by, HASH_CODE, hash.declared_by
                ),
            });
        }
        if equals.declared_by == TypeDescriptor::base() {
            return Err(ContractViolation::construction(
                ty,
                "does not override `equals`; the equality contract cannot be verified",
            ));
        }
        Ok((equals, hash))
    }

    /// Reflexivity, symmetry, sentinel and null rejection, and hash-code
    /// agreement for two instances produced the same way.
    fn battery(
        &self,
        ty: &TypeDescriptor,
        equals: &MethodDescriptor,
        hash: &MethodDescriptor,
        one: &Value,
        two: &Value,
    ) -> VerifyResult {
        if !self.is_equal(ty, equals, one, one)? {
            return Err(ContractViolation::equality(ty, "`equals` is not reflexive"));
        }
        if !self.is_equal(ty, equals, one, two)? || !self.is_equal(ty, equals, two, one)? {
            return Err(ContractViolation::equality(
                ty,
                "instances produced the same way are not equal",
            ));
        }
        if self.is_equal(ty, equals, one, &sentinel())? {
            return Err(ContractViolation::equality(
                ty,
                "`equals` accepts an instance of an unrelated type",
            ));
        }
        if self.is_equal(ty, equals, one, &Value::Null)? {
            return Err(ContractViolation::equality(ty, "`equals` accepts null"));
        }
        let h1 = self.model.invoke(hash, one, &[])?;
        let h2 = self.model.invoke(hash, two, &[])?;
        if !h1.value_eq(&h2) {
            return Err(ContractViolation::equality(
                ty,
                "equal instances produce different hash codes",
            ));
        }
        Ok(())
    }

    /// Writes `value` to `one` (must break equality), then to `two` (must
    /// restore it, hash codes included).
    #[allow(clippy::too_many_arguments)]
    fn perturb(
        &self,
        ty: &TypeDescriptor,
        equals: &MethodDescriptor,
        hash: &MethodDescriptor,
        one: &Value,
        two: &Value,
        write: &MethodDescriptor,
        property: &str,
        value: Value,
    ) -> VerifyResult {
        self.model.invoke(write, one, &[value.clone()])?;
        if self.is_equal(ty, equals, one, two)? {
            return Err(ContractViolation::equality(
                ty,
                format!(
                    "setting `{}` to {} on one instance did not break equality",
                    property, value
                ),
            ));
        }
        self.model.invoke(write, two, &[value.clone()])?;
        if !self.is_equal(ty, equals, one, two)? || !self.is_equal(ty, equals, two, one)? {
            return Err(ContractViolation::equality(
                ty,
                format!("instances with `{}` set to {} are not equal", property, value),
            ));
        }
        let h1 = self.model.invoke(hash, one, &[])?;
        let h2 = self.model.invoke(hash, two, &[])?;
        if !h1.value_eq(&h2) {
            return Err(ContractViolation::equality(
                ty,
                format!("hash codes differ after setting `{}` on both instances", property),
            ));
        }
        Ok(())
    }

    fn is_equal(
        &self,
        ty: &TypeDescriptor,
        equals: &MethodDescriptor,
        lhs: &Value,
        rhs: &Value,
    ) -> VerifyResult<bool> {
        match self.model.invoke(equals, lhs, &[rhs.clone()])? {
            Value::Bool(result) => Ok(result),
            other => Err(ContractViolation::invocation(
                ty,
                EQUALS,
                format!("expected a boolean result, got {}", other),
            )),
        }
    }
}
