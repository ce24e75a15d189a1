//! Accessor (read/write property) contract.
//!
//! A conforming accessor pair hands back exactly what it was given: the write
//! accessor stores its argument, the read accessor returns the stored value.
//! Reference-typed properties are compared by identity, which catches
//! accessors that defensively copy; primitive-typed properties are compared
//! by value.

use log::{debug, trace};

use crate::descriptor::{ExclusionSet, PropertyDescriptor, TypeDescriptor};
use crate::equality::EqualityVerifier;
use crate::introspect::ObjectModelIntrospector;
use crate::registry::DefaultValueRegistry;
use crate::resolver::{DefaultValueResolver, DEFAULT_ARRAY_LENGTH};
use crate::value::Value;
use crate::violation::{ContractViolation, VerifyResult};

/// Verifies the accessor round-trip contract of mutable data-holding types.
pub struct AccessorVerifier<'a> {
    model: &'a dyn ObjectModelIntrospector,
    registry: &'a DefaultValueRegistry,
    array_length: usize,
}

impl<'a> AccessorVerifier<'a> {
    pub fn new(model: &'a dyn ObjectModelIntrospector, registry: &'a DefaultValueRegistry) -> Self {
        AccessorVerifier {
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

    /// Round-trips every non-excluded property that has both accessors, each
    /// on a fresh instance. Properties with only one accessor are skipped; a
    /// type with no writable properties passes vacuously.
    pub fn verify(&self, ty: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        debug!("verifying accessor contract of `{}`", ty);
        for prop in self.model.properties(ty)? {
            if exclusions.contains(&prop.name) || !prop.is_readable() || !prop.is_writable() {
                continue;
            }
            let value = self.resolver().resolve(&prop.declared_type)?;
            self.round_trip(ty, &prop, value)?;
        }
        Ok(())
    }

    /// Round-trips a single named property with its resolved default.
    pub fn verify_property(&self, ty: &TypeDescriptor, name: &str) -> VerifyResult {
        let prop = self.named_property(ty, name)?;
        let value = self.resolver().resolve(&prop.declared_type)?;
        self.round_trip(ty, &prop, value)
    }

    /// Round-trips a single named property with a caller-supplied value
    /// instead of the resolved default.
    pub fn verify_property_with(
        &self,
        ty: &TypeDescriptor,
        name: &str,
        value: Value,
    ) -> VerifyResult {
        let prop = self.named_property(ty, name)?;
        self.round_trip(ty, &prop, value)
    }

    /// Round-trips each named property, with the supplied value where one is
    /// given and the resolved default otherwise.
    pub fn verify_properties(
        &self,
        ty: &TypeDescriptor,
        properties: &[(&str, Option<Value>)],
    ) -> VerifyResult {
        for (name, value) in properties {
            match value {
                Some(value) => self.verify_property_with(ty, name, value.clone())?,
                None => self.verify_property(ty, name)?,
            }
        }
        Ok(())
    }

    /// The accessor contract plus, when the type overrides `equals`, the
    /// equality contract with its property perturbations.
    pub fn verify_bean(&self, ty: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        self.verify(ty, exclusions)?;
        let equals = self.model.lookup_method(ty, "equals")?;
        if equals.declared_by != TypeDescriptor::base() {
            EqualityVerifier::new(self.model, self.registry)
                .with_array_length(self.array_length)
                .verify_default(ty, exclusions)?;
        }
        Ok(())
    }

    fn named_property(
        &self,
        ty: &TypeDescriptor,
        name: &str,
    ) -> VerifyResult<PropertyDescriptor> {
        let prop = self
            .model
            .properties(ty)?
            .into_iter()
            .find(|prop| prop.name == name)
            .ok_or_else(|| {
                ContractViolation::introspection(ty, format!("no property named `{}`", name))
            })?;
        if !prop.is_readable() || !prop.is_writable() {
            return Err(ContractViolation::introspection(
                ty,
                format!("property `{}` does not have both accessors", name),
            ));
        }
        Ok(prop)
    }

    /// Writes `value` through the property's write accessor on a fresh
    /// instance and requires the read accessor to hand the value back:
    /// identical for reference types, equal for primitives.
    fn round_trip(
        &self,
        ty: &TypeDescriptor,
        prop: &PropertyDescriptor,
        value: Value,
    ) -> VerifyResult {
        trace!("round-tripping property `{}` of `{}`", prop.name, ty);
        let instance = self.resolver().instantiate_default(ty)?;
        let write = prop.write.as_ref().ok_or_else(|| {
            ContractViolation::introspection(
                ty,
                format!("property `{}` has no write accessor", prop.name),
            )
        })?;
        let read = prop.read.as_ref().ok_or_else(|| {
            ContractViolation::introspection(
                ty,
                format!("property `{}` has no read accessor", prop.name),
            )
        })?;

        self.model.invoke(write, &instance, &[value.clone()])?;
        let back = self.model.invoke(read, &instance, &[])?;

        let held = if prop.declared_type.is_primitive() {
            back.value_eq(&value)
        } else {
            back.identity_eq(&value)
        };
        if !held {
            return Err(ContractViolation::AccessorMismatch {
                type_name: ty.to_string(),
                property: prop.name.clone(),
                written: value.to_string(),
                read: back.to_string(),
            });
        }
        Ok(())
    }
}
