//! Default-value resolution.
//!
//! Maps a declared type to one representative value. The resolution order is
//! load-bearing: arrays and enums are special-cased before the registry
//! lookup because they cannot be usefully pre-registered (arrays vary by
//! component type, enum constants vary by enum), and the zero-argument
//! constructor fallback runs last.

use std::collections::HashMap;

use log::trace;

use crate::descriptor::{TypeDescriptor, TypeKind};
use crate::introspect::ObjectModelIntrospector;
use crate::registry::DefaultValueRegistry;
use crate::value::Value;
use crate::violation::{ContractViolation, VerifyResult};

/// Length of array defaults unless configured otherwise.
pub const DEFAULT_ARRAY_LENGTH: usize = 42;

/// Resolves a declared type to one representative value, consulting the
/// registry and falling back to structural rules.
pub struct DefaultValueResolver<'a> {
    model: &'a dyn ObjectModelIntrospector,
    registry: &'a DefaultValueRegistry,
    array_length: usize,
}

impl<'a> DefaultValueResolver<'a> {
    pub fn new(model: &'a dyn ObjectModelIntrospector, registry: &'a DefaultValueRegistry) -> Self {
        DefaultValueResolver {
            model,
            registry,
            array_length: DEFAULT_ARRAY_LENGTH,
        }
    }

    pub fn with_array_length(mut self, length: usize) -> Self {
        self.array_length = length;
        self
    }

    /// Resolves `ty` to a representative value. First match wins:
    ///
    /// 1. array type → fresh array of the configured length, elements left at
    ///    the zero value of the component type;
    /// 2. enum type → the first declared constant;
    /// 3. registered type → the registered value, or a fresh factory result;
    /// 4. otherwise → an instance from the type's own zero-argument
    ///    constructor, visibility bypassed.
    pub fn resolve(&self, ty: &TypeDescriptor) -> VerifyResult<Value> {
        trace!("resolving default for `{}`", ty);
        match ty.kind() {
            TypeKind::Array(component) => Ok(Value::Array {
                component: (**component).clone(),
                items: std::sync::Arc::new(vec![
                    Value::zero_of(component);
                    self.array_length
                ]),
            }),
            TypeKind::Enum => self.first_enum_constant(ty),
            _ => match self.registry.lookup(ty) {
                Some(value) => Ok(value),
                None => self.instantiate_default(ty),
            },
        }
    }

    /// Instantiates `ty` through its zero-argument constructor, bypassing
    /// visibility. Failure to construct is surfaced immediately; there is no
    /// further fallback.
    pub fn instantiate_default(&self, ty: &TypeDescriptor) -> VerifyResult<Value> {
        let constructors = self.model.constructors(ty)?;
        let ctor = constructors
            .iter()
            .find(|ctor| ctor.params.is_empty())
            .ok_or_else(|| {
                ContractViolation::construction(ty, "no zero-argument constructor")
            })?;
        self.model.construct(ctor, &[], true)
    }

    fn first_enum_constant(&self, ty: &TypeDescriptor) -> VerifyResult<Value> {
        let constants = self.model.enum_constants(ty)?;
        constants.into_iter().next().ok_or_else(|| {
            ContractViolation::construction(ty, "enum declares no constants")
        })
    }
}

/// Per-run resolution memo used by the construction-protocol verifiers: the
/// value fed to a constructor or chain method and the value compared against
/// the built instance must come from the same resolution, or factory defaults
/// (timestamps resolve to "now") could never round-trip. The memo dies with
/// the verification run.
pub(crate) struct ResolutionMemo<'a> {
    resolver: DefaultValueResolver<'a>,
    resolved: HashMap<TypeDescriptor, Value>,
}

impl<'a> ResolutionMemo<'a> {
    pub(crate) fn new(resolver: DefaultValueResolver<'a>) -> Self {
        ResolutionMemo {
            resolver,
            resolved: HashMap::new(),
        }
    }

    pub(crate) fn resolve(&mut self, ty: &TypeDescriptor) -> VerifyResult<Value> {
        if let Some(value) = self.resolved.get(ty) {
            return Ok(value.clone());
        }
        let value = self.resolver.resolve(ty)?;
        self.resolved.insert(ty.clone(), value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DynamicModel, TypeDef};

    fn empty_model() -> DynamicModel {
        DynamicModel::new()
    }

    #[test]
    fn arrays_resolve_to_the_configured_length() {
        let model = empty_model();
        let registry = DefaultValueRegistry::new();
        let resolver = DefaultValueResolver::new(&model, &registry);

        for component in [
            TypeDescriptor::i32(),
            TypeDescriptor::string(),
            TypeDescriptor::boolean(),
        ] {
            let value = resolver
                .resolve(&TypeDescriptor::array(component.clone()))
                .unwrap();
            match value {
                Value::Array { items, .. } => assert_eq!(items.len(), DEFAULT_ARRAY_LENGTH),
                other => panic!("expected an array, got {}", other),
            }
        }

        let resolver = DefaultValueResolver::new(&model, &registry).with_array_length(3);
        match resolver
            .resolve(&TypeDescriptor::array(TypeDescriptor::i64()))
            .unwrap()
        {
            Value::Array { items, .. } => {
                assert_eq!(items.len(), 3);
                assert!(items.iter().all(|item| item.value_eq(&Value::I64(0))));
            }
            other => panic!("expected an array, got {}", other),
        }
    }

    #[test]
    fn enums_resolve_to_the_first_declared_constant() {
        let mut model = empty_model();
        let color = model.define(TypeDef::enumeration("Color", ["RED", "GREEN", "BLUE"]));
        let registry = DefaultValueRegistry::new();
        let resolver = DefaultValueResolver::new(&model, &registry);

        match resolver.resolve(&color).unwrap() {
            Value::Enum { constant, ordinal, .. } => {
                assert_eq!(&*constant, "RED");
                assert_eq!(ordinal, 0);
            }
            other => panic!("expected an enum constant, got {}", other),
        }
    }

    #[test]
    fn registered_types_win_over_the_fallback() {
        let mut model = empty_model();
        let ty = model.define(TypeDef::object("Widget"));
        let mut registry = DefaultValueRegistry::new();
        registry.register(ty.clone(), Value::str("registered"));

        let resolver = DefaultValueResolver::new(&model, &registry);
        assert!(resolver
            .resolve(&ty)
            .unwrap()
            .value_eq(&Value::str("registered")));
    }

    #[test]
    fn fallback_without_default_constructor_fails() {
        let mut model = empty_model();
        let ty = model.define(
            TypeDef::object("NoDefault")
                .read_only("value", TypeDescriptor::string())
                .ctor_assigning(crate::descriptor::Visibility::Public, ["value"]),
        );
        let registry = DefaultValueRegistry::new();
        let resolver = DefaultValueResolver::new(&model, &registry);

        assert!(matches!(
            resolver.resolve(&ty),
            Err(ContractViolation::Construction { .. })
        ));
    }

    #[test]
    fn memo_returns_the_same_resolution() {
        let model = empty_model();
        let registry = DefaultValueRegistry::new();
        let mut memo = ResolutionMemo::new(DefaultValueResolver::new(&model, &registry));

        let first = memo.resolve(&TypeDescriptor::timestamp()).unwrap();
        let second = memo.resolve(&TypeDescriptor::timestamp()).unwrap();
        assert!(first.value_eq(&second));

        let a = memo.resolve(&TypeDescriptor::string()).unwrap();
        let b = memo.resolve(&TypeDescriptor::string()).unwrap();
        assert!(a.identity_eq(&b));
    }
}
