//! Constructor-immutable and builder-immutable contracts.
//!
//! Both protocols end the same way: an instance exists, and every
//! non-excluded property must lack a write accessor and must read back the
//! resolved default of its declared type. They differ in how the instance is
//! obtained: directly through each declared constructor, or through a nested
//! builder companion driven chain method by chain method.
//!
//! Defaults are resolved once per verification run and memoized per type, so
//! the value fed into the protocol and the value compared afterwards are the
//! same resolution.

use log::{debug, trace};

use crate::descriptor::{ExclusionSet, TypeDescriptor};
use crate::equality::EqualityVerifier;
use crate::introspect::ObjectModelIntrospector;
use crate::registry::DefaultValueRegistry;
use crate::resolver::{DefaultValueResolver, ResolutionMemo, DEFAULT_ARRAY_LENGTH};
use crate::value::Value;
use crate::violation::{ContractViolation, VerifyResult};

/// Post-construction checks shared by both protocols: every non-excluded
/// property of `ty` must be read-only and must hold the memoized default of
/// its declared type. Write-only properties cannot be compared and only the
/// mutability check applies to them.
pub(crate) fn check_product(
    model: &dyn ObjectModelIntrospector,
    memo: &mut ResolutionMemo<'_>,
    ty: &TypeDescriptor,
    instance: &Value,
    exclusions: &ExclusionSet,
) -> VerifyResult {
    for prop in model.properties(ty)? {
        if exclusions.contains(&prop.name) {
            continue;
        }
        if prop.is_writable() {
            return Err(ContractViolation::Mutability {
                type_name: ty.to_string(),
                property: prop.name,
            });
        }
        let Some(read) = &prop.read else {
            continue;
        };
        trace!("checking property `{}` of `{}`", prop.name, ty);
        let expected = memo.resolve(&prop.declared_type)?;
        let actual = model.invoke(read, instance, &[])?;
        if !actual.value_eq(&expected) {
            return Err(ContractViolation::PropertyValueMismatch {
                type_name: ty.to_string(),
                property: prop.name,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    Ok(())
}

/// Verifies the constructor-immutable contract: every declared constructor is
/// exercised with resolved defaults, and each resulting instance must be
/// immutable and hold those defaults.
pub struct ConstructionVerifier<'a> {
    model: &'a dyn ObjectModelIntrospector,
    registry: &'a DefaultValueRegistry,
    array_length: usize,
}

impl<'a> ConstructionVerifier<'a> {
    pub fn new(model: &'a dyn ObjectModelIntrospector, registry: &'a DefaultValueRegistry) -> Self {
        ConstructionVerifier {
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

    /// Exercises all declared constructors, private ones included, and applies
    /// the post-construction checks to each instance.
    pub fn verify_immutable(&self, ty: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        debug!("verifying constructor-immutable contract of `{}`", ty);
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
            let instance = self.model.construct(ctor, &args, true)?;
            check_product(self.model, &mut memo, ty, &instance, exclusions)?;
        }
        Ok(())
    }

    /// The constructor-immutable contract plus, when the type overrides
    /// `equals`, the equality contract over every constructor.
    pub fn verify_bean(&self, ty: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        self.verify_immutable(ty, exclusions)?;
        let equals = self.model.lookup_method(ty, "equals")?;
        if equals.declared_by != TypeDescriptor::base() {
            EqualityVerifier::new(self.model, self.registry)
                .with_array_length(self.array_length)
                .verify_constructed(ty)?;
        }
        Ok(())
    }
}

/// Naming conventions for builder discovery. The defaults match the common
/// convention: a nested companion named `Builder`, a terminal method named
/// `build`, and `$` marking generated methods the shape sweep should ignore.
#[derive(Debug, Clone)]
pub struct BuilderConventions {
    /// Simple name of the nested companion type.
    pub builder_name: String,
    /// Name of the terminal method producing the product.
    pub build_method: String,
    /// Methods whose name contains this marker are ignored by the shape
    /// sweep instead of being rejected.
    pub ignore_marker: String,
}

impl Default for BuilderConventions {
    fn default() -> Self {
        BuilderConventions {
            builder_name: "Builder".to_string(),
            build_method: "build".to_string(),
            ignore_marker: "$".to_string(),
        }
    }
}

/// Verifies the builder-immutable contract: discover the nested builder,
/// drive its chain methods with resolved defaults, build, and apply the
/// post-construction checks to the product.
pub struct BuilderVerifier<'a> {
    model: &'a dyn ObjectModelIntrospector,
    registry: &'a DefaultValueRegistry,
    conventions: BuilderConventions,
    array_length: usize,
}

impl<'a> BuilderVerifier<'a> {
    pub fn new(model: &'a dyn ObjectModelIntrospector, registry: &'a DefaultValueRegistry) -> Self {
        BuilderVerifier {
            model,
            registry,
            conventions: BuilderConventions::default(),
            array_length: DEFAULT_ARRAY_LENGTH,
        }
    }

    pub fn with_conventions(mut self, conventions: BuilderConventions) -> Self {
        self.conventions = conventions;
        self
    }

    pub fn with_array_length(mut self, length: usize) -> Self {
        self.array_length = length;
        self
    }

    fn resolver(&self) -> DefaultValueResolver<'a> {
        DefaultValueResolver::new(self.model, self.registry).with_array_length(self.array_length)
    }

    /// Discovers the builder by convention and applies the same exclusions to
    /// the builder sweep and the product checks.
    pub fn verify(&self, product: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        let builder = self.find_builder(product)?;
        self.verify_with(
            product,
            &builder,
            &self.conventions.build_method,
            exclusions,
            exclusions,
        )
    }

    /// Fully explicit form: the builder type, the build method name, and the
    /// exclusion sets for the builder sweep and the product checks are all
    /// caller-supplied.
    pub fn verify_with(
        &self,
        product: &TypeDescriptor,
        builder: &TypeDescriptor,
        build_method: &str,
        builder_exclusions: &ExclusionSet,
        product_exclusions: &ExclusionSet,
    ) -> VerifyResult {
        debug!(
            "verifying builder-immutable contract of `{}` via `{}`",
            product, builder
        );
        let mut memo = ResolutionMemo::new(self.resolver());
        let instance =
            self.build_product(builder, build_method, builder_exclusions, &mut memo)?;
        check_product(self.model, &mut memo, product, &instance, product_exclusions)
    }

    /// The builder contract plus, when the product overrides `equals`, the
    /// equality contract over two independently built instances.
    pub fn verify_bean(&self, product: &TypeDescriptor, exclusions: &ExclusionSet) -> VerifyResult {
        self.verify(product, exclusions)?;
        let equals = self.model.lookup_method(product, "equals")?;
        if equals.declared_by != TypeDescriptor::base() {
            EqualityVerifier::new(self.model, self.registry)
                .with_array_length(self.array_length)
                .verify_built_with(product, &self.conventions, exclusions)?;
        }
        Ok(())
    }

    /// Locates the builder companion among the product's nested types by
    /// simple-name match.
    pub(crate) fn find_builder(&self, product: &TypeDescriptor) -> VerifyResult<TypeDescriptor> {
        self.model
            .nested_types(product)?
            .into_iter()
            .find(|nested| nested.simple_name() == self.conventions.builder_name)
            .ok_or_else(|| ContractViolation::BuilderNotFound {
                type_name: product.to_string(),
                builder_name: self.conventions.builder_name.clone(),
            })
    }

    /// Runs the full builder protocol and returns the built product:
    /// constructs the builder through its single constructor, sweeps its
    /// declared methods invoking every chain method with memoized defaults,
    /// then invokes the terminal build method.
    ///
    /// An excluded method is not invoked, but one shaped like a chain method
    /// still counts as evidence that chain methods exist. A non-chain method
    /// is accepted only when its name carries the ignore marker.
    pub(crate) fn build_product(
        &self,
        builder: &TypeDescriptor,
        build_method: &str,
        builder_exclusions: &ExclusionSet,
        memo: &mut ResolutionMemo<'_>,
    ) -> VerifyResult<Value> {
        let constructors = self.model.constructors(builder)?;
        if constructors.len() != 1 {
            return Err(ContractViolation::builder_shape(
                builder,
                format!(
                    "declares {} constructors, expected exactly one",
                    constructors.len()
                ),
            ));
        }
        let ctor = &constructors[0];
        let args = ctor
            .params
            .iter()
            .map(|param| memo.resolve(param))
            .collect::<VerifyResult<Vec<_>>>()?;
        let mut instance = self.model.construct(ctor, &args, true)?;

        let methods = self.model.declared_methods(builder)?;
        let mut has_chain = false;
        for method in &methods {
            if method.name == build_method {
                continue;
            }
            let chain_shaped = method.return_type.as_ref() == Some(builder);
            if builder_exclusions.contains(&method.name) {
                has_chain |= chain_shaped;
                continue;
            }
            if chain_shaped {
                trace!("driving chain method `{}` of `{}`", method.name, builder);
                let args = method
                    .params
                    .iter()
                    .map(|param| memo.resolve(param))
                    .collect::<VerifyResult<Vec<_>>>()?;
                instance = self.model.invoke(method, &instance, &args)?;
                has_chain = true;
            } else if !method.name.contains(&self.conventions.ignore_marker) {
                return Err(ContractViolation::builder_shape(
                    builder,
                    format!(
                        "method `{}` neither returns the builder nor carries the \
                         ignore marker",
                        method.name
                    ),
                ));
            }
        }
        if !has_chain {
            return Err(ContractViolation::builder_shape(
                builder,
                "declares no chain methods",
            ));
        }

        let build = methods
            .iter()
            .find(|method| method.name == build_method)
            .ok_or_else(|| {
                ContractViolation::builder_shape(
                    builder,
                    format!("no build method named `{}`", build_method),
                )
            })?;
        self.model.invoke(build, &instance, &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Visibility;
    use crate::model::{DynamicModel, MethodBehavior, TypeDef};

    fn immutable_point(model: &mut DynamicModel) -> TypeDescriptor {
        model.define(
            TypeDef::object("Point")
                .read_only("x", TypeDescriptor::i32())
                .read_only("y", TypeDescriptor::i32())
                .ctor_assigning(Visibility::Private, ["x", "y"]),
        )
    }

    #[test]
    fn private_constructor_is_exercised_without_error() {
        let mut model = DynamicModel::new();
        let ty = immutable_point(&mut model);
        let registry = DefaultValueRegistry::new();

        ConstructionVerifier::new(&model, &registry)
            .verify_immutable(&ty, &ExclusionSet::none())
            .unwrap();
    }

    #[test]
    fn write_accessor_violates_immutability() {
        let mut model = DynamicModel::new();
        let ty = model.define(
            TypeDef::object("Leaky")
                .read_only("id", TypeDescriptor::i64())
                .property("note", TypeDescriptor::string())
                .ctor_assigning(Visibility::Public, ["id", "note"]),
        );
        let registry = DefaultValueRegistry::new();

        let err = ConstructionVerifier::new(&model, &registry)
            .verify_immutable(&ty, &ExclusionSet::none())
            .unwrap_err();
        match err {
            ContractViolation::Mutability { property, .. } => assert_eq!(property, "note"),
            other => panic!("expected a mutability violation, got {}", other),
        }
    }

    #[test]
    fn all_constructors_are_exercised() {
        let mut model = DynamicModel::new();
        // The second constructor leaves `y` unset, so its instance cannot
        // hold the resolved default for `y`.
        let ty = model.define(
            TypeDef::object("Sparse")
                .read_only("x", TypeDescriptor::i32())
                .read_only("y", TypeDescriptor::i32())
                .ctor_assigning(Visibility::Public, ["x", "y"])
                .ctor_assigning(Visibility::Public, ["x"]),
        );
        let registry = DefaultValueRegistry::new();

        let err = ConstructionVerifier::new(&model, &registry)
            .verify_immutable(&ty, &ExclusionSet::none())
            .unwrap_err();
        match err {
            ContractViolation::PropertyValueMismatch { property, .. } => {
                assert_eq!(property, "y")
            }
            other => panic!("expected a property value mismatch, got {}", other),
        }
    }

    fn built_cost(model: &mut DynamicModel) -> TypeDescriptor {
        let product = TypeDescriptor::object("Cost");
        let builder = model.define(
            TypeDef::object("Cost::Builder")
                .default_ctor()
                .chain("amount", TypeDescriptor::decimal())
                .chain("currency", TypeDescriptor::string())
                .build_method("build", &product),
        );
        model.define(
            TypeDef::object("Cost")
                .read_only("amount", TypeDescriptor::decimal())
                .read_only("currency", TypeDescriptor::string())
                .nested(&builder),
        )
    }

    #[test]
    fn conventional_builder_passes() {
        let mut model = DynamicModel::new();
        let ty = built_cost(&mut model);
        let registry = DefaultValueRegistry::new();

        BuilderVerifier::new(&model, &registry)
            .verify(&ty, &ExclusionSet::none())
            .unwrap();
    }

    #[test]
    fn missing_builder_is_reported_by_name() {
        let mut model = DynamicModel::new();
        let ty = model.define(TypeDef::object("Bare").read_only("x", TypeDescriptor::i32()));
        let registry = DefaultValueRegistry::new();

        let err = BuilderVerifier::new(&model, &registry)
            .verify(&ty, &ExclusionSet::none())
            .unwrap_err();
        match err {
            ContractViolation::BuilderNotFound { builder_name, .. } => {
                assert_eq!(builder_name, "Builder")
            }
            other => panic!("expected builder-not-found, got {}", other),
        }
    }

    #[test]
    fn two_builder_constructors_are_a_shape_violation() {
        let mut model = DynamicModel::new();
        let product = TypeDescriptor::object("Thing");
        let builder = model.define(
            TypeDef::object("Thing::Builder")
                .property("seed", TypeDescriptor::i32())
                .default_ctor()
                .ctor_assigning(Visibility::Public, ["seed"])
                .chain("value", TypeDescriptor::i32())
                .build_method("build", &product),
        );
        model.define(
            TypeDef::object("Thing")
                .read_only("value", TypeDescriptor::i32())
                .nested(&builder),
        );
        let registry = DefaultValueRegistry::new();

        let err = BuilderVerifier::new(&model, &registry)
            .verify(&TypeDescriptor::object("Thing"), &ExclusionSet::none())
            .unwrap_err();
        assert!(matches!(err, ContractViolation::BuilderShape { .. }));
    }

    #[test]
    fn non_chain_method_needs_the_ignore_marker() {
        let mut model = DynamicModel::new();
        let product = TypeDescriptor::object("Conf");
        let builder = model.define(
            TypeDef::object("Conf::Builder")
                .default_ctor()
                .chain("name", TypeDescriptor::string())
                .method(
                    "validate",
                    Vec::new(),
                    Some(TypeDescriptor::boolean()),
                    MethodBehavior::ReturnConstant(Value::Bool(true)),
                )
                .build_method("build", &product),
        );
        model.define(
            TypeDef::object("Conf")
                .read_only("name", TypeDescriptor::string())
                .nested(&builder),
        );
        let registry = DefaultValueRegistry::new();

        let err = BuilderVerifier::new(&model, &registry)
            .verify(&TypeDescriptor::object("Conf"), &ExclusionSet::none())
            .unwrap_err();
        match err {
            ContractViolation::BuilderShape { reason, .. } => {
                assert!(reason.contains("validate"))
            }
            other => panic!("expected a builder shape violation, got {}", other),
        }
    }

    #[test]
    fn marked_methods_are_ignored_by_the_sweep() {
        let mut model = DynamicModel::new();
        let product = TypeDescriptor::object("Gen");
        let builder = model.define(
            TypeDef::object("Gen::Builder")
                .default_ctor()
                .chain("name", TypeDescriptor::string())
                .method(
                    "access$000",
                    Vec::new(),
                    Some(TypeDescriptor::i32()),
                    MethodBehavior::ReturnConstant(Value::I32(0)),
                )
                .build_method("build", &product),
        );
        model.define(
            TypeDef::object("Gen")
                .read_only("name", TypeDescriptor::string())
                .nested(&builder),
        );
        let registry = DefaultValueRegistry::new();

        BuilderVerifier::new(&model, &registry)
            .verify(&TypeDescriptor::object("Gen"), &ExclusionSet::none())
            .unwrap();
    }

    #[test]
    fn custom_conventions_are_honored() {
        let mut model = DynamicModel::new();
        let product = TypeDescriptor::object("Order");
        let builder = model.define(
            TypeDef::object("Order::Maker")
                .default_ctor()
                .chain("total", TypeDescriptor::decimal())
                .build_method("make", &product),
        );
        model.define(
            TypeDef::object("Order")
                .read_only("total", TypeDescriptor::decimal())
                .nested(&builder),
        );
        let registry = DefaultValueRegistry::new();

        BuilderVerifier::new(&model, &registry)
            .with_conventions(BuilderConventions {
                builder_name: "Maker".to_string(),
                build_method: "make".to_string(),
                ignore_marker: "$".to_string(),
            })
            .verify(&TypeDescriptor::object("Order"), &ExclusionSet::none())
            .unwrap();
    }
}
