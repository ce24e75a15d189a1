//! Builder-immutable contract over the declarative model.

use beancheck::{
    BuilderConventions, BuilderVerifier, ContractViolation, DefaultValueRegistry, DynamicModel,
    ExclusionSet, MethodBehavior, TypeDef, TypeDescriptor, Value, Visibility,
};

fn cost(model: &mut DynamicModel) -> TypeDescriptor {
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
    let ty = cost(&mut model);
    let registry = DefaultValueRegistry::new();

    BuilderVerifier::new(&model, &registry)
        .verify(&ty, &ExclusionSet::none())
        .unwrap();
}

#[test]
fn missing_companion_reports_the_expected_name() {
    let mut model = DynamicModel::new();
    let ty = model.define(TypeDef::object("Flat").read_only("x", TypeDescriptor::i32()));
    let registry = DefaultValueRegistry::new();

    let err = BuilderVerifier::new(&model, &registry)
        .verify(&ty, &ExclusionSet::none())
        .unwrap_err();
    match err {
        ContractViolation::BuilderNotFound { builder_name, type_name } => {
            assert_eq!(builder_name, "Builder");
            assert_eq!(type_name, "Flat");
        }
        other => panic!("expected builder-not-found, got {}", other),
    }
}

#[test]
fn builder_with_two_constructors_is_malformed() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Config");
    let builder = model.define(
        TypeDef::object("Config::Builder")
            .property("seed", TypeDescriptor::i32())
            .default_ctor()
            .ctor_assigning(Visibility::Public, ["seed"])
            .chain("host", TypeDescriptor::string())
            .build_method("build", &product),
    );
    model.define(
        TypeDef::object("Config")
            .read_only("host", TypeDescriptor::string())
            .nested(&builder),
    );
    let registry = DefaultValueRegistry::new();

    let err = BuilderVerifier::new(&model, &registry)
        .verify(&TypeDescriptor::object("Config"), &ExclusionSet::none())
        .unwrap_err();
    match err {
        ContractViolation::BuilderShape { reason, .. } => assert!(reason.contains("2")),
        other => panic!("expected a builder shape violation, got {}", other),
    }
}

#[test]
fn builder_without_chain_methods_is_malformed() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Empty");
    let builder = model.define(
        TypeDef::object("Empty::Builder")
            .default_ctor()
            .build_method("build", &product),
    );
    model.define(TypeDef::object("Empty").nested(&builder));
    let registry = DefaultValueRegistry::new();

    let err = BuilderVerifier::new(&model, &registry)
        .verify(&TypeDescriptor::object("Empty"), &ExclusionSet::none())
        .unwrap_err();
    assert!(matches!(err, ContractViolation::BuilderShape { .. }));
}

#[test]
fn non_chain_method_without_marker_is_malformed() {
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
        ContractViolation::BuilderShape { reason, .. } => assert!(reason.contains("validate")),
        other => panic!("expected a builder shape violation, got {}", other),
    }
}

#[test]
fn marker_carrying_methods_are_ignored() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Gen");
    let builder = model.define(
        TypeDef::object("Gen::Builder")
            .default_ctor()
            .chain("name", TypeDescriptor::string())
            .method(
                "access$100",
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
fn excluded_chain_method_still_counts_as_chain_evidence() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Partial");
    let builder = model.define(
        TypeDef::object("Partial::Builder")
            .default_ctor()
            .chain("internal", TypeDescriptor::string())
            .build_method("build", &product),
    );
    model.define(
        TypeDef::object("Partial")
            .read_only("internal", TypeDescriptor::string())
            .nested(&builder),
    );
    let registry = DefaultValueRegistry::new();

    // The only chain method is excluded: it is not invoked (so the product
    // property must be excluded too), but the builder still counts as having
    // chain methods.
    BuilderVerifier::new(&model, &registry)
        .verify(&TypeDescriptor::object("Partial"), &ExclusionSet::of(["internal"]))
        .unwrap();
}

#[test]
fn custom_builder_and_build_method_names() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Order");
    let builder = model.define(
        TypeDef::object("Order::Maker")
            .default_ctor()
            .chain("total", TypeDescriptor::decimal())
            .chain("note", TypeDescriptor::string())
            .build_method("make", &product),
    );
    model.define(
        TypeDef::object("Order")
            .read_only("total", TypeDescriptor::decimal())
            .read_only("note", TypeDescriptor::string())
            .nested(&builder),
    );
    let registry = DefaultValueRegistry::new();
    let conventions = BuilderConventions {
        builder_name: "Maker".to_string(),
        build_method: "make".to_string(),
        ignore_marker: "$".to_string(),
    };

    BuilderVerifier::new(&model, &registry)
        .with_conventions(conventions)
        .verify(&TypeDescriptor::object("Order"), &ExclusionSet::none())
        .unwrap();
}

#[test]
fn explicit_form_takes_separate_exclusions() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Doc");
    let builder = model.define(
        TypeDef::object("Doc::Builder")
            .default_ctor()
            .chain("title", TypeDescriptor::string())
            .chain("draft", TypeDescriptor::boolean())
            .build_method("build", &product),
    );
    model.define(
        TypeDef::object("Doc")
            .read_only("title", TypeDescriptor::string())
            // `draft` is set by the builder but not exposed as a property;
            // only the builder sweep needs to know about it.
            .nested(&builder),
    );
    let registry = DefaultValueRegistry::new();

    BuilderVerifier::new(&model, &registry)
        .verify_with(
            &TypeDescriptor::object("Doc"),
            &builder,
            "build",
            &ExclusionSet::none(),
            &ExclusionSet::none(),
        )
        .unwrap();
}

#[test]
fn mutable_product_fails_like_a_constructed_one() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Loose");
    let builder = model.define(
        TypeDef::object("Loose::Builder")
            .default_ctor()
            .chain("name", TypeDescriptor::string())
            .build_method("build", &product),
    );
    model.define(
        TypeDef::object("Loose")
            .property("name", TypeDescriptor::string())
            .nested(&builder),
    );
    let registry = DefaultValueRegistry::new();

    let err = BuilderVerifier::new(&model, &registry)
        .verify(&TypeDescriptor::object("Loose"), &ExclusionSet::none())
        .unwrap_err();
    assert!(matches!(err, ContractViolation::Mutability { .. }));
}

#[test]
fn verify_bean_adds_the_equality_contract() {
    let mut model = DynamicModel::new();
    let product = TypeDescriptor::object("Receipt");
    let builder = model.define(
        TypeDef::object("Receipt::Builder")
            .default_ctor()
            .chain("total", TypeDescriptor::decimal())
            .chain("issued", TypeDescriptor::timestamp())
            .build_method("build", &product),
    );
    model.define(
        TypeDef::object("Receipt")
            .read_only("total", TypeDescriptor::decimal())
            .read_only("issued", TypeDescriptor::timestamp())
            .nested(&builder)
            .overrides_equality(),
    );
    let registry = DefaultValueRegistry::new();

    BuilderVerifier::new(&model, &registry)
        .verify_bean(&TypeDescriptor::object("Receipt"), &ExclusionSet::none())
        .unwrap();
}
