//! Declarative object model.
//!
//! [`DynamicModel`] is the reference [`ObjectModelIntrospector`] for
//! platforms without runtime reflection: callers describe their types as
//! [`TypeDef`]s — properties with optional non-conforming accessor behaviors,
//! constructors that assign parameters to fields, chain and build methods for
//! builder companions, enum constants, and equals/hashCode override points —
//! and the model plays them back through the introspection trait.
//!
//! Behaviors are small declarative enums rather than closures, which keeps a
//! model printable and its replay deterministic.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::descriptor::{
    ConstructorDescriptor, MethodDescriptor, PropertyDescriptor, TypeDescriptor, Visibility,
};
use crate::introspect::ObjectModelIntrospector;
use crate::value::{ObjectRef, Value};
use crate::violation::{ContractViolation, VerifyResult};

const EQUALS: &str = "equals";
const HASH_CODE: &str = "hashCode";

/// What a read accessor does when invoked.
#[derive(Debug, Clone)]
pub enum ReadBehavior {
    /// Return the stored field value.
    Field,
    /// Return a content-equal copy behind a fresh allocation. Violates the
    /// accessor contract for reference-typed properties.
    DefensiveCopy,
    /// Return a fixed value regardless of what was stored.
    Constant(Value),
}

/// What a write accessor does when invoked.
#[derive(Debug, Clone)]
pub enum WriteBehavior {
    /// Store the argument in the field.
    Field,
    /// Silently drop the argument. Violates the accessor contract.
    Ignore,
}

/// A property of a [`TypeDef`].
#[derive(Debug, Clone)]
pub struct PropertyDef {
    name: String,
    ty: TypeDescriptor,
    readable: bool,
    writable: bool,
    read_behavior: ReadBehavior,
    write_behavior: WriteBehavior,
}

impl PropertyDef {
    pub fn new(name: &str, ty: TypeDescriptor) -> Self {
        PropertyDef {
            name: name.to_string(),
            ty,
            readable: true,
            writable: true,
            read_behavior: ReadBehavior::Field,
            write_behavior: WriteBehavior::Field,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn reading(mut self, behavior: ReadBehavior) -> Self {
        self.read_behavior = behavior;
        self
    }

    pub fn writing(mut self, behavior: WriteBehavior) -> Self {
        self.write_behavior = behavior;
        self
    }
}

/// Where `equals`/`hashCode` are declared.
#[derive(Debug, Clone)]
pub enum OverridePoint {
    /// Not overridden; declared by the universal base, with identity
    /// semantics.
    Inherited,
    /// Overridden by the given type, with field-based semantics.
    Overridden(TypeDescriptor),
}

/// What a declared (non-accessor) method does when invoked.
#[derive(Debug, Clone)]
pub enum MethodBehavior {
    /// Store the single argument in the named field and return the receiver.
    /// The shape of a builder chain setter.
    SetFieldReturnSelf(String),
    /// Create an instance of the given product type carrying the receiver's
    /// accumulated fields. The shape of a terminal build method.
    BuildProduct(TypeDescriptor),
    /// Return a fixed value.
    ReturnConstant(Value),
}

#[derive(Debug, Clone)]
struct MethodDef {
    name: String,
    params: Vec<TypeDescriptor>,
    return_type: Option<TypeDescriptor>,
    visibility: Visibility,
    behavior: MethodBehavior,
}

#[derive(Debug, Clone)]
struct CtorDef {
    /// Property names the parameters are assigned to, in order. Parameter
    /// types come from the named properties.
    fields: Vec<String>,
    visibility: Visibility,
}

/// A declarative type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    descriptor: TypeDescriptor,
    properties: Vec<PropertyDef>,
    constructors: Vec<CtorDef>,
    methods: Vec<MethodDef>,
    nested: Vec<TypeDescriptor>,
    constants: Vec<Arc<str>>,
    equals: OverridePoint,
    hash_code: OverridePoint,
}

impl TypeDef {
    /// A composite type with no members. Add properties, constructors and
    /// methods with the builder methods below.
    pub fn object(name: &str) -> Self {
        TypeDef {
            descriptor: TypeDescriptor::object(name),
            properties: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            constants: Vec::new(),
            equals: OverridePoint::Inherited,
            hash_code: OverridePoint::Inherited,
        }
    }

    /// An enumerated type with declaration-ordered constants.
    pub fn enumeration<'c>(name: &str, constants: impl IntoIterator<Item = &'c str>) -> Self {
        TypeDef {
            descriptor: TypeDescriptor::enumeration(name),
            properties: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            nested: Vec::new(),
            constants: constants.into_iter().map(Arc::from).collect(),
            equals: OverridePoint::Inherited,
            hash_code: OverridePoint::Inherited,
        }
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Field-backed property with both accessors.
    pub fn property(mut self, name: &str, ty: TypeDescriptor) -> Self {
        self.properties.push(PropertyDef::new(name, ty));
        self
    }

    /// Field-backed property with only a read accessor.
    pub fn read_only(mut self, name: &str, ty: TypeDescriptor) -> Self {
        self.properties.push(PropertyDef::new(name, ty).read_only());
        self
    }

    /// Fully specified property, for non-conforming accessor fixtures.
    pub fn property_with(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    /// Public zero-argument constructor.
    pub fn default_ctor(self) -> Self {
        self.ctor_assigning(Visibility::Public, [] as [&str; 0])
    }

    /// Constructor assigning one parameter per named property, in order.
    /// Parameter types are the named properties' declared types.
    pub fn ctor_assigning<'f>(
        mut self,
        visibility: Visibility,
        fields: impl IntoIterator<Item = &'f str>,
    ) -> Self {
        self.constructors.push(CtorDef {
            fields: fields.into_iter().map(str::to_string).collect(),
            visibility,
        });
        self
    }

    /// Chain setter: a public method of the same name as the field it sets,
    /// taking one parameter and returning the receiver type.
    pub fn chain(mut self, name: &str, param: TypeDescriptor) -> Self {
        let return_type = self.descriptor.clone();
        self.methods.push(MethodDef {
            name: name.to_string(),
            params: vec![param],
            return_type: Some(return_type),
            visibility: Visibility::Public,
            behavior: MethodBehavior::SetFieldReturnSelf(name.to_string()),
        });
        self
    }

    /// Terminal build method producing an instance of `product` from the
    /// receiver's accumulated fields.
    pub fn build_method(mut self, name: &str, product: &TypeDescriptor) -> Self {
        self.methods.push(MethodDef {
            name: name.to_string(),
            params: Vec::new(),
            return_type: Some(product.clone()),
            visibility: Visibility::Public,
            behavior: MethodBehavior::BuildProduct(product.clone()),
        });
        self
    }

    /// Arbitrary declared method, for shape fixtures.
    pub fn method(
        mut self,
        name: &str,
        params: Vec<TypeDescriptor>,
        return_type: Option<TypeDescriptor>,
        behavior: MethodBehavior,
    ) -> Self {
        self.methods.push(MethodDef {
            name: name.to_string(),
            params,
            return_type,
            visibility: Visibility::Public,
            behavior,
        });
        self
    }

    /// Registers a nested companion type.
    pub fn nested(mut self, ty: &TypeDescriptor) -> Self {
        self.nested.push(ty.clone());
        self
    }

    /// Overrides both `equals` and `hashCode` with field-based semantics,
    /// declared by this type.
    pub fn overrides_equality(mut self) -> Self {
        self.equals = OverridePoint::Overridden(self.descriptor.clone());
        self.hash_code = OverridePoint::Overridden(self.descriptor.clone());
        self
    }

    /// Overrides `equals` but not `hashCode`. An equality-contract violation
    /// fixture.
    pub fn overrides_equals_only(mut self) -> Self {
        self.equals = OverridePoint::Overridden(self.descriptor.clone());
        self
    }

    /// Overrides `hashCode` but not `equals`. The reverse asymmetry fixture.
    pub fn overrides_hash_code_only(mut self) -> Self {
        self.hash_code = OverridePoint::Overridden(self.descriptor.clone());
        self
    }

    /// Both members declared by the given ancestor type.
    pub fn equality_declared_by(mut self, ancestor: &TypeDescriptor) -> Self {
        self.equals = OverridePoint::Overridden(ancestor.clone());
        self.hash_code = OverridePoint::Overridden(ancestor.clone());
        self
    }

    fn property_def(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|prop| prop.name == name)
    }

    fn declaring_type(&self, point: &OverridePoint) -> TypeDescriptor {
        match point {
            OverridePoint::Inherited => TypeDescriptor::base(),
            OverridePoint::Overridden(ty) => ty.clone(),
        }
    }
}

/// Registry of [`TypeDef`]s implementing [`ObjectModelIntrospector`].
#[derive(Debug, Default)]
pub struct DynamicModel {
    types: HashMap<TypeDescriptor, TypeDef>,
}

impl DynamicModel {
    pub fn new() -> Self {
        DynamicModel::default()
    }

    /// Registers a type definition and returns its descriptor.
    pub fn define(&mut self, def: TypeDef) -> TypeDescriptor {
        let descriptor = def.descriptor.clone();
        self.types.insert(descriptor.clone(), def);
        descriptor
    }

    fn type_def(&self, ty: &TypeDescriptor) -> VerifyResult<&TypeDef> {
        self.types
            .get(ty)
            .ok_or_else(|| ContractViolation::introspection(ty, "type is not defined in the model"))
    }

    fn ctor_fields<'t>(
        &self,
        def: &'t TypeDef,
        ctor: &ConstructorDescriptor,
    ) -> VerifyResult<&'t CtorDef> {
        for candidate in &def.constructors {
            let types = self.ctor_param_types(def, candidate)?;
            if types == ctor.params && candidate.visibility == ctor.visibility {
                return Ok(candidate);
            }
        }
        Err(ContractViolation::construction(
            &def.descriptor,
            "no constructor with that signature",
        ))
    }

    fn ctor_param_types(&self, def: &TypeDef, ctor: &CtorDef) -> VerifyResult<Vec<TypeDescriptor>> {
        ctor.fields
            .iter()
            .map(|field| {
                def.property_def(field)
                    .map(|prop| prop.ty.clone())
                    .ok_or_else(|| {
                        ContractViolation::introspection(
                            &def.descriptor,
                            format!("constructor parameter `{}` names no property", field),
                        )
                    })
            })
            .collect()
    }

    fn read_descriptor(&self, owner: &TypeDescriptor, prop: &PropertyDef) -> MethodDescriptor {
        MethodDescriptor {
            owner: owner.clone(),
            name: prop.name.clone(),
            params: Vec::new(),
            return_type: Some(prop.ty.clone()),
            declared_by: owner.clone(),
            visibility: Visibility::Public,
        }
    }

    fn write_descriptor(&self, owner: &TypeDescriptor, prop: &PropertyDef) -> MethodDescriptor {
        MethodDescriptor {
            owner: owner.clone(),
            name: format!("set_{}", prop.name),
            params: vec![prop.ty.clone()],
            return_type: None,
            declared_by: owner.clone(),
            visibility: Visibility::Public,
        }
    }

    fn equality_descriptor(&self, def: &TypeDef, name: &str) -> MethodDescriptor {
        let (point, params, return_type) = if name == EQUALS {
            (
                &def.equals,
                vec![TypeDescriptor::base()],
                TypeDescriptor::boolean(),
            )
        } else {
            (&def.hash_code, Vec::new(), TypeDescriptor::i64())
        };
        MethodDescriptor {
            owner: def.descriptor.clone(),
            name: name.to_string(),
            params,
            return_type: Some(return_type),
            declared_by: def.declaring_type(point),
            visibility: Visibility::Public,
        }
    }

    fn method_descriptor(&self, owner: &TypeDescriptor, def: &MethodDef) -> MethodDescriptor {
        MethodDescriptor {
            owner: owner.clone(),
            name: def.name.clone(),
            params: def.params.clone(),
            return_type: def.return_type.clone(),
            declared_by: owner.clone(),
            visibility: def.visibility,
        }
    }

    fn receiver_object<'v>(
        &self,
        method: &MethodDescriptor,
        receiver: &'v Value,
    ) -> VerifyResult<&'v ObjectRef> {
        match receiver {
            Value::Object(obj) => Ok(obj),
            other => Err(ContractViolation::invocation(
                &method.owner,
                &method.name,
                format!("receiver is not an object instance: {}", other),
            )),
        }
    }

    fn invoke_equals(&self, def: &TypeDef, obj: &ObjectRef, other: &Value) -> Value {
        let result = match &def.equals {
            OverridePoint::Inherited => match other {
                Value::Object(rhs) => obj.ptr_eq(rhs),
                _ => false,
            },
            OverridePoint::Overridden(_) => match other {
                Value::Object(rhs) if rhs.ty() == obj.ty() => def
                    .properties
                    .iter()
                    .all(|prop| obj.get(&prop.name).value_eq(&rhs.get(&prop.name))),
                _ => false,
            },
        };
        Value::Bool(result)
    }

    fn invoke_hash_code(&self, def: &TypeDef, obj: &ObjectRef) -> Value {
        match &def.hash_code {
            OverridePoint::Inherited => Value::I64(obj.address() as i64),
            OverridePoint::Overridden(_) => {
                let mut hasher = DefaultHasher::new();
                obj.ty().hash(&mut hasher);
                for prop in &def.properties {
                    prop.name.hash(&mut hasher);
                    obj.get(&prop.name).hash_code().hash(&mut hasher);
                }
                Value::I64(hasher.finish() as i64)
            }
        }
    }

    fn invoke_accessor(
        &self,
        def: &TypeDef,
        method: &MethodDescriptor,
        obj: &ObjectRef,
        args: &[Value],
    ) -> Option<VerifyResult<Value>> {
        if let Some(field) = method.name.strip_prefix("set_") {
            let prop = def.property_def(field)?;
            if !prop.writable {
                return None;
            }
            let Some(arg) = args.first() else {
                return Some(Err(ContractViolation::invocation(
                    &method.owner,
                    &method.name,
                    "write accessor invoked without an argument",
                )));
            };
            match prop.write_behavior {
                WriteBehavior::Field => obj.set(field, arg.clone()),
                WriteBehavior::Ignore => {}
            }
            return Some(Ok(Value::Null));
        }

        let prop = def.property_def(&method.name)?;
        if !prop.readable {
            return None;
        }
        let value = match &prop.read_behavior {
            ReadBehavior::Field => obj.get(&prop.name),
            ReadBehavior::DefensiveCopy => obj.get(&prop.name).detached_clone(),
            ReadBehavior::Constant(value) => value.clone(),
        };
        Some(Ok(value))
    }

    fn invoke_declared(
        &self,
        method: &MethodDescriptor,
        receiver: &Value,
        obj: &ObjectRef,
        def: &MethodDef,
        args: &[Value],
    ) -> VerifyResult<Value> {
        match &def.behavior {
            MethodBehavior::SetFieldReturnSelf(field) => {
                let arg = args.first().ok_or_else(|| {
                    ContractViolation::invocation(
                        &method.owner,
                        &method.name,
                        "chain method invoked without an argument",
                    )
                })?;
                obj.set(field, arg.clone());
                Ok(receiver.clone())
            }
            MethodBehavior::BuildProduct(product_ty) => {
                // The product is introspected independently later; here the
                // builder's accumulated fields become the product's state.
                self.type_def(product_ty)?;
                let product = ObjectRef::new(product_ty.clone());
                for (field, value) in obj.fields_snapshot() {
                    product.set(&field, value);
                }
                Ok(Value::Object(product))
            }
            MethodBehavior::ReturnConstant(value) => Ok(value.clone()),
        }
    }
}

impl ObjectModelIntrospector for DynamicModel {
    fn properties(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<PropertyDescriptor>> {
        let def = self.type_def(ty)?;
        Ok(def
            .properties
            .iter()
            .map(|prop| PropertyDescriptor {
                name: prop.name.clone(),
                declared_type: prop.ty.clone(),
                read: prop.readable.then(|| self.read_descriptor(ty, prop)),
                write: prop.writable.then(|| self.write_descriptor(ty, prop)),
            })
            .collect())
    }

    fn constructors(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<ConstructorDescriptor>> {
        let def = self.type_def(ty)?;
        def.constructors
            .iter()
            .map(|ctor| {
                Ok(ConstructorDescriptor {
                    owner: ty.clone(),
                    params: self.ctor_param_types(def, ctor)?,
                    visibility: ctor.visibility,
                })
            })
            .collect()
    }

    fn declared_methods(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<MethodDescriptor>> {
        let def = self.type_def(ty)?;
        Ok(def
            .methods
            .iter()
            .map(|method| self.method_descriptor(ty, method))
            .collect())
    }

    fn lookup_method(&self, ty: &TypeDescriptor, name: &str) -> VerifyResult<MethodDescriptor> {
        let def = self.type_def(ty)?;
        if name == EQUALS || name == HASH_CODE {
            return Ok(self.equality_descriptor(def, name));
        }
        if let Some(method) = def.methods.iter().find(|method| method.name == name) {
            return Ok(self.method_descriptor(ty, method));
        }
        if let Some(prop) = def.property_def(name).filter(|prop| prop.readable) {
            return Ok(self.read_descriptor(ty, prop));
        }
        if let Some(field) = name.strip_prefix("set_") {
            if let Some(prop) = def.property_def(field).filter(|prop| prop.writable) {
                return Ok(self.write_descriptor(ty, prop));
            }
        }
        Err(ContractViolation::introspection(
            ty,
            format!("no method named `{}`", name),
        ))
    }

    fn nested_types(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<TypeDescriptor>> {
        Ok(self.type_def(ty)?.nested.clone())
    }

    fn enum_constants(&self, ty: &TypeDescriptor) -> VerifyResult<Vec<Value>> {
        let def = self.type_def(ty)?;
        Ok(def
            .constants
            .iter()
            .enumerate()
            .map(|(ordinal, constant)| Value::Enum {
                ty: ty.clone(),
                constant: constant.clone(),
                ordinal,
            })
            .collect())
    }

    fn construct(
        &self,
        ctor: &ConstructorDescriptor,
        args: &[Value],
        bypass_visibility: bool,
    ) -> VerifyResult<Value> {
        let def = self.type_def(&ctor.owner)?;
        let ctor_def = self.ctor_fields(def, ctor)?;
        if ctor_def.visibility == Visibility::Private && !bypass_visibility {
            return Err(ContractViolation::construction(
                &ctor.owner,
                "constructor is private and visibility bypass was not requested",
            ));
        }
        if args.len() != ctor_def.fields.len() {
            return Err(ContractViolation::construction(
                &ctor.owner,
                format!(
                    "constructor takes {} arguments, got {}",
                    ctor_def.fields.len(),
                    args.len()
                ),
            ));
        }
        let instance = ObjectRef::new(ctor.owner.clone());
        for (field, arg) in ctor_def.fields.iter().zip(args) {
            instance.set(field, arg.clone());
        }
        Ok(Value::Object(instance))
    }

    fn invoke(
        &self,
        method: &MethodDescriptor,
        receiver: &Value,
        args: &[Value],
    ) -> VerifyResult<Value> {
        let obj = self.receiver_object(method, receiver)?;
        let def = self.type_def(obj.ty())?;

        if method.name == EQUALS {
            let other = args.first().ok_or_else(|| {
                ContractViolation::invocation(obj.ty(), EQUALS, "missing comparand argument")
            })?;
            return Ok(self.invoke_equals(def, obj, other));
        }
        if method.name == HASH_CODE {
            return Ok(self.invoke_hash_code(def, obj));
        }
        if let Some(result) = self.invoke_accessor(def, method, obj, args) {
            return result;
        }
        if let Some(declared) = def.methods.iter().find(|m| m.name == method.name) {
            return self.invoke_declared(method, receiver, obj, declared, args);
        }
        Err(ContractViolation::invocation(
            obj.ty(),
            &method.name,
            "no such member on the receiver's type",
        ))
    }
}
