use pretty_assertions::assert_eq;

use super::*;
use crate::invoke::{AccessPolicy, PublicOnly};
use crate::ty::ParamMode;

struct WaiverFor(ModuleId);

impl AccessPolicy for WaiverFor {
    fn has_waiver(&self, module: ModuleId) -> bool {
        module == self.0
    }
}

fn shape_hierarchy(store: &TypeStore) -> (TypeId, TypeId, TypeId) {
    let lib = store.add_module("Shapes", true);
    let shape = store.define(
        TypeBuilder::interface("Shapes.IShape")
            .module(lib)
            .method(MethodBuilder::new("Area").returns(TypeId::FLOAT64.into())),
    );
    let base = store.define(
        TypeBuilder::class("Shapes.ShapeBase")
            .module(lib)
            .flags(TypeFlags::ABSTRACT)
            .implements(TypeRef::of(shape))
            .method(
                MethodBuilder::new("Area")
                    .returns(TypeId::FLOAT64.into())
                    .with_flags(MethodFlags::ABSTRACT | MethodFlags::VIRTUAL),
            )
            .method(
                MethodBuilder::new("Describe")
                    .returns(TypeId::STRING.into())
                    .with_flags(MethodFlags::VIRTUAL)
                    .body(|_| Ok(Value::from("shape"))),
            ),
    );
    let square = store.define(
        TypeBuilder::class("Shapes.Square")
            .module(lib)
            .base(TypeRef::of(base))
            .method(
                MethodBuilder::new("Area")
                    .returns(TypeId::FLOAT64.into())
                    .with_flags(MethodFlags::VIRTUAL)
                    .body(|inv| {
                        let side = inv.this_state::<f64>()?;
                        Ok(Value::F64(side * side))
                    }),
            ),
    );
    (shape, base, square)
}

#[test]
fn well_known_types_are_registered() {
    let store = TypeStore::new();
    assert_eq!(store.ty(TypeId::OBJECT).full_name(), "System.Object");
    assert_eq!(store.ty(TypeId::STRING).full_name(), "System.String");
    assert!(store.ty(TypeId::DUCK_TYPE).is_interface());
    assert_eq!(
        store.method(MethodId::DUCK_GET_INSTANCE).name,
        "GetInstance"
    );
    assert!(store.ty(TypeId::OBJECT).base.is_none());
    assert!(store.is_value_type(&TypeId::INT32.into()));
    assert!(!store.is_value_type(&TypeId::STRING.into()));
}

#[test]
fn lookup_by_full_and_qualified_name() {
    let store = TypeStore::new();
    let (shape, ..) = shape_hierarchy(&store);
    assert_eq!(store.lookup_type("Shapes.IShape"), Some(shape));
    assert_eq!(store.lookup_type("Shapes.IShape, Shapes"), Some(shape));
    assert_eq!(store.lookup_type("Shapes.IShape, Other"), None);
    assert_eq!(store.lookup_type("Shapes.Missing"), None);
    assert_eq!(
        store.qualified_name(&TypeRef::of(shape)),
        "Shapes.IShape, Shapes"
    );
}

#[test]
fn assignability_walks_classes_and_interfaces() {
    let store = TypeStore::new();
    let (shape, base, square) = shape_hierarchy(&store);
    let square = TypeRef::of(square);
    assert!(store.is_assignable(&TypeRef::of(base), &square));
    assert!(store.is_assignable(&TypeRef::of(shape), &square));
    assert!(store.is_assignable(&TypeRef::object(), &square));
    assert!(!store.is_assignable(&square, &TypeRef::of(base)));
    assert!(!store.is_assignable(&TypeRef::object(), &TypeRef::by_ref(square)));
}

#[test]
fn generic_arguments_are_invariant() {
    let store = TypeStore::new();
    let list = store.define(TypeBuilder::class("Coll.List").generic_params(&["T"]));
    let of_string = TypeRef::generic(list, vec![TypeId::STRING.into()]);
    let of_object = TypeRef::generic(list, vec![TypeRef::object()]);
    assert!(!store.is_assignable(&of_object, &of_string));
    assert_eq!(store.full_name(&of_string), "Coll.List<System.String>");
    assert_eq!(store.short_name(&of_string), "List<String>");
}

#[test]
fn virtual_call_reaches_most_derived_override() {
    let store = TypeStore::new();
    let (shape, base, square) = shape_hierarchy(&store);
    let instance = Value::object(square, 3.0_f64);

    let via_interface = store.find_declared(shape, "Area").expect("IShape.Area");
    let via_base = store.find_declared(base, "Area").expect("ShapeBase.Area");
    let describe = store.find_declared(base, "Describe").expect("Describe");

    let mut none: [Value; 0] = [];
    assert_eq!(
        store.call(&PublicOnly, via_interface, Some(&instance), &mut none, &[]),
        Ok(Value::F64(9.0))
    );
    assert_eq!(
        store.call(&PublicOnly, via_base, Some(&instance), &mut none, &[]),
        Ok(Value::F64(9.0))
    );
    assert_eq!(
        store.call(&PublicOnly, describe, Some(&instance), &mut none, &[]),
        Ok(Value::from("shape"))
    );
}

#[test]
fn explicit_override_link_wins() {
    let store = TypeStore::new();
    let (_, base, _) = shape_hierarchy(&store);
    let area = store.find_declared(base, "Area").expect("Area");
    let odd = store.define(
        TypeBuilder::class("Shapes.Odd").base(TypeRef::of(base)).method(
            MethodBuilder::new("ComputeArea")
                .returns(TypeId::FLOAT64.into())
                .overrides(area)
                .body(|_| Ok(Value::F64(1.5))),
        ),
    );
    let instance = Value::object(odd, ());
    assert_eq!(
        store.call_ignoring_visibility(area, Some(&instance), &mut [], &[]),
        Ok(Value::F64(1.5))
    );
}

#[test]
fn abstract_member_without_implementation_fails() {
    let store = TypeStore::new();
    let (_, base, _) = shape_hierarchy(&store);
    let area = store.find_declared(base, "Area").expect("Area");
    let instance = Value::object(base, ());
    let err = store
        .call_ignoring_visibility(area, Some(&instance), &mut [], &[])
        .unwrap_err();
    assert!(matches!(err, InvokeError::AbstractMethod { .. }), "{err:?}");
}

#[test]
fn instance_call_on_null_fails() {
    let store = TypeStore::new();
    let (shape, ..) = shape_hierarchy(&store);
    let area = store.find_declared(shape, "Area").expect("Area");
    let err = store
        .call_ignoring_visibility(area, Some(&Value::Null), &mut [], &[])
        .unwrap_err();
    assert!(matches!(err, InvokeError::NullReference { .. }), "{err:?}");
}

#[test]
fn argument_count_is_checked() {
    let store = TypeStore::new();
    let equals = store
        .find_declared(TypeId::OBJECT, "Equals")
        .expect("Equals");
    let instance = Value::object(TypeId::OBJECT, ());
    let err = store
        .call_ignoring_visibility(equals, Some(&instance), &mut [], &[])
        .unwrap_err();
    assert_eq!(
        err,
        InvokeError::ArgumentCount {
            method: "System.Object.Equals(Object)".to_string(),
            expected: 1,
            found: 0,
        }
    );
}

#[test]
fn non_public_members_need_a_waiver() {
    let store = TypeStore::new();
    let vendor = store.add_module("Vendor", true);
    let secret = store.define(
        TypeBuilder::class("Vendor.Secret")
            .module(vendor)
            .visibility(Visibility::Internal)
            .method(
                MethodBuilder::new("Code")
                    .returns(TypeId::INT32.into())
                    .with_flags(MethodFlags::STATIC)
                    .body(|_| Ok(Value::I32(7))),
            ),
    );
    let code = store.find_declared(secret, "Code").expect("Code");
    assert!(!store.is_public_surface(code));

    let err = store.call(&PublicOnly, code, None, &mut [], &[]).unwrap_err();
    assert!(matches!(err, InvokeError::AccessDenied { .. }), "{err:?}");
    assert_eq!(
        store.call(&WaiverFor(vendor), code, None, &mut [], &[]),
        Ok(Value::I32(7))
    );
    assert_eq!(
        store.call_ignoring_visibility(code, None, &mut [], &[]),
        Ok(Value::I32(7))
    );
}

#[test]
fn nested_type_inherits_outer_visibility() {
    let store = TypeStore::new();
    let outer = store.define(TypeBuilder::class("Lib.Outer").visibility(Visibility::Private));
    let inner = store.define(TypeBuilder::class("Lib.Outer.Inner").nested_in(outer));
    assert!(!store.is_type_public(inner));
    assert!(!store.is_ref_public(&TypeRef::generic(
        TypeId::OBJECT,
        vec![TypeRef::of(inner)]
    )));
}

#[test]
fn out_parameters_are_written_back() {
    let store = TypeStore::new();
    let parser = store.define(
        TypeBuilder::class("Text.Parser").method(
            MethodBuilder::new("TryParse")
                .with_flags(MethodFlags::STATIC)
                .param("text", TypeId::STRING.into())
                .by_ref_param("result", TypeId::INT32.into(), ParamMode::Out)
                .returns(TypeId::BOOL.into())
                .body(|mut inv| {
                    let parsed = inv.arg(0).as_str().and_then(|s| s.parse::<i32>().ok());
                    inv.set(1, Value::I32(parsed.unwrap_or_default()));
                    Ok(Value::Bool(parsed.is_some()))
                }),
        ),
    );
    let try_parse = store.find_declared(parser, "TryParse").expect("TryParse");
    let mut args = [Value::from("42"), Value::Null];
    assert_eq!(
        store.call(&PublicOnly, try_parse, None, &mut args, &[]),
        Ok(Value::Bool(true))
    );
    assert_eq!(args[1], Value::I32(42));
    assert_eq!(
        store.method_signature(try_parse),
        "System.Boolean TryParse(System.String, out System.Int32&)"
    );
}

#[test]
fn declared_types_can_be_referenced_before_completion() {
    let store = TypeStore::new();
    let builder = TypeBuilder::class("Graph.Node");
    let node = store.declare(&builder);
    store.complete(
        node,
        builder.method(MethodBuilder::new("Next").returns(TypeRef::of(node))),
    );
    let next = store.find_declared(node, "Next").expect("Next");
    assert_eq!(store.method(next).ret, TypeRef::of(node));
}
