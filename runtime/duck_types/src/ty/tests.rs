use super::*;
use pretty_assertions::assert_eq;

#[test]
fn substitute_replaces_both_scopes() {
    let list = TypeId::from_raw(100);
    let ty = TypeRef::generic(
        list,
        vec![TypeRef::type_param(0, "T"), TypeRef::method_param(0, "U")],
    );
    let substituted = ty.substitute(&[TypeRef::of(TypeId::INT32)], &[TypeRef::of(TypeId::STRING)]);
    assert_eq!(
        substituted,
        TypeRef::generic(
            list,
            vec![TypeRef::of(TypeId::INT32), TypeRef::of(TypeId::STRING)]
        )
    );
    assert!(!substituted.has_params());
}

#[test]
fn substitute_keeps_unbound_params() {
    let ty = TypeRef::by_ref(TypeRef::method_param(1, "V"));
    let substituted = ty.substitute(&[], &[TypeRef::object()]);
    assert_eq!(substituted, ty);
    assert!(substituted.has_params());
}

#[test]
fn element_strips_one_by_ref() {
    let inner = TypeRef::of(TypeId::INT64);
    let by_ref = TypeRef::by_ref(inner.clone());
    assert!(by_ref.is_by_ref());
    assert_eq!(by_ref.element(), &inner);
    assert_eq!(inner.element(), &inner);
    assert_eq!(by_ref.def_id(), None);
}

#[test]
fn param_modes() {
    assert!(!ParamMode::Value.is_by_ref());
    assert!(ParamMode::In.is_by_ref());
    assert!(!ParamMode::In.writes_back());
    assert!(ParamMode::Out.writes_back());
    assert!(ParamMode::Ref.writes_back());
}
