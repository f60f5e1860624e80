use std::cell::RefCell;

use duck_types::{ModuleId, TypeBuilder};
use pretty_assertions::assert_eq;

use super::*;
use crate::adapter::ProxyState;

#[derive(Default)]
struct RecordingChain {
    wrapped: RefCell<Vec<TypeRef>>,
}

impl Chain for RecordingChain {
    fn chain(&self, contract: &TypeRef, value: Value) -> InvokeResult {
        self.wrapped.borrow_mut().push(contract.clone());
        Ok(value)
    }
}

struct Types {
    store: TypeStore,
    ithing: TypeRef,
    thing: TypeRef,
    point: TypeRef,
    snapshot: TypeRef,
}

fn types() -> Types {
    let store = TypeStore::new();
    let app = store.add_module("App", true);
    let lib = store.add_module("Lib", true);
    let ithing = store.define(TypeBuilder::interface("App.IThing").module(app));
    let thing = store.define(TypeBuilder::class("Lib.Thing").module(lib));
    let point = store.define(
        TypeBuilder::structure("Lib.Point")
            .module(lib)
            .field("x", TypeId::INT32.into())
            .field("y", TypeId::INT32.into()),
    );
    let snapshot = store.define(
        TypeBuilder::structure("App.Snapshot")
            .module(app)
            .flags(TypeFlags::DUCK_COPY)
            .field("y", TypeId::INT32.into()),
    );
    Types {
        store,
        ithing: TypeRef::of(ithing),
        thing: TypeRef::of(thing),
        point: TypeRef::of(point),
        snapshot: TypeRef::of(snapshot),
    }
}

#[test]
fn chaining_only_for_unrelated_user_types() {
    let t = types();
    let s = &t.store;
    assert!(needs_chaining(s, &t.ithing, &t.thing));
    assert!(!needs_chaining(s, &t.thing, &t.thing));
    assert!(!needs_chaining(s, &TypeRef::object(), &t.thing));
    assert!(!needs_chaining(s, &t.point, &t.thing));
    assert!(!needs_chaining(s, &TypeRef::method_param(0, "T"), &t.thing));
    // Core runtime types convert straight even when unrelated.
    assert!(!needs_chaining(s, &TypeId::STRING.into(), &t.thing));
    // By-ref wrappers are looked through.
    assert!(needs_chaining(
        s,
        &TypeRef::by_ref(t.ithing.clone()),
        &TypeRef::by_ref(t.thing.clone())
    ));
    assert_eq!(s.module_of(&t.ithing).map(ModuleId::is_core), Some(false));
}

#[test]
fn plans_follow_the_crossing_direction() {
    let t = types();
    let s = &t.store;
    assert_eq!(
        plan(s, &t.ithing, &t.thing, Crossing::IntoTarget),
        ConversionPlan::Unwrap { to: t.thing.clone() }
    );
    assert_eq!(
        plan(s, &t.ithing, &t.thing, Crossing::OutOfTarget),
        ConversionPlan::Wrap {
            contract: t.ithing.clone()
        }
    );
    assert_eq!(
        plan(s, &TypeRef::object(), &t.thing, Crossing::OutOfTarget),
        ConversionPlan::Straight {
            to: TypeRef::object()
        }
    );
    assert_eq!(
        plan(s, &t.snapshot, &t.point, Crossing::OutOfTarget),
        ConversionPlan::Copy {
            into: t.snapshot.clone()
        }
    );
}

#[test]
fn null_short_circuits_every_plan() {
    let t = types();
    let chain = RecordingChain::default();
    let plans = [
        ConversionPlan::Straight { to: t.point.clone() },
        ConversionPlan::Wrap {
            contract: t.ithing.clone(),
        },
        ConversionPlan::Unwrap { to: t.thing.clone() },
        ConversionPlan::Copy {
            into: t.snapshot.clone(),
        },
    ];
    for plan in &plans {
        assert_eq!(plan.apply(&t.store, &chain, Value::Null), Ok(Value::Null));
    }
    assert!(chain.wrapped.borrow().is_empty());
}

#[test]
fn wrap_goes_through_the_chain() {
    let t = types();
    let chain = RecordingChain::default();
    let thing = Value::object(t.thing.clone(), ());
    let plan = ConversionPlan::Wrap {
        contract: t.ithing.clone(),
    };
    let out = plan.apply(&t.store, &chain, thing.clone()).unwrap();
    assert!(out.same_instance(&thing));
    assert_eq!(*chain.wrapped.borrow(), vec![t.ithing.clone()]);
}

#[test]
fn unwrap_takes_the_instance_out_of_a_proxy() {
    let t = types();
    let thing = Value::object(t.thing.clone(), ());
    let proxy = Value::object(TypeId::OBJECT, ProxyState {
        instance: thing.clone(),
    });
    let plan = ConversionPlan::Unwrap { to: t.thing.clone() };
    let chain = RecordingChain::default();
    assert!(plan.apply(&t.store, &chain, proxy).unwrap().same_instance(&thing));
    // Plain values that are already of the target type pass.
    assert!(plan.apply(&t.store, &chain, thing.clone()).unwrap().same_instance(&thing));
    // Anything else is a cast failure.
    let err = plan.apply(&t.store, &chain, Value::from("nope")).unwrap_err();
    assert!(matches!(err, InvokeError::InvalidCast { .. }), "{err:?}");
}

#[test]
fn straight_conversion_widens_integers() {
    let t = types();
    let chain = RecordingChain::default();
    let to_i64 = ConversionPlan::Straight {
        to: TypeId::INT64.into(),
    };
    assert_eq!(to_i64.apply(&t.store, &chain, Value::I32(5)), Ok(Value::I64(5)));
    let to_f64 = ConversionPlan::Straight {
        to: TypeId::FLOAT64.into(),
    };
    assert_eq!(to_f64.apply(&t.store, &chain, Value::I32(2)), Ok(Value::F64(2.0)));
    let err = to_i64.apply(&t.store, &chain, Value::from("5")).unwrap_err();
    assert!(matches!(err, InvokeError::InvalidCast { .. }), "{err:?}");
}

#[test]
fn copy_projects_fields_by_name() {
    let t = types();
    let chain = RecordingChain::default();
    let point = Value::structure(
        t.point.clone(),
        vec![("x".to_string(), Value::I32(1)), ("y".to_string(), Value::I32(2))],
    );
    let plan = ConversionPlan::Copy {
        into: t.snapshot.clone(),
    };
    let copied = plan.apply(&t.store, &chain, point).unwrap();
    assert_eq!(
        copied,
        Value::structure(t.snapshot.clone(), vec![("y".to_string(), Value::I32(2))])
    );
}
