//! Reverse adapters: an implementation type overriding members of a base
//! type it never references.

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use std::sync::Arc;

use duck_proxy::{DuckError, GenerationContext, ProxyMode};
use duck_types::{
    AnnotationFlags, Annotations, MethodBuilder, MethodFlags, PublicOnly, TypeBuilder, TypeFlags,
    TypeId, TypeRef, TypeStore, Value, Visibility,
};
use pretty_assertions::assert_eq;

fn reverse() -> Annotations {
    Annotations {
        flags: AnnotationFlags::REVERSE,
        ..Annotations::default()
    }
}

fn abstract_member(name: &str) -> MethodBuilder {
    MethodBuilder::new(name).with_flags(MethodFlags::ABSTRACT | MethodFlags::VIRTUAL)
}

fn reverse_member(name: &str) -> MethodBuilder {
    MethodBuilder::new(name)
        .annotate(reverse())
        .body(|_| Ok(Value::Null))
}

fn abstract_base(store: &TypeStore, members: &[&str]) -> TypeRef {
    let builder = members.iter().fold(
        TypeBuilder::class("Lib.Base").flags(TypeFlags::ABSTRACT),
        |b, name| b.method(abstract_member(name)),
    );
    TypeRef::of(store.define(builder))
}

#[test]
fn missing_overrides_are_reported_together() {
    let store = Arc::new(TypeStore::new());
    let base = abstract_base(&store, &["A", "B", "C"]);
    let implementation = store.define(
        TypeBuilder::class("App.Impl")
            .method(reverse_member("A"))
            .method(reverse_member("B")),
    );
    let ctx = GenerationContext::new(store);
    let err = ctx
        .create_reverse(&base, &Value::object(TypeRef::of(implementation), ()))
        .unwrap_err();
    assert_eq!(
        err,
        DuckError::ReverseMissingImplementation {
            base: "Lib.Base".to_string(),
            members: vec!["C".to_string()],
        }
    );
}

#[test]
fn unmarked_methods_do_not_count() {
    let store = Arc::new(TypeStore::new());
    let base = abstract_base(&store, &["A"]);
    let implementation = store.define(
        TypeBuilder::class("App.Impl").method(MethodBuilder::new("A").body(|_| Ok(Value::Null))),
    );
    let ctx = GenerationContext::new(store);
    let err = ctx
        .resolve(&base, &TypeRef::of(implementation), ProxyMode::Reverse)
        .unwrap_err();
    assert!(
        matches!(&err, DuckError::ReverseMissingImplementation { members, .. } if members == &["A"]),
        "{err:?}"
    );
}

struct Handlers {
    store: Arc<TypeStore>,
    handler: TypeRef,
    my_handler: TypeRef,
    msg: TypeRef,
}

/// `Lib.Handler` (abstract `Handle(Msg)`, virtual `Name()`) and an internal
/// `App.MyHandler` whose reverse `Handle(IMsg)` reads the message text.
fn handlers() -> Handlers {
    let store = Arc::new(TypeStore::new());
    let lib = store.add_module("Lib", false);
    let app = store.add_module("App", false);
    let msg = TypeRef::of(
        store.define(
            TypeBuilder::class("Lib.Msg").module(lib).method(
                MethodBuilder::new("Text")
                    .returns(TypeId::STRING.into())
                    .body(|_| Ok(Value::from("hello"))),
            ),
        ),
    );
    let imsg = store.define(
        TypeBuilder::interface("App.IMsg")
            .module(app)
            .method(abstract_member("Text").returns(TypeId::STRING.into())),
    );
    let text = store.find_declared(imsg, "Text").unwrap();
    let handler = TypeRef::of(
        store.define(
            TypeBuilder::class("Lib.Handler")
                .module(lib)
                .flags(TypeFlags::ABSTRACT)
                .method(
                    abstract_member("Handle")
                        .param("msg", msg.clone())
                        .returns(TypeId::INT32.into()),
                )
                .method(
                    MethodBuilder::new("Name")
                        .returns(TypeId::STRING.into())
                        .with_flags(MethodFlags::VIRTUAL)
                        .body(|_| Ok(Value::from("base"))),
                ),
        ),
    );
    let my_handler = TypeRef::of(
        store.define(
            TypeBuilder::class("App.MyHandler")
                .module(app)
                .visibility(Visibility::Internal)
                .method(
                    MethodBuilder::new("Handle")
                        .visibility(Visibility::Internal)
                        .param("msg", TypeRef::of(imsg))
                        .returns(TypeId::INT32.into())
                        .annotate(reverse())
                        .body(move |inv| {
                            let text = inv.store.call(&PublicOnly, text, Some(inv.arg(0)), &mut [], &[])?;
                            let len = text.as_str().map_or(0, str::len);
                            Ok(Value::I32(i32::try_from(len).unwrap_or(i32::MAX)))
                        }),
                ),
        ),
    );
    Handlers {
        store,
        handler,
        my_handler,
        msg,
    }
}

#[test]
fn reverse_overrides_call_the_implementation() {
    let h = handlers();
    let ctx = GenerationContext::new(Arc::clone(&h.store));
    let implementation = Value::object(h.my_handler.clone(), ());
    let adapter = ctx.create_reverse(&h.handler, &implementation).unwrap();

    assert!(h.store.is_instance_of(adapter.value(), &h.handler));
    assert!(adapter.instance().same_instance(&implementation));

    let msg = Value::object(h.msg.clone(), ());
    // The base-typed argument reaches the implementation wrapped as `IMsg`.
    assert_eq!(adapter.call("Handle", &mut [msg]), Ok(Value::I32(5)));
    // Members without a reverse override keep the base behavior.
    assert_eq!(adapter.call("Name", &mut []), Ok(Value::from("base")));
}

#[test]
fn reverse_generic_arity_must_match() {
    let store = Arc::new(TypeStore::new());
    let base = TypeRef::of(
        store.define(
            TypeBuilder::class("Lib.Factory")
                .flags(TypeFlags::ABSTRACT)
                .method(
                    abstract_member("Make")
                        .generic_params(&["T"])
                        .returns(TypeRef::method_param(0, "T")),
                ),
        ),
    );
    let implementation = store.define(
        TypeBuilder::class("App.Factory").method(
            reverse_member("Make").returns(TypeRef::object()),
        ),
    );
    let ctx = GenerationContext::new(store);
    let err = ctx
        .resolve(&base, &TypeRef::of(implementation), ProxyMode::Reverse)
        .unwrap_err();
    assert_eq!(
        err,
        DuckError::ReverseGenericArityMismatch {
            member: "App.Factory.Make()".to_string(),
            candidate: "Lib.Factory.Make()".to_string(),
            expected: 1,
            found: 0,
        }
    );
}

#[test]
fn reverse_parameter_type_names_must_cover_every_parameter() {
    let h = handlers();
    let annotations = Annotations {
        parameter_type_names: Some(vec!["Lib.Msg".to_string(), "System.Int32".to_string()]),
        ..reverse()
    };
    let implementation = h.store.define(
        TypeBuilder::class("App.Strict").method(
            MethodBuilder::new("Handle")
                .param("msg", TypeRef::object())
                .returns(TypeId::INT32.into())
                .annotate(annotations)
                .body(|_| Ok(Value::I32(0))),
        ),
    );
    let ctx = GenerationContext::new(Arc::clone(&h.store));
    let err = ctx
        .resolve(&h.handler, &TypeRef::of(implementation), ProxyMode::Reverse)
        .unwrap_err();
    assert_eq!(
        err,
        DuckError::ReverseAttributeParameterCountMismatch {
            member: "App.Strict.Handle(Object)".to_string(),
            expected: 1,
            found: 2,
        }
    );
}

#[test]
fn reverse_members_are_rejected_in_forward_contracts() {
    let store = Arc::new(TypeStore::new());
    let contract = store.define(
        TypeBuilder::interface("App.IHook")
            .method(abstract_member("Fire").annotate(reverse())),
    );
    let target = store.define(
        TypeBuilder::class("Lib.Hook").method(MethodBuilder::new("Fire").body(|_| Ok(Value::Null))),
    );
    let ctx = GenerationContext::new(store);
    let err = ctx
        .create(&TypeRef::of(contract), &Value::object(TypeRef::of(target), ()))
        .unwrap_err();
    assert!(matches!(err, DuckError::IncorrectReverseMethodUsage { .. }), "{err:?}");
}

#[test]
fn sealed_bases_cannot_be_reversed() {
    let store = Arc::new(TypeStore::new());
    let sealed = store.define(TypeBuilder::class("Lib.Final").flags(TypeFlags::SEALED));
    let implementation = store.define(TypeBuilder::class("App.Impl"));
    let ctx = GenerationContext::new(store);
    let err = ctx
        .resolve(&TypeRef::of(sealed), &TypeRef::of(implementation), ProxyMode::Reverse)
        .unwrap_err();
    assert!(matches!(err, DuckError::InvalidContract { .. }), "{err:?}");
}
