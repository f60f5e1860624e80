use super::*;

#[test]
fn overridable_requires_virtual_or_abstract() {
    assert!(MethodFlags::VIRTUAL.is_overridable());
    assert!(MethodFlags::ABSTRACT.is_overridable());
    assert!(!MethodFlags::empty().is_overridable());
    assert!(!MethodFlags::STATIC.is_overridable());
}

#[test]
fn final_blocks_override() {
    let sealed_override = MethodFlags::VIRTUAL | MethodFlags::FINAL;
    assert!(!sealed_override.is_overridable());
}

#[test]
fn default_scope_is_everything() {
    let scope = BindingScope::default();
    assert!(scope.contains(BindingScope::INSTANCE | BindingScope::STATIC));
    assert!(scope.contains(BindingScope::PUBLIC | BindingScope::NON_PUBLIC));
}
