//! Definition-time behavior
//!
//! Everything the pipeline must reject at class definition or
//! construction, plus hierarchy-shape properties that only show up past
//! two levels.

mod common;

use common::{get_int, inits, shape_registry};
use klaso_core::{
    construct, invoke, BinaryOp, ClassRegistry, ClassRequest, DefinitionError, Expr, Value,
    Visibility,
};

// ===== Error taxonomy =====

#[test]
fn test_unknown_base_class() {
    let mut registry = ClassRegistry::new();
    assert_eq!(
        registry
            .define(ClassRequest::new("square").with_parent("shape"))
            .unwrap_err(),
        DefinitionError::UnknownBaseClass("shape".into())
    );
}

#[test]
fn test_override_of_nonexistent_slot_never_introduces_a_method() {
    let mut registry = shape_registry();
    let err = registry
        .define(
            ClassRequest::new("circle")
                .with_parent("shape")
                .override_method("circumference", &[], Expr::int(0)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::NoSuchMethod {
            class: "circle".into(),
            method: "circumference".into()
        }
    );
    assert!(!registry.contains("circle"));
}

#[test]
fn test_construction_with_unknown_field() {
    let registry = shape_registry();
    let shape = registry.get("shape").unwrap();
    let err = construct(&shape, &inits(&[("volume", 1)])).unwrap_err();
    assert_eq!(
        err.as_definition(),
        Some(&DefinitionError::UnknownField {
            class: "shape".into(),
            field: "volume".into()
        })
    );
}

#[test]
fn test_invoking_unknown_method() {
    let registry = shape_registry();
    let shape = registry.get("shape").unwrap();
    let mut instance = construct(&shape, &inits(&[])).unwrap();
    let err = invoke(&shape, &mut instance, "volume", &[]).unwrap_err();
    assert_eq!(
        err.as_definition(),
        Some(&DefinitionError::NoSuchMethod {
            class: "shape".into(),
            method: "volume".into()
        })
    );
}

#[test]
fn test_invoke_arity_is_checked_at_resolution() {
    let registry = shape_registry();
    let shape = registry.get("shape").unwrap();
    let mut instance = construct(&shape, &inits(&[])).unwrap();
    let err = invoke(&shape, &mut instance, "scale", &[]).unwrap_err();
    assert_eq!(
        err.as_definition(),
        Some(&DefinitionError::ArityMismatch {
            method: "scale".into(),
            expected: 1,
            found: 0
        })
    );
}

#[test]
fn test_subclass_redeclaring_ancestor_field_rejected() {
    let mut registry = shape_registry();
    let err = registry
        .define(
            ClassRequest::new("tile")
                .with_parent("shape")
                .field("size", Expr::int(2), true),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DuplicateField {
            class: "tile".into(),
            field: "size".into()
        }
    );
}

#[test]
fn test_plain_method_reusing_inherited_slot_name_rejected() {
    // Overriding must be explicit via an override declaration
    let mut registry = shape_registry();
    let err = registry
        .define(
            ClassRequest::new("tile")
                .with_parent("shape")
                .method("area", &[], Expr::int(0)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DuplicateMethod {
            class: "tile".into(),
            method: "area".into()
        }
    );
}

#[test]
fn test_override_arity_must_match_slot() {
    let mut registry = shape_registry();
    let err = registry
        .define(
            ClassRequest::new("tile")
                .with_parent("shape")
                .override_method("scale", &["a", "b"], Expr::int(0)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::ArityMismatch {
            method: "scale".into(),
            expected: 1,
            found: 2
        }
    );
}

// ===== Initializers =====

#[test]
fn test_initializers_are_evaluated_per_instantiation() {
    let mut registry = ClassRegistry::new();
    let counter = registry
        .define(ClassRequest::new("counter").field(
            "value",
            Expr::binary(BinaryOp::Mul, Expr::int(3), Expr::int(7)),
            true,
        ))
        .unwrap();

    let a = construct(&counter, &inits(&[])).unwrap();
    let mut b = construct(&counter, &inits(&[])).unwrap();
    assert_eq!(a.get("value").unwrap(), Value::Int(21));
    // Mutating one instance never leaks into another's defaults
    b.set("value", Value::Int(0)).unwrap();
    let c = construct(&counter, &inits(&[])).unwrap();
    assert_eq!(c.get("value").unwrap(), Value::Int(21));
}

#[test]
fn test_initializer_may_not_observe_sibling_fields() {
    let mut registry = ClassRegistry::new();
    let err = registry
        .define(
            ClassRequest::new("pair")
                .field("first", Expr::int(1), false)
                .field("second", Expr::field("first"), false),
        )
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::InvalidInitializer {
            field: "second".into()
        }
    );
}

#[test]
fn test_missing_initializer_defaults_to_null() {
    let mut registry = ClassRegistry::new();
    let mut request = ClassRequest::new("node");
    request.fields.push(klaso_core::FieldDecl {
        name: "label".into(),
        default: None,
        mutable: false,
    });
    let node = registry.define(request).unwrap();
    let instance = construct(&node, &inits(&[])).unwrap();
    assert_eq!(instance.get("label").unwrap(), Value::Null);
}

// ===== Private methods =====

#[test]
fn test_private_methods_invisible_to_dispatch() {
    let mut registry = ClassRegistry::new();
    let robot = registry
        .define(
            ClassRequest::new("robot")
                .field("charge", Expr::int(10), true)
                .private_method("drain", &["amount"], Expr::assign(
                    "charge",
                    Expr::binary(BinaryOp::Sub, Expr::field("charge"), Expr::param("amount")),
                ))
                .method("step", &[], Expr::call("drain", vec![Expr::int(2)])),
        )
        .unwrap();

    let mut instance = construct(&robot, &inits(&[])).unwrap();
    // Public path reaches the private helper
    invoke(&robot, &mut instance, "step", &[]).unwrap();
    assert_eq!(instance.get("charge").unwrap(), Value::Int(8));

    // The dispatch surface treats the private name as absent
    let err = invoke(&robot, &mut instance, "drain", &[Value::Int(1)]).unwrap_err();
    assert_eq!(
        err.as_definition(),
        Some(&DefinitionError::NoSuchMethod {
            class: "robot".into(),
            method: "drain".into()
        })
    );
    assert!(matches!(
        klaso_core::bind(&robot, "drain").unwrap_err(),
        DefinitionError::NoSuchMethod { .. }
    ));
}

#[test]
fn test_inherited_method_keeps_its_own_private_helpers() {
    let mut registry = ClassRegistry::new();
    registry
        .define(
            ClassRequest::new("base")
                .field("n", Expr::int(5), false)
                .private_method("twice", &[], Expr::binary(
                    BinaryOp::Mul,
                    Expr::int(2),
                    Expr::field("n"),
                ))
                .method("compute", &[], Expr::call("twice", vec![])),
        )
        .unwrap();
    let derived = registry
        .define(ClassRequest::new("derived").with_parent("base"))
        .unwrap();

    // `compute` is shared byte-identically with `base`, and its private
    // helper still resolves against base's table
    let mut instance = construct(&derived, &inits(&[])).unwrap();
    let result = invoke(&derived, &mut instance, "compute", &[]).unwrap();
    assert_eq!(get_int(&result), Some(10));
}

// ===== Deep hierarchies =====

#[test]
fn test_three_level_layout_and_slots() {
    let mut registry = shape_registry();
    let cube = registry
        .define(
            ClassRequest::new("cube")
                .with_parent("square")
                .field("depth", Expr::int(1), true)
                .override_method(
                    "area",
                    &[],
                    Expr::binary(
                        BinaryOp::Mul,
                        Expr::int(6),
                        Expr::binary(BinaryOp::Mul, Expr::field("size"), Expr::field("size")),
                    ),
                ),
        )
        .unwrap();

    // Field layout strictly extends the parent's
    let names: Vec<&str> = cube.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["size", "id", "depth"]);
    let defined: Vec<&str> = cube.fields().iter().map(|f| f.defined_in.as_str()).collect();
    assert_eq!(defined, vec!["shape", "shape", "cube"]);

    // The twice-overridden slot never moved
    assert_eq!(klaso_core::resolve_slot(&cube, "area").unwrap(), 0);

    let shape = registry.get("shape").unwrap();
    let mut instance = construct(&cube, &inits(&[("size", 2)])).unwrap();
    let area = invoke(&shape, &mut instance, "area", &[]).unwrap();
    assert_eq!(get_int(&area), Some(24));
}

// ===== Class metadata =====

#[test]
fn test_properties_are_carried_but_not_dispatched() {
    let mut registry = ClassRegistry::new();
    let tagged = registry
        .define(
            ClassRequest::new("tagged")
                .property("display", Value::Str("fancy".into()))
                .method("noop", &[], Expr::int(0)),
        )
        .unwrap();
    assert_eq!(tagged.property("display"), Some(&Value::Str("fancy".into())));
    assert_eq!(tagged.property("missing"), None);
    // Properties take no slots
    assert_eq!(tagged.slots().len(), 1);
}

#[test]
fn test_private_and_public_cannot_share_a_name() {
    let mut registry = ClassRegistry::new();
    let mut request = ClassRequest::new("clash");
    request.methods.push(klaso_core::MethodDecl {
        name: "go".into(),
        params: vec![],
        visibility: Visibility::Private,
        body: Some(Expr::int(1)),
    });
    request.methods.push(klaso_core::MethodDecl {
        name: "go".into(),
        params: vec![],
        visibility: Visibility::Public,
        body: Some(Expr::int(2)),
    });
    assert_eq!(
        registry.define(request).unwrap_err(),
        DefinitionError::DuplicateMethod {
            class: "clash".into(),
            method: "go".into()
        }
    );
}
