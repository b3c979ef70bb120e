//! Shapes Demo - building and using a small class hierarchy
//!
//! Run: cargo run --example shapes -p klaso-api

use std::collections::BTreeMap;

use klaso_api::{BinaryOp, ClassRequest, Expr, ObjectModel, OverrideDecl, Value};

fn main() {
    println!("=== Klaso Shapes Demo ===\n");

    let mut model = ObjectModel::new();

    // 1. Publish a base class with one mutable field and two methods
    model
        .define(
            ClassRequest::new("shape")
                .field("size", Expr::int(1), true)
                .method("area", &[], Expr::field("size"))
                .method(
                    "scale",
                    &["factor"],
                    Expr::assign(
                        "size",
                        Expr::binary(BinaryOp::Mul, Expr::field("size"), Expr::param("factor")),
                    ),
                ),
        )
        .unwrap();

    // 2. A subclass that overrides area
    model
        .define(ClassRequest::new("square").with_parent("shape").override_method(
            "area",
            &[],
            Expr::binary(BinaryOp::Mul, Expr::field("size"), Expr::field("size")),
        ))
        .unwrap();

    println!("Published classes: shape, square");

    // 3. Construct and dispatch
    let mut inits = BTreeMap::new();
    inits.insert("size".to_string(), Value::Int(3));
    let mut sq = model.construct("square", &inits).unwrap();

    let area = model.invoke("square", &mut sq, "area", &[]).unwrap();
    println!("square(size=3).area() = {area}");

    model
        .invoke("square", &mut sq, "scale", &[Value::Int(2)])
        .unwrap();
    let area = model.invoke("square", &mut sq, "area", &[]).unwrap();
    println!("after scale(2), area() = {area}");

    // 4. Ad hoc override on one instance only
    let adhoc = vec![OverrideDecl {
        name: "area".to_string(),
        params: vec![],
        body: Expr::int(0),
    }];
    let mut flat = model
        .construct_with_overrides("square", &inits, &adhoc)
        .unwrap();
    let area = model.invoke("square", &mut flat, "area", &[]).unwrap();
    println!("ad hoc instance area() = {area}");

    println!("\n=== Demo complete ===");
}
