//! Test helpers
//!
//! Builds the small shape hierarchy most scenarios dispatch against and
//! provides typed extractors for results.

use std::collections::BTreeMap;

use klaso_core::{BinaryOp, ClassRegistry, ClassRequest, Expr, Value};

/// Registry with:
/// - `shape`: fields `size` (default 1, mutable), `id` (default 0,
///   immutable); methods `area` -> size, `scale(factor)` -> size = size * factor
/// - `square`: subclass of `shape`; overrides `area` -> size * size;
///   adds `perimeter` -> 4 * size
pub fn shape_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .define(
            ClassRequest::new("shape")
                .field("size", Expr::int(1), true)
                .field("id", Expr::int(0), false)
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
        .expect("shape definition is valid");
    registry
        .define(
            ClassRequest::new("square")
                .with_parent("shape")
                .override_method(
                    "area",
                    &[],
                    Expr::binary(BinaryOp::Mul, Expr::field("size"), Expr::field("size")),
                )
                .method(
                    "perimeter",
                    &[],
                    Expr::binary(BinaryOp::Mul, Expr::int(4), Expr::field("size")),
                ),
        )
        .expect("square definition is valid");
    registry
}

/// Field inits map from int literals
pub fn inits(pairs: &[(&str, i64)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(name, n)| (name.to_string(), Value::Int(*n)))
        .collect()
}

pub fn get_int(value: &Value) -> Option<i64> {
    value.as_int()
}
