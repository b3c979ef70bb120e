//! Klaso Core - Static object-model compiler (pure logic, no IO)
//!
//! Turns declarative class requests (fields, methods, single inheritance,
//! method overriding, per-instance ad hoc overriding) into a flat runtime
//! representation: fixed-layout instances plus shared dispatch tables.
//! Only operates on in-memory data structures, no file IO or terminal output.
//!
//! Configuration is passed explicitly via parameters, not via global state.

pub mod compiler;
pub mod error;
pub mod model;
pub mod runtime;

// Re-export common types
pub use error::{DefinitionError, ModelError, RuntimeError};
pub use model::decl::{ClassRequest, FieldDecl, MethodDecl, OverrideDecl, Visibility};
pub use model::expr::{BinaryOp, Expr, UnaryOp};
pub use model::value::Value;
pub use runtime::descriptor::{ClassDescriptor, FieldAccessor, FieldMutator};
pub use runtime::dispatch::{bind, invoke, resolve_slot, BoundSlot};
pub use runtime::instance::{construct, construct_with_overrides, Instance};
pub use runtime::registry::ClassRegistry;

// Re-export config types from klaso-config
pub use klaso_config::{EvalConfig, LimitConfig, ModelConfig};
