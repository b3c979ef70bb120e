//! Definition-time pipeline: layout resolution, body compilation, vtable
//! assembly
//!
//! Consumes normalized `ClassRequest`s and produces the immutable runtime
//! representation. All "fail as early as possible" checks live here.

pub mod codegen;
pub mod resolve;
pub mod vtable;

pub use codegen::{MethodContext, PrivateSig};
pub use resolve::{resolve, ResolvedClass};
