//! Runtime representation: descriptors, vtables, instances, dispatch
//!
//! Everything here is the immutable product of the compiler (descriptors,
//! vtables, chunks) or per-construction state (instances). The only
//! mutation after publication is instance field storage.

pub mod chunk;
pub mod descriptor;
pub mod dispatch;
pub mod eval;
pub mod instance;
pub mod registry;
pub mod vtable;

pub use chunk::{Chunk, Op};
pub use descriptor::{ClassDescriptor, FieldAccessor, FieldInfo, FieldMutator, SlotInfo};
pub use dispatch::{bind, invoke, resolve_slot, BoundSlot};
pub use instance::{construct, construct_with_overrides, Instance};
pub use registry::ClassRegistry;
pub use vtable::{CompiledMethod, VTable};
