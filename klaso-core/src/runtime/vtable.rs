//! VTables and compiled methods
//!
//! A `VTable` is the ordered dispatch table of a class: one
//! `Arc<CompiledMethod>` per slot, positionally aligned across the whole
//! hierarchy. Published vtables are immutable; ad hoc construction builds a
//! fresh table and never touches the shared one.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::chunk::Chunk;

/// One compiled method implementation
///
/// Shared by `Arc` between a class and every descendant that does not
/// override it, and between a shared vtable and ad hoc clones.
#[derive(Debug)]
pub struct CompiledMethod {
    name: String,
    /// Class whose request supplied this body (differs from the slot's
    /// defining class after an override)
    implemented_in: String,
    params: Vec<String>,
    chunk: Chunk,
    /// Declared without a body; fails only when actually called
    placeholder: bool,
    /// Private table of `implemented_in`, late-bound so methods of one
    /// class can reference each other regardless of declaration order
    privates: PrivateTable,
}

impl CompiledMethod {
    pub(crate) fn new(
        name: String,
        implemented_in: String,
        params: Vec<String>,
        chunk: Chunk,
        privates: PrivateTable,
    ) -> Self {
        Self {
            name,
            implemented_in,
            params,
            chunk,
            placeholder: false,
            privates,
        }
    }

    pub(crate) fn placeholder(name: String, implemented_in: String, params: Vec<String>) -> Self {
        Self {
            name,
            implemented_in,
            params,
            chunk: Chunk::new(),
            placeholder: true,
            privates: PrivateTable::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn implemented_in(&self) -> &str {
        &self.implemented_in
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub(crate) fn chunk(&self) -> &Chunk {
        &self.chunk
    }

    pub(crate) fn private(&self, index: usize) -> Option<&Arc<CompiledMethod>> {
        self.privates.get(index)
    }
}

/// Late-bound private method table of one class
///
/// Created empty before the class's bodies are compiled, sealed exactly
/// once after all of them are. Every method compiled for the class holds a
/// handle, so a parent method inherited by a subclass keeps resolving its
/// `CallPrivate` ops against the parent's table.
#[derive(Debug, Clone, Default)]
pub struct PrivateTable(Arc<OnceCell<Vec<Arc<CompiledMethod>>>>);

impl PrivateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the compiled private methods; must be called at most once
    pub(crate) fn seal(&self, methods: Vec<Arc<CompiledMethod>>) {
        let sealed = self.0.set(methods).is_ok();
        debug_assert!(sealed, "private table sealed twice");
    }

    fn get(&self, index: usize) -> Option<&Arc<CompiledMethod>> {
        self.0.get().and_then(|methods| methods.get(index))
    }
}

/// The ordered dispatch table of a class
#[derive(Debug)]
pub struct VTable {
    class_name: String,
    slots: Vec<Arc<CompiledMethod>>,
}

impl VTable {
    pub(crate) fn new(class_name: String, slots: Vec<Arc<CompiledMethod>>) -> Self {
        Self { class_name, slots }
    }

    /// Class this table was built for (the instance's own class for ad hoc
    /// clones as well)
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Option<&Arc<CompiledMethod>> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[Arc<CompiledMethod>] {
        &self.slots
    }

    /// Clone the slot vector for an ad hoc table
    pub(crate) fn cloned_slots(&self) -> Vec<Arc<CompiledMethod>> {
        self.slots.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_has_no_code() {
        let m = CompiledMethod::placeholder("draw".into(), "shape".into(), vec![]);
        assert!(m.is_placeholder());
        assert!(m.chunk().ops().is_empty());
        assert_eq!(m.arity(), 0);
    }

    #[test]
    fn test_private_table_unsealed_resolves_nothing() {
        let table = PrivateTable::new();
        assert!(table.get(0).is_none());

        let helper = Arc::new(CompiledMethod::placeholder(
            "helper".into(),
            "shape".into(),
            vec![],
        ));
        table.seal(vec![helper]);
        assert_eq!(table.get(0).unwrap().name(), "helper");
        assert!(table.get(1).is_none());
    }
}
