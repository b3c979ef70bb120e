//! Normalized class request
//!
//! The shape the excluded front end hands to the core: one class's own
//! fields, methods, and overrides, already name-resolved into plain data.
//! The core validates everything again; nothing here is trusted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::value::Value;

/// Method visibility
///
/// Private methods are callable only from bodies of the same class and are
/// invisible to the dispatch surface (`invoke`/`bind`/`override`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// One field the class introduces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    /// Evaluated once per instantiation; may not reference instance state.
    /// `None` defaults the field to `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Expr>,
    /// Whether a mutator is generated for this field
    #[serde(default)]
    pub mutable: bool,
}

/// One method the class introduces (not an override)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    /// `None` makes this a placeholder slot that fails only when called
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Expr>,
}

/// Replacement implementation for a slot some ancestor introduced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    pub body: Expr,
}

/// A complete normalized request to define one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRequest {
    pub name: String,
    /// Single parent; must already be published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub overrides: Vec<OverrideDecl>,
    /// Class-level metadata, e.g. a formatting hint; not part of dispatch
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, Value>,
}

impl ClassRequest {
    /// A request with the given name and no content
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            fields: Vec::new(),
            methods: Vec::new(),
            overrides: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(parent.to_string());
        self
    }

    pub fn field(mut self, name: &str, default: Expr, mutable: bool) -> Self {
        self.fields.push(FieldDecl {
            name: name.to_string(),
            default: Some(default),
            mutable,
        });
        self
    }

    pub fn method(mut self, name: &str, params: &[&str], body: Expr) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            visibility: Visibility::Public,
            body: Some(body),
        });
        self
    }

    pub fn private_method(mut self, name: &str, params: &[&str], body: Expr) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            visibility: Visibility::Private,
            body: Some(body),
        });
        self
    }

    pub fn placeholder_method(mut self, name: &str, params: &[&str]) -> Self {
        self.methods.push(MethodDecl {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            visibility: Visibility::Public,
            body: None,
        });
        self
    }

    pub fn override_method(mut self, name: &str, params: &[&str], body: Expr) -> Self {
        self.overrides.push(OverrideDecl {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            body,
        });
        self
    }

    pub fn property(mut self, key: &str, value: Value) -> Self {
        self.properties.insert(key.to_string(), value);
        self
    }
}
