//! Module documents
//!
//! A module is the JSON carrier for a batch of normalized class requests:
//! an object with a `classes` array, defined in document order (parents
//! before children, since a parent must be published first).

use serde::{Deserialize, Serialize};

use klaso_core::ClassRequest;

/// One loadable module document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDoc {
    /// Optional module name, for diagnostics only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub classes: Vec<ClassRequest>,
}

impl ModuleDoc {
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
