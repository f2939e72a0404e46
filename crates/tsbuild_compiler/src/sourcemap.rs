//! Source map documents (revision 3) attached to emitted files.

use serde::{Deserialize, Serialize};

use crate::error::CompileError;

/// A parsed source map.
///
/// While attached to an [`EmittedFile`](crate::EmittedFile), `sources` hold
/// absolute paths; the map-writing stage rewrites them for the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Format revision, always 3.
    pub version: u32,
    /// Name of the generated file this map describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Prefix applied to every entry of `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    /// Original source files.
    pub sources: Vec<String>,
    /// Embedded original contents, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names referenced by `mappings`.
    #[serde(default)]
    pub names: Vec<String>,
    /// VLQ-encoded mapping segments.
    pub mappings: String,
}

impl SourceMap {
    /// Parses a map from JSON text.
    pub fn parse(path: &std::path::Path, text: &str) -> Result<Self, CompileError> {
        serde_json::from_str(text)
            .map_err(|e| CompileError::config(path, format!("malformed source map: {e}")))
    }

    /// Serializes the map as compact JSON.
    pub fn to_json(&self) -> String {
        // Every field is a plain string, number or list; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}
