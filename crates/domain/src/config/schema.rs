use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Schema bootstrap
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Compact node type definition file, read once at startup.
    #[serde(default = "d_cnd_path")]
    pub cnd_path: PathBuf,
    /// Node type whose presence proves the schema is already registered.
    #[serde(default = "d_root_document_type")]
    pub root_document_type: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            cnd_path: d_cnd_path(),
            root_document_type: d_root_document_type(),
        }
    }
}

fn d_cnd_path() -> PathBuf {
    PathBuf::from("./schema/nodetypes.cnd")
}
fn d_root_document_type() -> String {
    "ecmnt:document".into()
}
