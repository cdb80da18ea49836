use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sentinel node
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The fixed node created under root to smoke-test versioning and typed
/// properties on the live store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default = "d_node_name")]
    pub node_name: String,
    #[serde(default = "d_string_property")]
    pub string_property: String,
    #[serde(default = "d_string_value")]
    pub string_value: String,
    #[serde(default = "d_boolean_property")]
    pub boolean_property: String,
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            node_name: d_node_name(),
            string_property: d_string_property(),
            string_value: d_string_value(),
            boolean_property: d_boolean_property(),
        }
    }
}

fn d_node_name() -> String {
    "toto".into()
}
fn d_string_property() -> String {
    "foo".into()
}
fn d_string_value() -> String {
    "hello bob".into()
}
fn d_boolean_property() -> String {
    "bool".into()
}
