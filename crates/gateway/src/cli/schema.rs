use std::path::Path;

use ng_bridge::{GatewaySettings, SessionGateway};
use ng_cnd::NodeTypeDef;
use ng_domain::config::Config;

use crate::bootstrap;

/// Parse `path` and print a summary. Returns `false` on a parse error.
pub fn check(path: &Path) -> anyhow::Result<bool> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    match ng_cnd::parse_cnd(&text) {
        Ok(doc) => {
            let mixins = doc.node_types.iter().filter(|d| d.mixin).count();
            println!(
                "{}: {} namespace(s), {} node type(s) ({} mixin)",
                path.display(),
                doc.namespaces.len(),
                doc.node_types.len(),
                mixins,
            );
            for def in &doc.node_types {
                println!("  {}", describe(def));
            }
            Ok(true)
        }
        Err(e) => {
            println!("{}: {e}", path.display());
            Ok(false)
        }
    }
}

fn describe(def: &NodeTypeDef) -> String {
    if def.supertypes.is_empty() {
        def.name.clone()
    } else {
        format!("{} > {}", def.name, def.supertypes.join(", "))
    }
}

/// Boot a throwaway repository with the configured schema and print what
/// the registry reports, exactly as `schema_text` serves it.
pub fn export(config: &Config) -> anyhow::Result<()> {
    let source = bootstrap::load_schema(config)?;
    let repo = bootstrap::build_repository(config)?;
    let settings = GatewaySettings::from_config(config);
    let gateway = SessionGateway::open(
        &repo,
        &settings,
        &source,
        &config.repository.default_workspace,
    )?;
    print!("{}", gateway.schema_text()?);
    Ok(())
}
