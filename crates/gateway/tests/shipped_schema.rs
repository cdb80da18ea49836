//! The schema file shipped at `schema/nodetypes.cnd` boots a fresh store.

use std::path::PathBuf;

use ng_bridge::{GatewaySettings, SchemaSource, SessionGateway};
use ng_domain::config::Config;
use ng_gateway::bootstrap;

fn shipped_config() -> Config {
    let mut config = Config::default();
    config.schema.cnd_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../schema/nodetypes.cnd");
    config.repository.password_env = "NG_TEST_SHIPPED_PASSWORD_UNSET".into();
    config
}

#[test]
fn shipped_schema_parses_and_names_the_root_type() {
    let config = shipped_config();
    let source = bootstrap::load_schema(&config).unwrap();
    let doc = ng_cnd::parse_cnd(&source.text).unwrap();
    assert!(doc.node_type("ecmnt:document").is_some());
    assert_eq!(doc.namespaces.get("dc").map(String::as_str), Some("http://purl.org/dc/elements/1.1/"));
}

#[test]
fn shipped_schema_registers_on_a_fresh_store() {
    let config = shipped_config();
    let source: SchemaSource = bootstrap::load_schema(&config).unwrap();
    let repo = bootstrap::build_repository(&config).unwrap();
    let settings = GatewaySettings::from_config(&config);

    let mut gw = SessionGateway::open(&repo, &settings, &source, "default").unwrap();
    let exported = ng_cnd::parse_cnd(&gw.schema_text().unwrap()).unwrap();
    for name in ["ecmnt:folder", "ecmst:tripreport", "ecmdt:note", "ecmdt:tripreport"] {
        assert!(exported.node_type(name).is_some(), "{name} missing");
    }

    let s = gw.session_mut();
    let root = s.root();
    let note = s.add_node(root, "welcome", "ecmdt:note").unwrap();
    s.set_property(note, "dc:title", "Welcome", ng_repository::PropertyType::String)
        .unwrap();
    s.save().unwrap();
    let note_id = s.identifier(note).unwrap();
    assert_eq!(gw.type_of(&note_id).unwrap(), "ecmdt:note");
}
