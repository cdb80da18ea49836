use ng_repository::{Credentials, MemoryRepository, PropertyType, Repository, Session, StoreError};

fn repo() -> MemoryRepository {
    MemoryRepository::new(["default", "other"]).unwrap()
}

fn login(repo: &MemoryRepository, workspace: &str) -> Box<dyn Session> {
    repo.login(&Credentials::new("svc", "pw"), workspace).unwrap()
}

// ── Transient vs saved visibility ───────────────────────────────────

#[test]
fn edits_are_private_until_save() {
    let repo = repo();
    let mut writer = login(&repo, "default");
    let reader = login(&repo, "default");

    let root = writer.root();
    writer.add_node(root, "doc", "nt:unstructured").unwrap();
    assert!(writer.has_pending_changes());
    assert!(writer.child(root, "doc").unwrap().is_some());
    assert!(reader.child(reader.root(), "doc").unwrap().is_none());

    writer.save().unwrap();
    assert!(!writer.has_pending_changes());
    assert!(reader.child(reader.root(), "doc").unwrap().is_some());
}

#[test]
fn refresh_with_discard_drops_edits() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let doc = s.add_node(root, "doc", "nt:unstructured").unwrap();
    s.refresh(true);
    assert!(!s.has_pending_changes());
    assert!(s.child(root, "doc").unwrap().is_none());
    assert!(matches!(s.name(doc), Err(StoreError::ItemNotFound(_))));
}

#[test]
fn workspaces_are_separate_but_share_types() {
    let repo = repo();
    let mut a = login(&repo, "default");
    let b = login(&repo, "other");

    let root = a.root();
    a.add_node(root, "only-here", "nt:folder").unwrap();
    a.save().unwrap();
    assert!(b.child(b.root(), "only-here").unwrap().is_none());

    a.register_namespace("ex", "urn:example").unwrap();
    let mut def = ng_cnd::NodeTypeDef::new("ex:doc");
    def.supertypes = vec!["nt:base".into()];
    a.register_node_types(&[def]).unwrap();
    assert!(b.node_type_exists("ex:doc"));
    assert_eq!(b.namespaces().get("ex").map(String::as_str), Some("urn:example"));
}

// ── Concurrent saves ────────────────────────────────────────────────

#[test]
fn save_over_a_newer_workspace_is_refused() {
    let repo = repo();
    let mut first = login(&repo, "default");
    let mut second = login(&repo, "default");
    let root = first.root();

    first.add_node(root, "a", "nt:unstructured").unwrap();
    second.add_node(root, "b", "nt:unstructured").unwrap();
    first.save().unwrap();

    assert!(matches!(second.save(), Err(StoreError::InvalidState(_))));
    assert!(second.has_pending_changes());

    let reader = login(&repo, "default");
    assert!(reader.child(root, "a").unwrap().is_some());
    assert!(reader.child(root, "b").unwrap().is_none());

    second.refresh(true);
    assert!(second.child(root, "a").unwrap().is_some());
    second.add_node(root, "b", "nt:unstructured").unwrap();
    second.save().unwrap();

    let reader = login(&repo, "default");
    let names: Vec<String> = reader
        .children(root)
        .unwrap()
        .into_iter()
        .map(|c| reader.name(c).unwrap())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn property_saved_by_one_session_survives_the_other() {
    let repo = repo();
    let mut first = login(&repo, "default");
    let mut second = login(&repo, "default");
    let root = first.root();

    first.set_property(root, "owner", "first", PropertyType::String).unwrap();
    second.set_property(root, "owner", "second", PropertyType::String).unwrap();
    first.save().unwrap();
    assert!(second.save().is_err());

    let reader = login(&repo, "default");
    assert_eq!(reader.property_value(root, "owner").unwrap(), "first");
}

#[test]
fn checkin_elsewhere_invalidates_a_working_copy() {
    let repo = repo();
    let mut owner = login(&repo, "default");
    let root = owner.root();
    let n = owner.add_node(root, "v", "nt:unstructured").unwrap();
    owner.add_mixin(n, "mix:versionable").unwrap();
    owner.save().unwrap();

    let mut editor = login(&repo, "default");
    editor.set_property(n, "foo", "x", PropertyType::String).unwrap();
    owner.checkin(n).unwrap();

    assert!(matches!(editor.save(), Err(StoreError::InvalidState(_))));
    editor.refresh(true);
    assert!(matches!(
        editor.set_property(n, "foo", "x", PropertyType::String),
        Err(StoreError::Version(_))
    ));
}

#[test]
fn own_checkout_keeps_the_working_copy_current() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let n = s.add_node(root, "v", "nt:unstructured").unwrap();
    s.add_mixin(n, "mix:versionable").unwrap();
    s.save().unwrap();
    s.checkin(n).unwrap();

    s.set_property(root, "note", "pending", PropertyType::String).unwrap();
    s.checkout(n).unwrap();
    s.set_property(n, "foo", "x", PropertyType::String).unwrap();
    s.save().unwrap();

    let reader = login(&repo, "default");
    assert_eq!(reader.property_value(n, "foo").unwrap(), "x");
    assert_eq!(reader.property_value(root, "note").unwrap(), "pending");
}

#[test]
fn root_identifier_is_stable_across_sessions() {
    let repo = repo();
    let first = login(&repo, "default");
    let second = login(&repo, "default");
    let id = first.identifier(first.root()).unwrap();
    assert_eq!(second.identifier(second.root()).unwrap(), id);
    assert_eq!(second.node_by_identifier(&id).unwrap(), second.root());
    assert_ne!(login(&repo, "other").identifier(first.root()).unwrap(), id);
}

// ── Versioning ──────────────────────────────────────────────────────

#[test]
fn checkin_checkout_cycle() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let n = s.add_node(root, "v", "nt:unstructured").unwrap();
    s.add_mixin(n, "mix:versionable").unwrap();

    assert!(matches!(s.checkin(n), Err(StoreError::InvalidState(_))));
    s.save().unwrap();

    assert_eq!(s.checkin(n).unwrap(), "1.0");
    assert!(!s.is_checked_out(n).unwrap());
    assert!(matches!(
        s.set_property(n, "foo", "x", PropertyType::String),
        Err(StoreError::Version(_))
    ));
    assert!(matches!(s.checkin(n), Err(StoreError::Version(_))));

    s.checkout(n).unwrap();
    s.set_property(n, "foo", "x", PropertyType::String).unwrap();
    s.save().unwrap();
    assert_eq!(s.checkin(n).unwrap(), "1.1");
    assert_eq!(s.version_history(n).unwrap(), vec!["1.0", "1.1"]);
}

#[test]
fn checkin_is_visible_to_other_sessions() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let n = s.add_node(root, "v", "nt:unstructured").unwrap();
    s.add_mixin(n, "mix:versionable").unwrap();
    s.save().unwrap();
    let id = s.identifier(n).unwrap();
    s.checkin(n).unwrap();

    let other = login(&repo, "default");
    let seen = other.node_by_identifier(&id).unwrap();
    assert!(!other.is_checked_out(seen).unwrap());
    assert_eq!(other.property_value(seen, "jcr:isCheckedOut").unwrap(), "false");
}

#[test]
fn checkin_requires_versionable() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    assert!(matches!(s.checkin(root), Err(StoreError::Version(_))));
    assert!(s.is_checked_out(root).unwrap());
}

// ── Values ──────────────────────────────────────────────────────────

#[test]
fn values_are_stored_canonically() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    s.set_property(root, "n", "42", PropertyType::Long).unwrap();
    s.set_property(root, "d", "42", PropertyType::Double).unwrap();
    s.set_property(root, "b", "TRUE", PropertyType::Boolean).unwrap();
    s.set_property(root, "t", "2020-01-02T03:04:05Z", PropertyType::Date)
        .unwrap();

    assert_eq!(s.property_value(root, "n").unwrap(), "42");
    assert_eq!(s.property_value(root, "d").unwrap(), "42.0");
    assert_eq!(s.property_value(root, "b").unwrap(), "true");
    assert_eq!(s.property_value(root, "t").unwrap(), "2020-01-02T03:04:05.000Z");

    let info = s.property(root, "n").unwrap().unwrap();
    assert_eq!(info.property_type, PropertyType::Long);
    assert!(!info.multiple);
}

#[test]
fn bad_values_are_rejected_without_writing() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let err = s
        .set_property(root, "n", "forty-two", PropertyType::Long)
        .unwrap_err();
    assert!(matches!(err, StoreError::ValueFormat(_)));
    assert!(!s.has_pending_changes());
}

#[test]
fn references_must_point_at_referenceable_nodes() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let target = s.add_node(root, "target", "nt:unstructured").unwrap();
    s.add_mixin(target, "mix:referenceable").unwrap();
    let id = s.identifier(target).unwrap();

    s.set_property(root, "link", &id, PropertyType::Reference).unwrap();
    assert!(matches!(
        s.set_property(root, "dangling", "no-such-id", PropertyType::Reference),
        Err(StoreError::ValueFormat(_))
    ));
}

#[test]
fn multi_valued_properties_keep_order() {
    let repo = repo();
    let mut s = login(&repo, "default");
    let root = s.root();
    let values: Vec<String> = ["c", "a", "b"].iter().map(|v| v.to_string()).collect();
    s.set_multi_property(root, "tags", &values, PropertyType::String)
        .unwrap();
    assert_eq!(s.property_values(root, "tags").unwrap(), values);
}

// ── Registries ──────────────────────────────────────────────────────

#[test]
fn duplicate_namespace_prefix_is_reported() {
    let repo = repo();
    let mut s = login(&repo, "default");
    assert_eq!(
        s.register_namespace("nt", "urn:other"),
        Err(StoreError::NamespaceExists("nt".into()))
    );
}

#[test]
fn root_is_rep_root() {
    let repo = repo();
    let s = login(&repo, "default");
    let root = s.root();
    assert_eq!(s.primary_type(root).unwrap(), "rep:root");
    assert_eq!(s.name(root).unwrap(), "");
    assert_eq!(s.parent(root).unwrap(), None);
    assert!(s.is_node_type(root, "nt:base").unwrap());
}
