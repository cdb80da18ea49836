use ng_domain::config::SentinelConfig;
use ng_domain::error::Result;
use ng_domain::trace::TraceEvent;
use ng_repository::{NodeHandle, PropertyType, Session, StoreError, StoreResult};

use crate::store_error;

const REFERENCEABLE: &str = "mix:referenceable";
const VERSIONABLE: &str = "mix:versionable";
const SENTINEL_TYPE: &str = "nt:unstructured";
/// Runs of the stages before a concurrent writer's conflict is surfaced.
const MAX_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentinelOutcome {
    /// Root and sentinel were already complete.
    Unchanged,
    /// At least one stage wrote to the store.
    Initialized { created: bool, versions: usize },
}

/// Make the root referenceable and the sentinel node complete.
///
/// Each stage checks its own precondition, so a sentinel left half-built by
/// an earlier failure is finished on the next call. When another session
/// wrote the workspace in between, the unsaved edits are dropped and the
/// stages run again against the newer tree. Any other failure discards the
/// session's unsaved edits and surfaces as a schema error.
pub fn ensure_sentinel(
    session: &mut dyn Session,
    config: &SentinelConfig,
) -> Result<SentinelOutcome> {
    let mut attempt = 1;
    let result = loop {
        let result = run_stages(session, config);
        if result.is_err() {
            session.refresh(true);
        }
        match result {
            Err(e) if is_conflict(&e) && attempt < MAX_ATTEMPTS => {
                tracing::debug!(attempt, error = %e, "sentinel raced another session; retrying");
                attempt += 1;
            }
            other => break other,
        }
    };
    let outcome = result.map_err(store_error::schema)?;

    if let SentinelOutcome::Initialized { created, versions } = &outcome {
        TraceEvent::SentinelInitialized {
            workspace: session.workspace().to_string(),
            node_name: config.node_name.clone(),
            created: *created,
            versions: *versions,
        }
        .emit();
    }
    Ok(outcome)
}

/// Errors a concurrent writer can cause between a stage's check and its write.
fn is_conflict(e: &StoreError) -> bool {
    matches!(e, StoreError::InvalidState(_) | StoreError::Version(_))
}

fn run_stages(session: &mut dyn Session, config: &SentinelConfig) -> StoreResult<SentinelOutcome> {
    let root = session.root();
    let mut changed = false;

    if !session.is_node_type(root, REFERENCEABLE)? {
        session.add_mixin(root, REFERENCEABLE)?;
        session.save()?;
        tracing::debug!("root made referenceable");
        changed = true;
    }

    let (node, created) = match session.child(root, &config.node_name)? {
        Some(node) => (node, false),
        None => (create(session, root, config)?, true),
    };
    if !created {
        changed |= repair(session, node, config)?;
    }

    if session.property(node, &config.boolean_property)?.is_none() {
        session.checkout(node)?;
        session.set_property(node, &config.boolean_property, "true", PropertyType::Boolean)?;
        session.save()?;
        session.checkin(node)?;
        changed = true;
    }

    if !changed {
        return Ok(SentinelOutcome::Unchanged);
    }
    Ok(SentinelOutcome::Initialized {
        created,
        versions: session.version_history(node)?.len(),
    })
}

fn create(
    session: &mut dyn Session,
    root: NodeHandle,
    config: &SentinelConfig,
) -> StoreResult<NodeHandle> {
    let node = session.add_node(root, &config.node_name, SENTINEL_TYPE)?;
    session.add_mixin(node, VERSIONABLE)?;
    session.save()?;
    session.checkin(node)?;

    session.checkout(node)?;
    session.set_property(
        node,
        &config.string_property,
        &config.string_value,
        PropertyType::String,
    )?;
    session.save()?;
    session.checkin(node)?;

    tracing::info!(node = %config.node_name, "sentinel node created");
    Ok(node)
}

/// Finish a sentinel that an interrupted earlier run left behind.
fn repair(session: &mut dyn Session, node: NodeHandle, config: &SentinelConfig) -> StoreResult<bool> {
    let mut changed = false;

    if !session.is_node_type(node, VERSIONABLE)? {
        session.add_mixin(node, VERSIONABLE)?;
        session.save()?;
        changed = true;
    }

    if session.property(node, &config.string_property)?.is_none() {
        session.checkout(node)?;
        session.set_property(
            node,
            &config.string_property,
            &config.string_value,
            PropertyType::String,
        )?;
        session.save()?;
        session.checkin(node)?;
        changed = true;
    } else if session.is_checked_out(node)? {
        session.checkin(node)?;
        changed = true;
    }

    if changed {
        let mixins = session.mixin_types(node)?;
        tracing::warn!(node = %config.node_name, ?mixins, "repaired incomplete sentinel node");
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_repository::{Credentials, MemoryRepository, Repository};

    fn session() -> Box<dyn Session> {
        MemoryRepository::new(["default"])
            .unwrap()
            .login(&Credentials::new("u", "p"), "default")
            .unwrap()
    }

    fn sentinel(s: &dyn Session) -> NodeHandle {
        s.child(s.root(), "toto").unwrap().unwrap()
    }

    #[test]
    fn fresh_store_gets_full_sentinel() {
        let mut s = session();
        let config = SentinelConfig::default();
        let outcome = ensure_sentinel(s.as_mut(), &config).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: true,
                versions: 3
            }
        );

        let node = sentinel(s.as_ref());
        assert!(s.identifier(s.root()).is_ok());
        assert_eq!(s.property_value(node, "foo").unwrap(), "hello bob");
        assert_eq!(s.property_value(node, "bool").unwrap(), "true");
        let bool_info = s.property(node, "bool").unwrap().unwrap();
        assert_eq!(bool_info.property_type, PropertyType::Boolean);
        assert!(!s.is_checked_out(node).unwrap());
        assert!(!s.has_pending_changes());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let mut s = session();
        let config = SentinelConfig::default();
        ensure_sentinel(s.as_mut(), &config).unwrap();
        let node = sentinel(s.as_ref());
        let versions = s.version_history(node).unwrap();

        let outcome = ensure_sentinel(s.as_mut(), &config).unwrap();
        assert_eq!(outcome, SentinelOutcome::Unchanged);
        assert_eq!(s.version_history(node).unwrap(), versions);
    }

    #[test]
    fn missing_boolean_property_is_added() {
        let mut s = session();
        let root = s.root();
        let node = s.add_node(root, "toto", SENTINEL_TYPE).unwrap();
        s.add_mixin(node, VERSIONABLE).unwrap();
        s.set_property(node, "foo", "hello bob", PropertyType::String)
            .unwrap();
        s.save().unwrap();
        s.checkin(node).unwrap();

        let outcome = ensure_sentinel(s.as_mut(), &SentinelConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: false,
                versions: 2
            }
        );
        assert_eq!(s.property_value(node, "bool").unwrap(), "true");
    }

    fn bare_sentinel(s: &mut dyn Session, versionable: bool) -> NodeHandle {
        let root = s.root();
        let node = s.add_node(root, "toto", SENTINEL_TYPE).unwrap();
        if versionable {
            s.add_mixin(node, VERSIONABLE).unwrap();
        }
        s.save().unwrap();
        node
    }

    fn assert_complete(s: &dyn Session, node: NodeHandle) {
        assert_eq!(s.property_value(node, "foo").unwrap(), "hello bob");
        assert_eq!(s.property_value(node, "bool").unwrap(), "true");
        assert!(!s.is_checked_out(node).unwrap());
        assert!(!s.has_pending_changes());
    }

    #[test]
    fn node_without_versionable_mixin_is_repaired() {
        let mut s = session();
        let node = bare_sentinel(s.as_mut(), false);

        let outcome = ensure_sentinel(s.as_mut(), &SentinelConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: false,
                versions: 2
            }
        );
        assert!(s.is_node_type(node, VERSIONABLE).unwrap());
        assert_complete(s.as_ref(), node);
    }

    #[test]
    fn missing_string_property_is_repaired() {
        let mut s = session();
        let node = bare_sentinel(s.as_mut(), true);
        s.checkin(node).unwrap();

        let outcome = ensure_sentinel(s.as_mut(), &SentinelConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: false,
                versions: 3
            }
        );
        assert_complete(s.as_ref(), node);
    }

    #[test]
    fn node_left_checked_out_is_checked_in() {
        let mut s = session();
        let node = bare_sentinel(s.as_mut(), true);
        s.checkin(node).unwrap();
        s.checkout(node).unwrap();
        s.set_property(node, "foo", "hello bob", PropertyType::String)
            .unwrap();
        s.save().unwrap();
        assert!(s.is_checked_out(node).unwrap());

        let outcome = ensure_sentinel(s.as_mut(), &SentinelConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: false,
                versions: 3
            }
        );
        assert_complete(s.as_ref(), node);
    }

    #[test]
    fn repaired_sentinel_is_then_stable() {
        let mut s = session();
        bare_sentinel(s.as_mut(), false);
        let config = SentinelConfig::default();
        ensure_sentinel(s.as_mut(), &config).unwrap();
        assert_eq!(
            ensure_sentinel(s.as_mut(), &config).unwrap(),
            SentinelOutcome::Unchanged
        );
    }

    #[test]
    fn stale_working_copy_is_dropped_and_stages_rerun() {
        let repo = MemoryRepository::new(["default"]).unwrap();
        let creds = Credentials::new("u", "p");
        let mut stale = repo.login(&creds, "default").unwrap();
        let mut other = repo.login(&creds, "default").unwrap();

        let root = stale.root();
        stale.add_node(root, "scratch", SENTINEL_TYPE).unwrap();
        other.add_node(root, "elsewhere", SENTINEL_TYPE).unwrap();
        other.save().unwrap();

        let outcome = ensure_sentinel(stale.as_mut(), &SentinelConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SentinelOutcome::Initialized {
                created: true,
                versions: 3
            }
        );
        assert!(stale.child(root, "elsewhere").unwrap().is_some());
        assert!(stale.child(root, "scratch").unwrap().is_none());

        let fresh = repo.login(&creds, "default").unwrap();
        let node = sentinel(fresh.as_ref());
        assert_complete(fresh.as_ref(), node);
    }

    #[test]
    fn custom_names_are_honoured() {
        let mut s = session();
        let config = SentinelConfig {
            node_name: "canary".into(),
            string_property: "greeting".into(),
            string_value: "hi".into(),
            boolean_property: "ok".into(),
        };
        ensure_sentinel(s.as_mut(), &config).unwrap();
        let node = s.child(s.root(), "canary").unwrap().unwrap();
        assert_eq!(s.property_value(node, "greeting").unwrap(), "hi");
        assert_eq!(s.property_value(node, "ok").unwrap(), "true");
    }
}
