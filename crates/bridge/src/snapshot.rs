use std::collections::BTreeMap;
use std::time::Instant;

use ng_domain::error::Result;
use ng_domain::trace::TraceEvent;
use ng_protocol::{ChildRef, NodeId, NodeSnapshot, PropertyKind, PropertyRecord};
use ng_repository::{NodeHandle, PropertyType, Session, StoreError, StoreResult};

use crate::store_error;

/// Snapshot every node in `ids`.
///
/// All identifiers are resolved before any node is read; one unresolvable
/// id fails the whole call with `NotFound` and nothing is returned. Any
/// store failure while building fails the whole call as a repository
/// error. Repeated ids collapse to one entry.
pub fn snapshot(session: &dyn Session, ids: &[NodeId]) -> Result<BTreeMap<NodeId, NodeSnapshot>> {
    let started = Instant::now();

    for id in ids {
        session.node_by_identifier(id).map_err(store_error::lookup)?;
    }

    let mut states = BTreeMap::new();
    let mut children_skipped = 0;
    for id in ids {
        if states.contains_key(id) {
            continue;
        }
        let (state, skipped) = build(session, id).map_err(store_error::repository)?;
        children_skipped += skipped;
        states.insert(id.clone(), state);
    }

    TraceEvent::SnapshotServed {
        workspace: session.workspace().to_string(),
        requested: ids.len(),
        returned: states.len(),
        children_skipped,
        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    }
    .emit();

    Ok(states)
}

fn build(session: &dyn Session, id: &str) -> StoreResult<(NodeSnapshot, usize)> {
    let node = session.node_by_identifier(id)?;
    let name = session.name(node)?;

    let parent_id = match session.parent(node)? {
        Some(parent) => match session.identifier(parent) {
            Ok(parent_id) => Some(parent_id),
            Err(StoreError::NotReferenceable(_)) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    let all_children = session.children(node)?;
    let children = addressable_children(session, &all_children)?;
    let skipped = all_children.len() - children.len();

    let mut properties = Vec::new();
    for info in session.properties(node)? {
        let values = if info.multiple {
            session.property_values(node, &info.name)?
        } else {
            vec![session.property_value(node, &info.name)?]
        };
        properties.push(PropertyRecord {
            name: info.name,
            values,
            kind: property_kind(info.property_type),
            multi_valued: info.multiple,
        });
    }

    let state = NodeSnapshot {
        name,
        parent_id,
        children,
        properties,
        reserved: Vec::new(),
    };
    Ok((state, skipped))
}

/// References to the children that carry an identifier. Children without
/// one cannot be addressed by a client and are left out.
pub fn addressable_children(
    session: &dyn Session,
    children: &[NodeHandle],
) -> StoreResult<Vec<ChildRef>> {
    let mut refs = Vec::with_capacity(children.len());
    for &child in children {
        let id = match session.identifier(child) {
            Ok(id) => id,
            Err(StoreError::NotReferenceable(_)) => continue,
            Err(e) => return Err(e),
        };
        refs.push(ChildRef {
            name: session.name(child)?,
            id,
            primary_type: session.primary_type(child)?,
        });
    }
    Ok(refs)
}

/// Wire kind of a store property type.
pub fn property_kind(property_type: PropertyType) -> PropertyKind {
    match property_type {
        PropertyType::String => PropertyKind::String,
        PropertyType::Binary => PropertyKind::Binary,
        PropertyType::Long => PropertyKind::Long,
        PropertyType::Double => PropertyKind::Double,
        PropertyType::Boolean => PropertyKind::Boolean,
        PropertyType::Date => PropertyKind::Date,
        PropertyType::Name => PropertyKind::Name,
        PropertyType::Path => PropertyKind::Path,
        PropertyType::Reference => PropertyKind::Reference,
        _ => PropertyKind::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_outside_the_wire_set_are_unknown() {
        assert_eq!(property_kind(PropertyType::Long), PropertyKind::Long);
        assert_eq!(property_kind(PropertyType::Reference), PropertyKind::Reference);
        for t in [
            PropertyType::Decimal,
            PropertyType::Uri,
            PropertyType::WeakReference,
            PropertyType::Undefined,
        ] {
            assert_eq!(property_kind(t), PropertyKind::Unknown);
        }
    }
}
