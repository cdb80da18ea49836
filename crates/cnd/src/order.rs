use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::NodeTypeDef;
use crate::CndError;

/// Sort `defs` so that every supertype defined in the batch precedes its
/// subtypes. Supertypes outside the batch must satisfy `known`.
///
/// Ties keep source order.
pub fn inheritance_order<'a>(
    defs: &'a [NodeTypeDef],
    known: impl Fn(&str) -> bool,
) -> Result<Vec<&'a NodeTypeDef>, CndError> {
    let by_name: HashMap<&str, &NodeTypeDef> =
        defs.iter().map(|d| (d.name.as_str(), d)).collect();
    let mut sorter = Sorter {
        by_name,
        known: &known,
        done: HashSet::new(),
        ancestors: BTreeSet::new(),
        sorted: Vec::with_capacity(defs.len()),
    };
    for def in defs {
        sorter.visit(def)?;
    }
    Ok(sorter.sorted)
}

struct Sorter<'a, 'k> {
    by_name: HashMap<&'a str, &'a NodeTypeDef>,
    known: &'k dyn Fn(&str) -> bool,
    done: HashSet<&'a str>,
    ancestors: BTreeSet<&'a str>,
    sorted: Vec<&'a NodeTypeDef>,
}

impl<'a> Sorter<'a, '_> {
    fn visit(&mut self, def: &'a NodeTypeDef) -> Result<(), CndError> {
        if self.done.contains(def.name.as_str()) {
            return Ok(());
        }
        self.ancestors.insert(def.name.as_str());
        for supertype in &def.supertypes {
            let Some(&parent) = self.by_name.get(supertype.as_str()) else {
                if (self.known)(supertype) {
                    continue;
                }
                return Err(CndError::MissingSupertype {
                    node_type: def.name.clone(),
                    supertype: supertype.clone(),
                });
            };
            if self.ancestors.contains(parent.name.as_str()) {
                let names: Vec<String> = self.ancestors.iter().map(|a| format!("'{a}'")).collect();
                return Err(CndError::InheritanceLoop(names.join(", ")));
            }
            self.visit(parent)?;
        }
        self.ancestors.remove(def.name.as_str());
        if self.done.insert(def.name.as_str()) {
            self.sorted.push(def);
        }
        Ok(())
    }
}
