//! Store-wide namespace and node type registry.

use std::collections::{BTreeMap, HashMap};

use ng_cnd::{inheritance_order, parse_cnd, NodeTypeDef};

use crate::error::{StoreError, StoreResult};

const BUILTIN_CND: &str = include_str!("../builtin.cnd");

pub(crate) const REFERENCEABLE: &str = "mix:referenceable";
pub(crate) const VERSIONABLE: &str = "mix:versionable";
pub(crate) const ROOT_TYPE: &str = "rep:root";
const BASE: &str = "nt:base";

#[derive(Debug, Default)]
pub(crate) struct Registry {
    namespaces: BTreeMap<String, String>,
    types: Vec<NodeTypeDef>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Registry holding the built-in namespaces and node types.
    pub fn builtin() -> StoreResult<Self> {
        let doc = parse_cnd(BUILTIN_CND)
            .map_err(|e| StoreError::InvalidDefinition(format!("built-in types: {e}")))?;
        let mut registry = Registry::default();
        registry.namespaces.insert(String::new(), String::new());
        for (prefix, uri) in &doc.namespaces {
            registry.register_namespace(prefix, uri)?;
        }
        registry.register_node_types(&doc.node_types)?;
        Ok(registry)
    }

    // ── Namespaces ────────────────────────────────────────────────────

    pub fn namespaces(&self) -> BTreeMap<String, String> {
        self.namespaces.clone()
    }

    pub fn register_namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<()> {
        if prefix.is_empty() || prefix.contains(':') {
            return Err(StoreError::Namespace(format!("invalid prefix '{prefix}'")));
        }
        if uri.is_empty() {
            return Err(StoreError::Namespace(format!("empty uri for prefix '{prefix}'")));
        }
        if self.namespaces.contains_key(prefix) {
            return Err(StoreError::NamespaceExists(prefix.to_string()));
        }
        if let Some((other, _)) = self.namespaces.iter().find(|(_, u)| u.as_str() == uri) {
            return Err(StoreError::Namespace(format!(
                "uri '{uri}' is already mapped to prefix '{other}'"
            )));
        }
        self.namespaces.insert(prefix.to_string(), uri.to_string());
        Ok(())
    }

    /// Fails with `Namespace` when `name` carries an unregistered prefix.
    pub fn check_name(&self, name: &str) -> StoreResult<()> {
        match name.split_once(':') {
            Some((prefix, local)) => {
                if local.is_empty() {
                    return Err(StoreError::Namespace(format!("'{name}' has no local part")));
                }
                if !self.namespaces.contains_key(prefix) {
                    return Err(StoreError::Namespace(format!(
                        "unknown prefix '{prefix}' in '{name}'"
                    )));
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    // ── Node types ────────────────────────────────────────────────────

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&NodeTypeDef> {
        self.index.get(name).map(|&i| &self.types[i])
    }

    pub fn require(&self, name: &str) -> StoreResult<&NodeTypeDef> {
        self.get(name)
            .ok_or_else(|| StoreError::NoSuchNodeType(name.to_string()))
    }

    pub fn defs(&self) -> Vec<NodeTypeDef> {
        self.types.clone()
    }

    /// Whether `name` is `ancestor` or inherits from it. Every primary type
    /// inherits from `nt:base`.
    pub fn is_subtype(&self, name: &str, ancestor: &str) -> bool {
        if name == ancestor {
            return true;
        }
        let Some(def) = self.get(name) else {
            return false;
        };
        if ancestor == BASE && !def.mixin {
            return true;
        }
        def.supertypes.iter().any(|s| self.is_subtype(s, ancestor))
    }

    /// Register `defs` as one batch: every definition is checked before any
    /// is stored.
    pub fn register_node_types(&mut self, defs: &[NodeTypeDef]) -> StoreResult<()> {
        for def in defs {
            if self.contains(&def.name) {
                return Err(StoreError::NodeTypeExists(def.name.clone()));
            }
            for name in def.referenced_names() {
                if name != "*" {
                    self.check_name(name)?;
                }
            }
        }

        let ordered = inheritance_order(defs, |name| self.contains(name))
            .map_err(|e| StoreError::InvalidDefinition(e.to_string()))?;

        let in_batch = |name: &str| defs.iter().any(|d| d.name == name);
        for def in &ordered {
            for child in &def.child_nodes {
                for required in child.required_types.iter().chain(&child.default_type) {
                    if !self.contains(required) && !in_batch(required.as_str()) {
                        return Err(StoreError::InvalidDefinition(format!(
                            "[{}] child '{}' references unknown type '{}'",
                            def.name, child.name, required
                        )));
                    }
                }
            }
            for supertype in &def.supertypes {
                let mixin_super = self
                    .get(supertype)
                    .or_else(|| defs.iter().find(|d| &d.name == supertype))
                    .is_some_and(|s| s.mixin);
                if def.mixin && !mixin_super {
                    return Err(StoreError::InvalidDefinition(format!(
                        "mixin [{}] cannot extend primary type '{}'",
                        def.name, supertype
                    )));
                }
            }
        }

        for def in ordered {
            self.index.insert(def.name.clone(), self.types.len());
            self.types.push(def.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_core_types() {
        let registry = Registry::builtin().unwrap();
        for name in [
            "nt:base",
            "nt:unstructured",
            "nt:hierarchyNode",
            "nt:folder",
            "nt:file",
            "nt:resource",
            "mix:referenceable",
            "mix:versionable",
            "mix:lockable",
            "rep:root",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.namespaces().get(""), Some(&String::new()));
    }

    #[test]
    fn subtyping_follows_supertypes() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.is_subtype("mix:versionable", REFERENCEABLE));
        assert!(registry.is_subtype("rep:root", "nt:unstructured"));
        assert!(registry.is_subtype("nt:folder", "nt:base"));
        assert!(!registry.is_subtype("mix:lockable", "nt:base"));
        assert!(!registry.is_subtype("nt:folder", REFERENCEABLE));
    }

    #[test]
    fn namespace_rules() {
        let mut registry = Registry::builtin().unwrap();
        registry.register_namespace("ex", "urn:ex").unwrap();
        assert_eq!(
            registry.register_namespace("ex", "urn:other"),
            Err(StoreError::NamespaceExists("ex".into()))
        );
        assert!(matches!(
            registry.register_namespace("ex2", "urn:ex"),
            Err(StoreError::Namespace(_))
        ));
        assert!(registry.check_name("ex:thing").is_ok());
        assert!(registry.check_name("nope:thing").is_err());
        assert!(registry.check_name("plain").is_ok());
    }

    #[test]
    fn failed_batch_registers_nothing() {
        let mut registry = Registry::builtin().unwrap();
        let mut good = NodeTypeDef::new("good");
        good.supertypes = vec!["nt:base".into()];
        let mut bad = NodeTypeDef::new("bad");
        bad.supertypes = vec!["missing".into()];
        let err = registry.register_node_types(&[good, bad]).unwrap_err();
        assert!(matches!(err, StoreError::InvalidDefinition(_)));
        assert!(!registry.contains("good"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = Registry::builtin().unwrap();
        let err = registry
            .register_node_types(&[NodeTypeDef::new("nt:folder")])
            .unwrap_err();
        assert_eq!(err, StoreError::NodeTypeExists("nt:folder".into()));
    }
}
