use std::collections::BTreeMap;
use std::fmt::Write;

use crate::types::{ChildNodeDef, ItemFlags, NodeTypeDef, OnParentVersion, PropertyDef};

/// Serialize namespaces (sorted by prefix) and node types (in the given
/// order) to compact notation. The empty default prefix is never written.
pub fn write_cnd(namespaces: &BTreeMap<String, String>, defs: &[NodeTypeDef]) -> String {
    let mut out = String::new();

    for (prefix, uri) in namespaces {
        if prefix.is_empty() {
            continue;
        }
        let _ = writeln!(out, "<{} = {}>", name(prefix), quote(uri));
    }

    for def in defs {
        out.push('\n');
        write_node_type(&mut out, def);
    }
    out
}

fn write_node_type(out: &mut String, def: &NodeTypeDef) {
    let _ = write!(out, "[{}]", name(&def.name));
    if !def.supertypes.is_empty() {
        let supers: Vec<String> = def.supertypes.iter().map(|s| name(s)).collect();
        let _ = write!(out, " > {}", supers.join(", "));
    }
    out.push('\n');

    let mut options = Vec::new();
    if def.orderable {
        options.push("orderable".to_string());
    }
    if def.mixin {
        options.push("mixin".to_string());
    }
    if def.is_abstract {
        options.push("abstract".to_string());
    }
    if let Some(item) = &def.primary_item {
        options.push(format!("primaryitem {}", name(item)));
    }
    if !options.is_empty() {
        let _ = writeln!(out, "  {}", options.join(" "));
    }

    for prop in &def.properties {
        write_property(out, prop);
    }
    for child in &def.child_nodes {
        write_child_node(out, child);
    }
}

fn write_property(out: &mut String, prop: &PropertyDef) {
    let _ = write!(out, "  - {} ({})", item_name(&prop.name), prop.property_type);
    if !prop.default_values.is_empty() {
        let _ = write!(out, " = {}", quoted_list(&prop.default_values));
    }
    write_flags(out, &prop.flags);
    if !prop.constraints.is_empty() {
        let _ = write!(out, " < {}", quoted_list(&prop.constraints));
    }
    out.push('\n');
}

fn write_child_node(out: &mut String, child: &ChildNodeDef) {
    let _ = write!(out, "  + {}", item_name(&child.name));
    if !child.required_types.is_empty() {
        let types: Vec<String> = child.required_types.iter().map(|s| name(s)).collect();
        let _ = write!(out, " ({})", types.join(", "));
    }
    if let Some(default_type) = &child.default_type {
        let _ = write!(out, " = {}", name(default_type));
    }
    write_flags(out, &child.flags);
    out.push('\n');
}

fn write_flags(out: &mut String, flags: &ItemFlags) {
    let set = [
        (flags.primary, "primary"),
        (flags.autocreated, "autocreated"),
        (flags.mandatory, "mandatory"),
        (flags.protected, "protected"),
        (flags.multiple, "multiple"),
    ];
    for (_, word) in set.iter().filter(|(on, _)| *on) {
        out.push(' ');
        out.push_str(word);
    }
    if flags.on_parent_version != OnParentVersion::Copy {
        out.push(' ');
        out.push_str(flags.on_parent_version.as_str());
    }
}

fn quoted_list(values: &[String]) -> String {
    values.iter().map(|v| quote(v)).collect::<Vec<_>>().join(", ")
}

fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('\'');
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Bare when the lexer would read it back as one identifier.
fn name(text: &str) -> String {
    let mut chars = text.chars();
    let bare = match chars.next() {
        Some(first) => {
            (first.is_alphabetic() || first == '_')
                && chars.all(|c| c.is_alphanumeric() || matches!(c, ':' | '_' | '.' | '-'))
        }
        None => false,
    };
    if bare {
        text.to_string()
    } else {
        quote(text)
    }
}

fn item_name(text: &str) -> String {
    if text == "*" {
        "*".into()
    } else {
        name(text)
    }
}
