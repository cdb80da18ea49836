use std::collections::BTreeMap;
use std::fmt;

/// Prefixes every repository knows without a `<prefix = 'uri'>` declaration.
pub const BUILTIN_PREFIXES: &[&str] = &["jcr", "nt", "mix", "rep", "sv", "xml"];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Property types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Declared type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PropertyType {
    #[default]
    String,
    Binary,
    Long,
    Double,
    Boolean,
    Date,
    Name,
    Path,
    Reference,
    WeakReference,
    Uri,
    Decimal,
    /// Any type; written as `undefined` (or `*` in source).
    Undefined,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Binary => "binary",
            PropertyType::Long => "long",
            PropertyType::Double => "double",
            PropertyType::Boolean => "boolean",
            PropertyType::Date => "date",
            PropertyType::Name => "name",
            PropertyType::Path => "path",
            PropertyType::Reference => "reference",
            PropertyType::WeakReference => "weakreference",
            PropertyType::Uri => "uri",
            PropertyType::Decimal => "decimal",
            PropertyType::Undefined => "undefined",
        }
    }

    /// Case-insensitive lookup of a type keyword. `*` means undefined.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let t = match keyword.to_ascii_lowercase().as_str() {
            "string" => PropertyType::String,
            "binary" => PropertyType::Binary,
            "long" => PropertyType::Long,
            "double" => PropertyType::Double,
            "boolean" => PropertyType::Boolean,
            "date" => PropertyType::Date,
            "name" => PropertyType::Name,
            "path" => PropertyType::Path,
            "reference" => PropertyType::Reference,
            "weakreference" => PropertyType::WeakReference,
            "uri" => PropertyType::Uri,
            "decimal" => PropertyType::Decimal,
            "undefined" | "*" => PropertyType::Undefined,
            _ => return None,
        };
        Some(t)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Item definitions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What happens to an item when its parent node is checked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OnParentVersion {
    #[default]
    Copy,
    Version,
    Initialize,
    Compute,
    Ignore,
    Abort,
}

impl OnParentVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnParentVersion::Copy => "COPY",
            OnParentVersion::Version => "VERSION",
            OnParentVersion::Initialize => "INITIALIZE",
            OnParentVersion::Compute => "COMPUTE",
            OnParentVersion::Ignore => "IGNORE",
            OnParentVersion::Abort => "ABORT",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let opv = match keyword.to_ascii_lowercase().as_str() {
            "copy" => OnParentVersion::Copy,
            "version" => OnParentVersion::Version,
            "initialize" => OnParentVersion::Initialize,
            "compute" => OnParentVersion::Compute,
            "ignore" => OnParentVersion::Ignore,
            "abort" => OnParentVersion::Abort,
            _ => return None,
        };
        Some(opv)
    }
}

/// Options shared by property and child node definitions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ItemFlags {
    pub primary: bool,
    pub autocreated: bool,
    pub mandatory: bool,
    pub protected: bool,
    /// Multi-valued for properties, same-name siblings for child nodes.
    pub multiple: bool,
    pub on_parent_version: OnParentVersion,
}

/// `- name (type) = 'default' options < 'constraint'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    /// Property name, or `*` for a residual definition.
    pub name: String,
    pub property_type: PropertyType,
    pub default_values: Vec<String>,
    pub constraints: Vec<String>,
    pub flags: ItemFlags,
}

impl PropertyDef {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            default_values: Vec::new(),
            constraints: Vec::new(),
            flags: ItemFlags::default(),
        }
    }

    pub fn is_residual(&self) -> bool {
        self.name == "*"
    }
}

/// `+ name (required, types) = default_type options`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildNodeDef {
    /// Child name, or `*` for a residual definition.
    pub name: String,
    pub required_types: Vec<String>,
    pub default_type: Option<String>,
    pub flags: ItemFlags,
}

impl ChildNodeDef {
    pub fn is_residual(&self) -> bool {
        self.name == "*"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeTypeDef {
    pub name: String,
    pub supertypes: Vec<String>,
    pub orderable: bool,
    pub mixin: bool,
    pub is_abstract: bool,
    pub primary_item: Option<String>,
    pub properties: Vec<PropertyDef>,
    pub child_nodes: Vec<ChildNodeDef>,
}

impl NodeTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Every qualified name the definition mentions, for prefix checks.
    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.supertypes.iter().map(String::as_str))
            .chain(self.primary_item.iter().map(String::as_str))
            .chain(self.properties.iter().map(|p| p.name.as_str()))
            .chain(self.child_nodes.iter().flat_map(|c| {
                std::iter::once(c.name.as_str())
                    .chain(c.required_types.iter().map(String::as_str))
                    .chain(c.default_type.iter().map(String::as_str))
            }))
    }
}

/// A parsed compact definition source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CndDocument {
    /// Prefix → URI, as declared in the source.
    pub namespaces: BTreeMap<String, String>,
    /// Node types in source order.
    pub node_types: Vec<NodeTypeDef>,
}

impl CndDocument {
    pub fn node_type(&self, name: &str) -> Option<&NodeTypeDef> {
        self.node_types.iter().find(|t| t.name == name)
    }

    pub fn to_cnd(&self) -> String {
        crate::write_cnd(&self.namespaces, &self.node_types)
    }
}

/// The prefix of a qualified name (`nt:base` → `Some("nt")`).
pub(crate) fn prefix_of(name: &str) -> Option<&str> {
    name.split_once(':').map(|(prefix, _)| prefix)
}
