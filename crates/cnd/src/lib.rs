//! Compact node type definitions (CND).
//!
//! Reads the textual schema notation used to bootstrap a repository's type
//! registry, and writes registered types back out in the same notation:
//!
//! ```text
//! <ecmnt = 'http://nuxeo.org/ecm/jcr/names'>
//! [ecmnt:document] > nt:base, mix:referenceable
//!   orderable
//!   - title (string) = 'untitled' mandatory
//!   - tags (string) multiple
//!   + * (ecmnt:document) = ecmnt:document
//! ```
//!
//! [`parse_cnd`] and [`write_cnd`] are inverses: writing a parsed document
//! and parsing the output yields an equal [`CndDocument`].

mod error;
mod lexer;
mod order;
mod parser;
mod types;
mod writer;

pub use error::CndError;
pub use order::inheritance_order;
pub use parser::parse_cnd;
pub use types::{
    ChildNodeDef, CndDocument, ItemFlags, NodeTypeDef, OnParentVersion, PropertyDef,
    PropertyType, BUILTIN_PREFIXES,
};
pub use writer::write_cnd;
