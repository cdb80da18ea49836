/// Errors raised while reading compact node type definitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CndError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unknown namespace prefix '{prefix}'")]
    UnknownPrefix { line: usize, prefix: String },

    #[error("line {line}: node type [{name}] is defined twice")]
    DuplicateType { line: usize, name: String },

    #[error("loop involving {0} in type inheritance")]
    InheritanceLoop(String),

    #[error("missing supertype '{supertype}' in [{node_type}]")]
    MissingSupertype { node_type: String, supertype: String },
}

impl CndError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        CndError::Syntax {
            line,
            message: message.into(),
        }
    }
}
