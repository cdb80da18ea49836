use std::collections::HashSet;

use crate::lexer::{tokenize, Spanned, Token};
use crate::types::{
    prefix_of, ChildNodeDef, CndDocument, ItemFlags, NodeTypeDef, OnParentVersion, PropertyDef,
    PropertyType, BUILTIN_PREFIXES,
};
use crate::CndError;

/// Parse a compact definition source into its namespaces and node types.
///
/// Namespace declarations must precede the first use of their prefix; the
/// [`BUILTIN_PREFIXES`] are always in scope. Node types keep source order.
pub fn parse_cnd(src: &str) -> Result<CndDocument, CndError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        doc: CndDocument::default(),
        seen: HashSet::new(),
    };
    parser.document()?;
    Ok(parser.doc)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    doc: CndDocument,
    seen: HashSet<String>,
}

impl Parser {
    // ── Token cursor ──────────────────────────────────────────────────

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_at(&self, offset: usize) -> &Token {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].token
    }

    fn line(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].line
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: char) -> bool {
        if *self.peek() == Token::Punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: char) -> Result<(), CndError> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{punct}'")))
        }
    }

    fn unexpected(&self, wanted: &str) -> CndError {
        CndError::syntax(
            self.line(),
            format!("expected {wanted}, found {}", self.peek().describe()),
        )
    }

    /// Identifier keyword at the cursor, lowercased.
    fn keyword(&self) -> Option<String> {
        match self.peek() {
            Token::Ident(s) => Some(s.to_ascii_lowercase()),
            _ => None,
        }
    }

    // ── Names ─────────────────────────────────────────────────────────

    /// A qualified name, bare or quoted, whose prefix must be in scope.
    fn name(&mut self) -> Result<String, CndError> {
        let line = self.line();
        let name = match self.peek() {
            Token::Ident(s) | Token::Str(s) => s.clone(),
            _ => return Err(self.unexpected("a name")),
        };
        self.advance();
        self.check_prefix(&name, line)?;
        Ok(name)
    }

    /// An item name or `*` for residual definitions.
    fn item_name(&mut self) -> Result<String, CndError> {
        if self.eat('*') {
            return Ok("*".into());
        }
        self.name()
    }

    fn name_list(&mut self) -> Result<Vec<String>, CndError> {
        let mut names = vec![self.name()?];
        while self.eat(',') {
            names.push(self.name()?);
        }
        Ok(names)
    }

    fn string_list(&mut self) -> Result<Vec<String>, CndError> {
        let mut values = Vec::new();
        loop {
            match self.peek() {
                Token::Str(s) | Token::Ident(s) => {
                    values.push(s.clone());
                    self.advance();
                }
                _ => return Err(self.unexpected("a value")),
            }
            if !self.eat(',') {
                return Ok(values);
            }
        }
    }

    fn check_prefix(&self, name: &str, line: usize) -> Result<(), CndError> {
        match prefix_of(name) {
            Some(prefix)
                if !BUILTIN_PREFIXES.contains(&prefix)
                    && !self.doc.namespaces.contains_key(prefix) =>
            {
                Err(CndError::UnknownPrefix {
                    line,
                    prefix: prefix.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────

    fn document(&mut self) -> Result<(), CndError> {
        loop {
            match self.peek() {
                Token::Eof => return Ok(()),
                Token::Punct('<') => self.namespace()?,
                Token::Punct('[') => {
                    let def = self.node_type()?;
                    self.doc.node_types.push(def);
                }
                _ => return Err(self.unexpected("'<' or '['")),
            }
        }
    }

    /// `<prefix = 'uri'>`
    fn namespace(&mut self) -> Result<(), CndError> {
        self.expect('<')?;
        let prefix = match self.peek() {
            Token::Ident(s) | Token::Str(s) => s.clone(),
            _ => return Err(self.unexpected("a namespace prefix")),
        };
        self.advance();
        self.expect('=')?;
        let uri = match self.peek() {
            Token::Str(s) | Token::Ident(s) => s.clone(),
            _ => return Err(self.unexpected("a namespace uri")),
        };
        self.advance();
        self.expect('>')?;
        self.doc.namespaces.insert(prefix, uri);
        Ok(())
    }

    /// `[name] > supers options items...`
    fn node_type(&mut self) -> Result<NodeTypeDef, CndError> {
        self.expect('[')?;
        let line = self.line();
        let mut def = NodeTypeDef::new(self.name()?);
        self.expect(']')?;
        if !self.seen.insert(def.name.clone()) {
            return Err(CndError::DuplicateType {
                line,
                name: def.name,
            });
        }

        if self.eat('>') {
            def.supertypes = self.name_list()?;
        }

        loop {
            if self.eat('!') {
                def.primary_item = Some(self.name()?);
                continue;
            }
            match self.keyword().as_deref() {
                Some("orderable" | "ord" | "o") => def.orderable = true,
                Some("mixin" | "mix" | "m") => def.mixin = true,
                Some("abstract" | "abs" | "a") => def.is_abstract = true,
                Some("primaryitem") => {
                    self.advance();
                    def.primary_item = Some(self.name()?);
                    continue;
                }
                _ => break,
            }
            self.advance();
        }

        loop {
            if self.eat('-') {
                def.properties.push(self.property()?);
            } else if self.eat('+') {
                def.child_nodes.push(self.child_node()?);
            } else {
                break;
            }
        }

        match self.peek() {
            Token::Eof | Token::Punct('<') | Token::Punct('[') => Ok(def),
            _ => Err(self.unexpected("'-', '+' or a new declaration")),
        }
    }

    /// `- name (type) = 'default' options < 'constraint'`
    fn property(&mut self) -> Result<PropertyDef, CndError> {
        let mut prop = PropertyDef::new(self.item_name()?, PropertyType::String);

        if self.eat('(') {
            let line = self.line();
            let keyword = match self.peek() {
                Token::Ident(s) => s.clone(),
                Token::Punct('*') => "*".into(),
                _ => return Err(self.unexpected("a property type")),
            };
            self.advance();
            prop.property_type = PropertyType::from_keyword(&keyword).ok_or_else(|| {
                CndError::syntax(line, format!("unknown property type '{keyword}'"))
            })?;
            self.expect(')')?;
        }

        if self.eat('=') {
            prop.default_values = self.string_list()?;
        }

        prop.flags = self.item_options()?;

        // `<` followed by a string is a constraint; otherwise it opens the
        // next namespace declaration.
        if *self.peek() == Token::Punct('<') && matches!(self.peek_at(1), Token::Str(_)) {
            self.advance();
            prop.constraints = self.string_list()?;
        }

        Ok(prop)
    }

    /// `+ name (required, types) = default_type options`
    fn child_node(&mut self) -> Result<ChildNodeDef, CndError> {
        let name = self.item_name()?;

        let mut required_types = Vec::new();
        if self.eat('(') {
            required_types = self.name_list()?;
            self.expect(')')?;
        }

        let mut default_type = None;
        if self.eat('=') {
            default_type = Some(self.name()?);
        }

        Ok(ChildNodeDef {
            name,
            required_types,
            default_type,
            flags: self.item_options()?,
        })
    }

    fn item_options(&mut self) -> Result<ItemFlags, CndError> {
        let mut flags = ItemFlags::default();
        loop {
            let option = match self.peek() {
                Token::Punct('!') => "!".to_string(),
                Token::Punct('*') => "*".to_string(),
                Token::Ident(s) => s.to_ascii_lowercase(),
                _ => return Ok(flags),
            };
            if let Some(opv) = OnParentVersion::from_keyword(&option) {
                flags.on_parent_version = opv;
            } else {
                match option.as_str() {
                    "primary" | "pri" | "!" => flags.primary = true,
                    "autocreated" | "aut" | "a" => flags.autocreated = true,
                    "mandatory" | "man" | "m" => flags.mandatory = true,
                    "protected" | "pro" | "p" => flags.protected = true,
                    "multiple" | "mul" | "*" => flags.multiple = true,
                    _ => {
                        return Err(CndError::syntax(
                            self.line(),
                            format!("unknown item option '{option}'"),
                        ))
                    }
                }
            }
            self.advance();
        }
    }
}
