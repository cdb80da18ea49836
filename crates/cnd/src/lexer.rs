//! Tokenizer for compact node type definitions.

use crate::CndError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// One of `< > = [ ] - + ( ) , * !`.
    Punct(char),
    /// Bare identifier, possibly qualified (`nt:base`).
    Ident(String),
    /// `'quoted'` or `"quoted"` text.
    Str(String),
    Eof,
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Token::Punct(c) => format!("'{c}'"),
            Token::Ident(s) => format!("identifier '{s}'"),
            Token::Str(s) => format!("string '{s}'"),
            Token::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
}

const PUNCT: &[char] = &['<', '>', '=', '[', ']', '-', '+', '(', ')', ',', '*', '!'];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ':' | '_' | '.' | '-')
}

/// Split `src` into tokens. The result always ends with [`Token::Eof`].
pub(crate) fn tokenize(src: &str) -> Result<Vec<Spanned>, CndError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' => match chars.next() {
                Some('/') => {
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                            break;
                        }
                    }
                }
                Some('*') => {
                    let start = line;
                    let mut prev = '\0';
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '\n' {
                            line += 1;
                        }
                        if prev == '*' && c == '/' {
                            closed = true;
                            break;
                        }
                        prev = c;
                    }
                    if !closed {
                        return Err(CndError::syntax(start, "unterminated block comment"));
                    }
                }
                _ => return Err(CndError::syntax(line, "unexpected '/'")),
            },
            quote @ ('\'' | '"') => {
                let start = line;
                let mut text = String::new();
                let mut closed = false;
                while let Some(c) = chars.next() {
                    if c == quote {
                        closed = true;
                        break;
                    }
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => {
                                if escaped == '\n' {
                                    line += 1;
                                }
                                text.push(escaped);
                            }
                            None => break,
                        },
                        '\n' => {
                            line += 1;
                            text.push('\n');
                        }
                        other => text.push(other),
                    }
                }
                if !closed {
                    return Err(CndError::syntax(start, "unterminated string"));
                }
                tokens.push(Spanned {
                    token: Token::Str(text),
                    line: start,
                });
            }
            c if PUNCT.contains(&c) => tokens.push(Spanned {
                token: Token::Punct(c),
                line,
            }),
            c if is_ident_start(c) => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    ident.push(next);
                    chars.next();
                }
                tokens.push(Spanned {
                    token: Token::Ident(ident),
                    line,
                });
            }
            other => {
                return Err(CndError::syntax(line, format!("unexpected character '{other}'")));
            }
        }
    }

    tokens.push(Spanned {
        token: Token::Eof,
        line,
    });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|s| s.token).collect()
    }

    #[test]
    fn splits_punctuation_and_qualified_names() {
        assert_eq!(
            kinds("[nt:base] > mix:referenceable"),
            vec![
                Token::Punct('['),
                Token::Ident("nt:base".into()),
                Token::Punct(']'),
                Token::Punct('>'),
                Token::Ident("mix:referenceable".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_all_comment_styles_and_counts_lines() {
        let src = "# hash\n// slashes\n/* block\n spanning */ x";
        let tokens = tokenize(src).unwrap();
        assert_eq!(tokens[0].token, Token::Ident("x".into()));
        assert_eq!(tokens[0].line, 4);
    }

    #[test]
    fn strings_accept_either_quote_and_escapes() {
        assert_eq!(
            kinds(r#"'it''s' "say \"hi\"""#),
            vec![
                Token::Str("it".into()),
                Token::Str("s".into()),
                Token::Str("say \"hi\"".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn dash_inside_identifier_is_part_of_it() {
        assert_eq!(
            kinds("- my-prop"),
            vec![
                Token::Punct('-'),
                Token::Ident("my-prop".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn unterminated_string_reports_its_start_line() {
        let err = tokenize("\n\n'open").unwrap_err();
        assert_eq!(
            err,
            CndError::Syntax {
                line: 3,
                message: "unterminated string".into()
            }
        );
    }

    #[test]
    fn stray_character_is_an_error() {
        assert!(matches!(
            tokenize("[a] ; b"),
            Err(CndError::Syntax { line: 1, .. })
        ));
    }
}
