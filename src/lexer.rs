use crate::error::{Result, RpalError};
use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    static ref KEYWORDS: HashSet<&'static str> = [
        "let", "in", "fn", "where", "aug", "or", "not", "gr", "ge", "ls", "le", "eq", "ne",
        "true", "false", "nil", "dummy", "within", "and", "rec",
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(String),
    Identifier(String),
    Integer(i64),
    Str(String),
    Operator(String),
    Punctuation(char),
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Keyword(k) => format!("keyword '{k}'"),
            Token::Identifier(i) => format!("identifier '{i}'"),
            Token::Integer(n) => format!("integer {n}"),
            Token::Str(s) => format!("string '{s}'"),
            Token::Operator(o) => format!("operator '{o}'"),
            Token::Punctuation(p) => format!("'{p}'"),
        }
    }
}

fn is_symbolic(c: char) -> bool {
    "+-*/<>&|=!%^~@".contains(c)
}

/// Turns RPAL source text into a flat token stream. Comments and whitespace
/// are discarded; `//` runs to end of line.
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = 1usize;

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '/' => {
                let mut lookahead = chars.clone();
                lookahead.next();
                if lookahead.peek() == Some(&'/') {
                    while let Some(&nc) = chars.peek() {
                        if nc == '\n' {
                            break;
                        }
                        chars.next();
                    }
                } else {
                    tokens.push(read_operator(&mut chars));
                }
            }
            '(' | ')' | ',' | '.' | ';' => {
                tokens.push(Token::Punctuation(c));
                chars.next();
            }
            '\'' => {
                tokens.push(Token::Str(read_string(&mut chars, line)?));
            }
            c if c.is_ascii_digit() => {
                tokens.push(read_integer(&mut chars));
            }
            c if c.is_ascii_alphabetic() => {
                let word = read_word(&mut chars);
                if KEYWORDS.contains(word.as_str()) {
                    tokens.push(Token::Keyword(word));
                } else {
                    tokens.push(Token::Identifier(word));
                }
            }
            c if is_symbolic(c) => {
                tokens.push(read_operator(&mut chars));
            }
            other => return Err(RpalError::Lex { ch: other, line }),
        }
    }

    Ok(tokens)
}

fn read_string(chars: &mut std::iter::Peekable<std::str::Chars>, line: usize) -> Result<String> {
    chars.next(); // consume opening quote
    let mut s = String::new();
    loop {
        match chars.next() {
            Some('\'') => return Ok(s),
            Some('\\') => match chars.next() {
                Some('n') => s.push('\n'),
                Some('t') => s.push('\t'),
                Some('\\') => s.push('\\'),
                Some('\'') => s.push('\''),
                Some(other) => {
                    s.push('\\');
                    s.push(other);
                }
                None => return Err(RpalError::Lex { ch: '\'', line }),
            },
            Some(other) => s.push(other),
            None => return Err(RpalError::Lex { ch: '\'', line }),
        }
    }
}

fn read_integer(chars: &mut std::iter::Peekable<std::str::Chars>) -> Token {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Token::Integer(s.parse().expect("digit run parses as i64"))
}

fn read_word(chars: &mut std::iter::Peekable<std::str::Chars>) -> String {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_alphanumeric() || c == '_' {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    s
}

fn read_operator(chars: &mut std::iter::Peekable<std::str::Chars>) -> Token {
    let mut s = String::new();
    while let Some(&c) = chars.peek() {
        if is_symbolic(c) {
            s.push(c);
            chars.next();
        } else {
            break;
        }
    }
    Token::Operator(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_let_binding() {
        let tokens = tokenize("let x = 5 in x + 3").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Keyword("let".into()),
                Token::Identifier("x".into()),
                Token::Operator("=".into()),
                Token::Integer(5),
                Token::Keyword("in".into()),
                Token::Identifier("x".into()),
                Token::Operator("+".into()),
                Token::Integer(3),
            ]
        );
    }

    #[test]
    fn strips_comments_and_whitespace() {
        let tokens = tokenize("// a comment\n  x   // trailing\n").unwrap();
        assert_eq!(tokens, vec![Token::Identifier("x".into())]);
    }

    #[test]
    fn reads_escaped_string() {
        let tokens = tokenize("'a\\nb\\'c'").unwrap();
        assert_eq!(tokens, vec![Token::Str("a\nb'c".into())]);
    }

    #[test]
    fn recognizes_multi_char_operators() {
        let tokens = tokenize("x ** 2 -> y | z >= 1").unwrap();
        assert!(tokens.contains(&Token::Operator("**".into())));
        assert!(tokens.contains(&Token::Operator("->".into())));
        assert!(tokens.contains(&Token::Operator(">=".into())));
    }

    #[test]
    fn rejects_unknown_character() {
        let err = tokenize("x $ y").unwrap_err();
        assert!(matches!(err, RpalError::Lex { ch: '$', .. }));
    }
}
