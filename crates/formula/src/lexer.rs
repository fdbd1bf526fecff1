//! Tokenizer.
//!
//! The lexer is the first line of the sandbox: characters and words that
//! introduce non-arithmetic constructs (quotes, dots, brackets, `=`, `;`,
//! comparison operators, language keywords) are rejected here with a
//! [`Construct`] naming what was attempted.

use std::fmt;

use crate::error::{Construct, ParseError};

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Pipe,
    Amp,
    Caret,
    Tilde,
    Shl,
    Shr,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "number {value}"),
            Self::Ident(name) => write!(f, "name `{name}`"),
            Self::Plus => f.write_str("`+`"),
            Self::Minus => f.write_str("`-`"),
            Self::Star => f.write_str("`*`"),
            Self::DoubleStar => f.write_str("`**`"),
            Self::Slash => f.write_str("`/`"),
            Self::DoubleSlash => f.write_str("`//`"),
            Self::Percent => f.write_str("`%`"),
            Self::Pipe => f.write_str("`|`"),
            Self::Amp => f.write_str("`&`"),
            Self::Caret => f.write_str("`^`"),
            Self::Tilde => f.write_str("`~`"),
            Self::Shl => f.write_str("`<<`"),
            Self::Shr => f.write_str("`>>`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::Comma => f.write_str("`,`"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

/// Words that start non-arithmetic constructs in general-purpose languages.
fn reserved_word(word: &str) -> Option<Construct> {
    let construct = match word {
        "if" | "else" | "elif" => Construct::Conditional,
        "lambda" => Construct::Lambda,
        "for" | "in" | "while" => Construct::Comprehension,
        "and" | "or" | "not" | "is" => Construct::BooleanLogic,
        "import" | "from" | "def" | "class" | "return" | "yield" | "await" | "async"
        | "del" | "global" | "nonlocal" | "pass" | "raise" | "try" | "except" | "finally"
        | "with" | "as" | "assert" | "break" | "continue" => Construct::Statement,
        _ => return None,
    };
    Some(construct)
}

pub(crate) struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        while self.chars.next_if(|(_, c)| *c == ' ' || *c == '\t').is_some() {}

        let Some((position, ch)) = self.chars.next() else {
            return Ok(None);
        };

        let disallowed = |construct| ParseError::Disallowed {
            construct,
            position,
        };

        let kind = match ch {
            '0'..='9' => return self.number(position).map(Some),
            '.' if self.peek_is_digit() => return self.number(position).map(Some),
            c if c == '_' || c.is_ascii_alphabetic() => return self.word(position).map(Some),
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if self.eat('*') {
                    TokenKind::DoubleStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.eat('/') {
                    TokenKind::DoubleSlash
                } else {
                    TokenKind::Slash
                }
            }
            '%' => TokenKind::Percent,
            '|' => TokenKind::Pipe,
            '&' => TokenKind::Amp,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '<' => {
                if self.eat('<') {
                    TokenKind::Shl
                } else {
                    return Err(disallowed(Construct::Comparison));
                }
            }
            '>' => {
                if self.eat('>') {
                    TokenKind::Shr
                } else {
                    return Err(disallowed(Construct::Comparison));
                }
            }
            '=' => {
                if self.eat('=') {
                    return Err(disallowed(Construct::Comparison));
                }
                return Err(disallowed(Construct::Assignment));
            }
            '!' => return Err(disallowed(Construct::Comparison)),
            '.' => return Err(disallowed(Construct::AttributeAccess)),
            '[' | ']' | '{' | '}' => return Err(disallowed(Construct::Subscript)),
            '\'' | '"' => return Err(disallowed(Construct::StringLiteral)),
            ';' => return Err(disallowed(Construct::StatementSeparator)),
            ':' | '@' | '\\' => return Err(disallowed(Construct::Operator)),
            '#' => return Err(ParseError::Comment { position }),
            '\n' | '\r' => return Err(ParseError::Multiline),
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    ch: other,
                    position,
                });
            }
        };

        // Augmented assignment (`+=`, `**=`, `//=`, ...) after any operator.
        if self.chars.peek().is_some_and(|(_, c)| *c == '=')
            && !matches!(kind, TokenKind::LParen | TokenKind::RParen | TokenKind::Comma)
        {
            return Err(disallowed(Construct::Assignment));
        }

        Ok(Some(Token { kind, position }))
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|(_, c)| *c == expected).is_some()
    }

    fn peek_is_digit(&mut self) -> bool {
        self.chars.peek().is_some_and(|(_, c)| c.is_ascii_digit())
    }

    fn end_of(&mut self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    fn number(&mut self, start: usize) -> Result<Token, ParseError> {
        while self
            .chars
            .next_if(|(_, c)| c.is_ascii_digit() || *c == '.')
            .is_some()
        {}

        // Exponent: `1e3`, `2.5E-4`
        if self.chars.next_if(|(_, c)| *c == 'e' || *c == 'E').is_some() {
            self.chars.next_if(|(_, c)| *c == '+' || *c == '-');
            while self.chars.next_if(|(_, c)| c.is_ascii_digit()).is_some() {}
        }

        // Trailing identifier characters (`3x`, `1j`, `0x1f`) are not numbers.
        while self
            .chars
            .next_if(|(_, c)| *c == '_' || c.is_ascii_alphanumeric())
            .is_some()
        {}

        let end = self.end_of();
        let text = &self.source[start..end];
        let malformed = || ParseError::MalformedNumber {
            text: text.to_string(),
            position: start,
        };

        if text.matches('.').count() > 1 {
            return Err(malformed());
        }
        let value: f64 = text.parse().map_err(|_| malformed())?;
        if !value.is_finite() {
            return Err(malformed());
        }

        Ok(Token {
            kind: TokenKind::Number(value),
            position: start,
        })
    }

    fn word(&mut self, start: usize) -> Result<Token, ParseError> {
        while self
            .chars
            .next_if(|(_, c)| *c == '_' || c.is_ascii_alphanumeric())
            .is_some()
        {}

        let end = self.end_of();
        let word = &self.source[start..end];
        if let Some(construct) = reserved_word(word) {
            return Err(ParseError::Disallowed {
                construct,
                position: start,
            });
        }

        Ok(Token {
            kind: TokenKind::Ident(word.to_string()),
            position: start,
        })
    }
}
