//! Tokeniser for PromQL query text
//!
//! The lexer never fails: characters it does not understand become
//! [`TokenKind::Unknown`] tokens so that the parser can report them and keep
//! going. Offsets are byte offsets into the source.

/// Kind of a lexed token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`rate`, `by`, `and`, `http_requests_total`)
    Ident(String),
    /// Numeric literal (`0.95`, `10`, `1e3`)
    Number(String),
    /// Duration literal (`5m`, `1h30m`)
    Duration(String),
    /// String literal; `terminated` is false when input ended inside it
    Str { value: String, terminated: bool },
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    /// Symbolic operator (`+`, `==`, `=~`, `=` ...)
    Op(String),
    /// Character the lexer does not recognise
    Unknown(char),
    Eof,
}

/// A token with its byte span (`end` is exclusive)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Offset of the token's last byte, as used by AST locations
    #[must_use]
    pub fn last(&self) -> usize {
        self.end.saturating_sub(1).max(self.start)
    }
}

const DURATION_UNITS: &[&str] = &["ms", "s", "m", "h", "d", "w", "y"];

pub struct Lexer<'a> {
    text: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Lexer {
            text,
            pos: 0,
            done: false,
        }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch == '#' {
                // comment runs to end of line
                while self.peek_char().is_some_and(|c| c != '\n') {
                    self.advance();
                }
            } else if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek_char().is_some_and(&pred) {
            self.advance();
        }
        &self.text[start..self.pos]
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        self.take_while(|ch| ch.is_ascii_digit() || ch == '.');
        if matches!(self.peek_char(), Some('e' | 'E')) && self.exponent_follows() {
            self.advance();
            if matches!(self.peek_char(), Some('+' | '-')) {
                self.advance();
            }
            self.take_while(|ch| ch.is_ascii_digit());
            return TokenKind::Number(self.text[start..self.pos].to_string());
        }

        // `5m`, `1h30m`, `250ms`: a run of digit/unit pairs
        let digits = &self.text[start..self.pos];
        if !digits.contains('.') && self.duration_unit_len().is_some() {
            while let Some(len) = self.duration_unit_len() {
                self.pos += len;
                let save = self.pos;
                self.take_while(|ch| ch.is_ascii_digit());
                if self.pos == save {
                    break;
                }
                if self.duration_unit_len().is_none() {
                    // digits without a unit belong to the next token
                    self.pos = save;
                    break;
                }
            }
            return TokenKind::Duration(self.text[start..self.pos].to_string());
        }
        TokenKind::Number(digits.to_string())
    }

    fn exponent_follows(&self) -> bool {
        let mut chars = self.rest().chars().skip(1);
        match chars.next() {
            Some('+' | '-') => chars.next().is_some_and(|c| c.is_ascii_digit()),
            Some(c) => c.is_ascii_digit(),
            None => false,
        }
    }

    fn duration_unit_len(&self) -> Option<usize> {
        let rest = self.rest();
        DURATION_UNITS
            .iter()
            .find(|unit| {
                rest.starts_with(*unit)
                    && !rest[unit.len()..]
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            })
            .map(|unit| unit.len())
    }

    fn lex_string(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut value = String::new();
        while let Some(ch) = self.advance() {
            if ch == '\\' {
                if let Some(escaped) = self.advance() {
                    value.push(escaped);
                }
                continue;
            }
            if ch == quote {
                return TokenKind::Str {
                    value,
                    terminated: true,
                };
            }
            value.push(ch);
        }
        TokenKind::Str {
            value,
            terminated: false,
        }
    }

    fn lex_operator(&mut self, ch: char) -> TokenKind {
        let two = match (ch, self.peek_second()) {
            ('=', Some('=')) => Some("=="),
            ('=', Some('~')) => Some("=~"),
            ('!', Some('=')) => Some("!="),
            ('!', Some('~')) => Some("!~"),
            ('>', Some('=')) => Some(">="),
            ('<', Some('=')) => Some("<="),
            _ => None,
        };
        self.advance();
        if let Some(op) = two {
            self.advance();
            return TokenKind::Op(op.to_string());
        }
        if ch == '!' {
            return TokenKind::Unknown('!');
        }
        TokenKind::Op(ch.to_string())
    }

    fn is_ident_start(&self, ch: char) -> bool {
        // recording-rule names may contain colons, but `[5m:1m]` uses a bare colon
        ch.is_alphabetic()
            || ch == '_'
            || ch == ':' && self.peek_second().is_some_and(|c| c.is_alphabetic() || c == '_')
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek_char() else {
            return Token {
                kind: TokenKind::Eof,
                start,
                end: start,
            };
        };

        let kind = if self.is_ident_start(ch) {
            let ident = self.take_while(|c| c.is_alphanumeric() || c == '_' || c == ':');
            TokenKind::Ident(ident.to_string())
        } else if ch.is_ascii_digit()
            || ch == '.' && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.lex_number()
        } else {
            match ch {
                '"' | '\'' | '`' => self.lex_string(ch),
                '+' | '-' | '*' | '/' | '%' | '^' | '=' | '!' | '<' | '>' => {
                    self.lex_operator(ch)
                }
                _ => {
                    self.advance();
                    match ch {
                        '(' => TokenKind::LParen,
                        ')' => TokenKind::RParen,
                        '{' => TokenKind::LBrace,
                        '}' => TokenKind::RBrace,
                        '[' => TokenKind::LBracket,
                        ']' => TokenKind::RBracket,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        other => TokenKind::Unknown(other),
                    }
                }
            }
        };

        Token {
            kind,
            start,
            end: self.pos,
        }
    }

    /// Lex the whole input, excluding the trailing `Eof`
    pub fn tokens(self) -> Vec<Token> {
        self.collect()
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
            None
        } else {
            Some(token)
        }
    }
}

/// Lex `text` into tokens, excluding `Eof`
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token> {
    Lexer::new(text).tokens()
}
