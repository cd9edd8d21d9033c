use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Pipe,           // |
    RedirectIn,     // <
    RedirectOut,    // >
    RedirectAppend, // >>
    And,            // &&
    Or,             // ||
    Semicolon,      // ;
    Background,     // &
    LParen,         // (
    RParen,         // )
    Eof,
}

impl TokenKind {
    /// The source spelling of an operator token.
    pub fn symbol(&self) -> &'static str {
        match self {
            TokenKind::Word => "word",
            TokenKind::Pipe => "|",
            TokenKind::RedirectIn => "<",
            TokenKind::RedirectOut => ">",
            TokenKind::RedirectAppend => ">>",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Semicolon => ";",
            TokenKind::Background => "&",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Eof => "end of input",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Unquoted word text; `None` for every operator and for EOF.
    pub text: Option<String>,
    /// Position info [start, end) in chars
    pub span: (usize, usize),
}

impl Token {
    pub fn word(text: impl Into<String>, span: (usize, usize)) -> Self {
        Token {
            kind: TokenKind::Word,
            text: Some(text.into()),
            span,
        }
    }

    pub fn operator(kind: TokenKind, span: (usize, usize)) -> Self {
        Token {
            kind,
            text: None,
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "{}", self.kind.symbol()),
        }
    }
}
