use log::trace;
use thiserror::Error;

use super::token::{Token, TokenKind};

#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum LexError {
    #[error("unknown symbol {symbol:?} at position {pos}")]
    UnknownSymbol { symbol: char, pos: usize },
    #[error("unterminated quote '{quote}' starting at position {pos}")]
    UnterminatedQuote { quote: char, pos: usize },
}

const OPERATOR_CHARS: &[char] = &['|', '&', ';', '<', '>', '(', ')'];

fn is_operator_char(ch: char) -> bool {
    OPERATOR_CHARS.contains(&ch)
}

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Scans the next token. Once the input is exhausted every call yields EOF.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.get(self.pos) else {
            return Ok(Token::operator(TokenKind::Eof, (self.pos, self.pos)));
        };
        let next = self.chars.get(self.pos + 1).copied();

        let kind = match (ch, next) {
            ('&', Some('&')) => Some(TokenKind::And),
            ('|', Some('|')) => Some(TokenKind::Or),
            ('>', Some('>')) => Some(TokenKind::RedirectAppend),
            ('|', _) => Some(TokenKind::Pipe),
            ('&', _) => Some(TokenKind::Background),
            (';', _) => Some(TokenKind::Semicolon),
            ('<', _) => Some(TokenKind::RedirectIn),
            ('>', _) => Some(TokenKind::RedirectOut),
            ('(', _) => Some(TokenKind::LParen),
            (')', _) => Some(TokenKind::RParen),
            _ => None,
        };

        let token = match kind {
            Some(kind) => {
                let start = self.pos;
                self.pos += kind.symbol().len();
                Token::operator(kind, (start, self.pos))
            }
            None => self.read_word()?,
        };
        trace!("token {:?}", token);
        Ok(token)
    }

    pub fn tokenize_all(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    // A word is a run of unquoted characters and quoted segments glued together.
    fn read_word(&mut self) -> Result<Token, LexError> {
        let start = self.pos;
        let mut buf = String::new();

        while let Some(&ch) = self.chars.get(self.pos) {
            match ch {
                c if c.is_whitespace() || is_operator_char(c) => break,
                '\\' => {
                    self.pos += 1;
                    match self.chars.get(self.pos) {
                        Some(&escaped) => {
                            buf.push(escaped);
                            self.pos += 1;
                        }
                        None => buf.push('\\'),
                    }
                }
                '\'' | '"' => self.read_quoted(ch, &mut buf)?,
                c if c.is_control() => {
                    return Err(LexError::UnknownSymbol {
                        symbol: c,
                        pos: self.pos,
                    });
                }
                c => {
                    buf.push(c);
                    self.pos += 1;
                }
            }
        }

        Ok(Token::word(buf, (start, self.pos)))
    }

    fn read_quoted(&mut self, quote: char, buf: &mut String) -> Result<(), LexError> {
        let open = self.pos;
        self.pos += 1; // Skip the opening quote

        loop {
            let Some(&ch) = self.chars.get(self.pos) else {
                return Err(LexError::UnterminatedQuote { quote, pos: open });
            };
            self.pos += 1;
            if ch == quote {
                return Ok(());
            }
            // Quoted text is verbatim; a backslash only keeps the next
            // character from closing the segment.
            if ch == '\\' {
                let Some(&escaped) = self.chars.get(self.pos) else {
                    return Err(LexError::UnterminatedQuote { quote, pos: open });
                };
                buf.push('\\');
                buf.push(escaped);
                self.pos += 1;
            } else {
                buf.push(ch);
            }
        }
    }
}
