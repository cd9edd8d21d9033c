use crate::ast::{AstNode, CommandNode, OutputRedirect};
use crate::lexer::{Token, TokenKind};
use crate::parser::{ParseError, Parser};

pub struct DefaultParser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> DefaultParser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().map_or(TokenKind::Eof, |t| t.kind)
    }

    fn next(&mut self) -> Option<&'a Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn consume(&mut self, kind: TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // Describes the lookahead token for error messages.
    fn found(&self) -> (String, usize) {
        match self.peek() {
            Some(tok) => (tok.to_string(), tok.span.0),
            None => {
                let end = self.tokens.last().map_or(0, |t| t.span.1);
                (TokenKind::Eof.symbol().to_string(), end)
            }
        }
    }

    fn expect_word(&mut self, operator: &'static str) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Word,
                text: Some(text),
                ..
            }) => {
                self.pos += 1;
                Ok(text.clone())
            }
            _ => {
                let (_, pos) = self.found();
                Err(ParseError::ExpectedFilename { operator, pos })
            }
        }
    }
}

// Top-down recursive descent parser
impl<'a> Parser for DefaultParser<'a> {
    fn parse(&mut self) -> Result<AstNode, ParseError> {
        let node = self.parse_expression()?;
        match self.peek_kind() {
            TokenKind::Eof => Ok(node),
            TokenKind::RParen => {
                let (_, pos) = self.found();
                Err(ParseError::UnmatchedParen { pos })
            }
            _ => {
                let (found, pos) = self.found();
                Err(ParseError::UnexpectedToken { found, pos })
            }
        }
    }
}

impl<'a> DefaultParser<'a> {
    // expression := sequence_or_bg | ε
    fn parse_expression(&mut self) -> Result<AstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::Eof | TokenKind::RParen => Err(ParseError::EmptyExpression),
            _ => self.parse_sequence(),
        }
    }

    // sequence_or_bg := and_or ( ';' sequence_or_bg | '&' )?
    fn parse_sequence(&mut self) -> Result<AstNode, ParseError> {
        let node = self.parse_and_or()?;
        if self.consume(TokenKind::Semicolon) {
            let rhs = self.parse_sequence()?;
            Ok(AstNode::Sequence(Box::new(node), Box::new(rhs)))
        } else if self.consume(TokenKind::Background) {
            Ok(AstNode::Background(Box::new(node)))
        } else {
            Ok(node)
        }
    }

    // and_or := pipeline ( ('&&' | '||') and_or )?
    fn parse_and_or(&mut self) -> Result<AstNode, ParseError> {
        let node = self.parse_pipeline()?;
        if self.consume(TokenKind::And) {
            let rhs = self.parse_and_or()?;
            Ok(AstNode::And(Box::new(node), Box::new(rhs)))
        } else if self.consume(TokenKind::Or) {
            let rhs = self.parse_and_or()?;
            Ok(AstNode::Or(Box::new(node), Box::new(rhs)))
        } else {
            Ok(node)
        }
    }

    // pipeline := simple_or_subshell ( '|' pipeline )?
    fn parse_pipeline(&mut self) -> Result<AstNode, ParseError> {
        let node = self.parse_command_like()?;
        if self.consume(TokenKind::Pipe) {
            let rhs = self.parse_pipeline()?;
            Ok(AstNode::Pipe(Box::new(node), Box::new(rhs)))
        } else {
            Ok(node)
        }
    }

    // build "pipe elements": a subshell or a simple command
    fn parse_command_like(&mut self) -> Result<AstNode, ParseError> {
        if self.peek_kind() == TokenKind::LParen {
            let (_, open) = self.found();
            self.pos += 1;
            let inner = self.parse_expression()?;
            return match self.peek_kind() {
                TokenKind::RParen => {
                    self.pos += 1;
                    Ok(AstNode::Subshell(Box::new(inner)))
                }
                TokenKind::Eof => Err(ParseError::UnmatchedParen { pos: open }),
                _ => {
                    let (found, pos) = self.found();
                    Err(ParseError::UnexpectedToken { found, pos })
                }
            };
        }

        let name = match self.peek() {
            Some(Token {
                kind: TokenKind::Word,
                text: Some(text),
                ..
            }) => text.clone(),
            _ => {
                let (found, pos) = self.found();
                return Err(ParseError::ExpectedCommand { found, pos });
            }
        };
        self.pos += 1;

        let mut cmd = CommandNode::new(name, Vec::new());
        loop {
            match self.peek_kind() {
                TokenKind::Word => {
                    if let Some(text) = self.next().and_then(|t| t.text.clone()) {
                        cmd.args.push(text);
                    }
                }
                TokenKind::RedirectIn => {
                    self.pos += 1;
                    cmd.input = Some(self.expect_word("<")?);
                }
                TokenKind::RedirectOut | TokenKind::RedirectAppend => {
                    let append = self.peek_kind() == TokenKind::RedirectAppend;
                    self.pos += 1;
                    let file = self.expect_word(if append { ">>" } else { ">" })?;
                    cmd.output = Some(OutputRedirect { file, append });
                }
                _ => break,
            }
        }
        Ok(AstNode::Command(cmd))
    }
}
