//! Structural pre-check run on the raw line before it is tokenized.
//!
//! The lexer trusts its input to have balanced quotes, and the parser
//! reports a stray `)` late and without context, so both conditions are
//! rejected here in a single pass.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unclosed quote '{quote}' starting at position {pos}")]
    UnclosedQuote { quote: char, pos: usize },
    #[error("imbalanced parenthesis at position {pos}")]
    ImbalancedParens { pos: usize },
}

/// Checks quote and parenthesis balance.
///
/// A backslash suppresses whatever follows it, inside or outside quotes.
/// A quote character of one kind is literal while inside the other kind.
/// Parentheses only count outside quotes.
pub fn validate(line: &str) -> Result<(), ValidationError> {
    let mut open_quote: Option<(char, usize)> = None;
    let mut open_parens: Vec<usize> = Vec::new();
    let mut escaped = false;

    for (pos, ch) in line.chars().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match (open_quote, ch) {
            (_, '\\') => escaped = true,
            (Some((quote, _)), c) if c == quote => open_quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => open_quote = Some((ch, pos)),
            (None, '(') => open_parens.push(pos),
            (None, ')') => {
                if open_parens.pop().is_none() {
                    return Err(ValidationError::ImbalancedParens { pos });
                }
            }
            (None, _) => {}
        }
    }

    if let Some((quote, pos)) = open_quote {
        return Err(ValidationError::UnclosedQuote { quote, pos });
    }
    if let Some(&pos) = open_parens.last() {
        return Err(ValidationError::ImbalancedParens { pos });
    }
    Ok(())
}
