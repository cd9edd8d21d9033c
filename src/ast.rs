use std::fmt::{self, Write};

/// One parsed command line. Built once by the parser, then only borrowed.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    Command(CommandNode),
    Pipe(Box<AstNode>, Box<AstNode>),
    And(Box<AstNode>, Box<AstNode>),
    Or(Box<AstNode>, Box<AstNode>),
    Sequence(Box<AstNode>, Box<AstNode>),
    Background(Box<AstNode>),
    Subshell(Box<AstNode>),
}

/// A simple command. `name` is the program, so argv is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    pub name: String,
    pub args: Vec<String>,
    pub input: Option<String>,
    pub output: Option<OutputRedirect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRedirect {
    pub file: String,
    pub append: bool,
}

impl CommandNode {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        CommandNode {
            name: name.into(),
            args,
            input: None,
            output: None,
        }
    }

    pub fn with_input(mut self, file: impl Into<String>) -> Self {
        self.input = Some(file.into());
        self
    }

    pub fn with_output(mut self, file: impl Into<String>, append: bool) -> Self {
        self.output = Some(OutputRedirect {
            file: file.into(),
            append,
        });
        self
    }

    /// Program name followed by its arguments.
    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

impl AstNode {
    pub fn command(name: &str, args: &[&str]) -> AstNode {
        AstNode::Command(CommandNode::new(
            name,
            args.iter().map(|a| a.to_string()).collect(),
        ))
    }

    /// Indented tree view, one node per line.
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, level: usize) {
        for _ in 0..level {
            out.push_str("  ");
        }
        let children: Vec<&AstNode> = match self {
            AstNode::Command(cmd) => {
                out.push_str("COMMAND:");
                for arg in cmd.argv() {
                    let _ = write!(out, " {}", arg);
                }
                if let Some(input) = &cmd.input {
                    let _ = write!(out, " < {}", input);
                }
                if let Some(output) = &cmd.output {
                    let op = if output.append { ">>" } else { ">" };
                    let _ = write!(out, " {} {}", op, output.file);
                }
                vec![]
            }
            AstNode::Pipe(l, r) => {
                out.push_str("PIPE");
                vec![l.as_ref(), r.as_ref()]
            }
            AstNode::And(l, r) => {
                out.push_str("AND");
                vec![l.as_ref(), r.as_ref()]
            }
            AstNode::Or(l, r) => {
                out.push_str("OR");
                vec![l.as_ref(), r.as_ref()]
            }
            AstNode::Sequence(l, r) => {
                out.push_str("SEQUENCE");
                vec![l.as_ref(), r.as_ref()]
            }
            AstNode::Background(inner) => {
                out.push_str("BACKGROUND");
                vec![inner.as_ref()]
            }
            AstNode::Subshell(inner) => {
                out.push_str("SUBSHELL");
                vec![inner.as_ref()]
            }
        };
        out.push('\n');
        for child in children {
            child.dump_into(out, level + 1);
        }
    }
}

fn needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word
            .chars()
            .any(|c| c.is_whitespace() || "|&;<>()'\"\\".contains(c))
}

// Quoted text is taken verbatim by the lexer, so words holding a quote or
// a backslash are escaped character by character instead.
fn write_word(f: &mut fmt::Formatter<'_>, word: &str) -> fmt::Result {
    if !needs_quoting(word) {
        return f.write_str(word);
    }
    if !word.contains(['\'', '\\']) {
        return write!(f, "'{}'", word);
    }
    for c in word.chars() {
        if c.is_whitespace() || "|&;<>()'\"\\".contains(c) {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.argv().enumerate() {
            if i > 0 {
                f.write_char(' ')?;
            }
            write_word(f, arg)?;
        }
        if let Some(input) = &self.input {
            f.write_str(" < ")?;
            write_word(f, input)?;
        }
        if let Some(output) = &self.output {
            f.write_str(if output.append { " >> " } else { " > " })?;
            write_word(f, &output.file)?;
        }
        Ok(())
    }
}

/// Renders the tree back into command-line syntax.
impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::Command(cmd) => write!(f, "{}", cmd),
            AstNode::Pipe(l, r) => write!(f, "{} | {}", l, r),
            AstNode::And(l, r) => write!(f, "{} && {}", l, r),
            AstNode::Or(l, r) => write!(f, "{} || {}", l, r),
            AstNode::Sequence(l, r) => write!(f, "{}; {}", l, r),
            AstNode::Background(inner) => write!(f, "{} &", inner),
            AstNode::Subshell(inner) => write!(f, "({})", inner),
        }
    }
}
