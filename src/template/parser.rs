//! Parser: token stream → [`Template`].
//!
//! Compile errors carry the line and column of the offending token. Function
//! names are checked against the callable set at parse time, and variables
//! must be declared before use, so a typo fails before anything executes.

use super::ast::{Branch, Command, Node, Operand, Pipeline, Template};
use super::error::{Result, TemplateError};
use super::lexer::{Keyword, Number, Token, TokenKind, parse_number, tokenize};

/// Parse `source` into a template.
///
/// `is_function` reports whether a bare identifier names a callable.
pub fn parse(source: &str, is_function: &dyn Fn(&str) -> bool) -> Result<Template> {
    Parser {
        source,
        tokens: tokenize(source),
        pos: 0,
        is_function,
        vars: vec!["$".to_string()],
        range_depth: 0,
    }
    .parse_template()
}

/// What ended a list of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Eof,
    End,
    Else,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchKind {
    If,
    Range,
    With,
}

impl BranchKind {
    fn keyword(self) -> Keyword {
        match self {
            BranchKind::If => Keyword::If,
            BranchKind::Range => Keyword::Range,
            BranchKind::With => Keyword::With,
        }
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    is_function: &'a dyn Fn(&str) -> bool,
    vars: Vec<String>,
    range_depth: usize,
}

impl Parser<'_> {
    fn parse_template(mut self) -> Result<Template> {
        let (nodes, terminator, token) = self.parse_list()?;
        match terminator {
            Terminator::Eof => Ok(Template { nodes }),
            Terminator::End => Err(self.error_at(&token, "unexpected {{end}}")),
            Terminator::Else => Err(self.error_at(&token, "unexpected {{else}}")),
        }
    }

    // The token stream always ends in Eof or Error, so peeking past the end
    // keeps returning that final token.
    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[(self.pos + offset).min(last)]
    }

    fn next(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn last_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].end
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> TemplateError {
        TemplateError::compile(self.source, token.start, message)
    }

    /// Error for a token that cannot appear here.
    fn unexpected(&self, token: &Token, context: &str) -> TemplateError {
        match token.kind {
            TokenKind::Error => self.error_at(token, token.value.clone()),
            TokenKind::Eof => self.error_at(token, format!("unclosed action in {}", context)),
            _ => self.error_at(
                token,
                format!("unexpected {} in {}", describe(token), context),
            ),
        }
    }

    fn expect_right_delim(&mut self, context: &str) -> Result<()> {
        let token = self.next();
        if token.kind == TokenKind::RightDelim {
            Ok(())
        } else {
            Err(self.unexpected(&token, context))
        }
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Terminator, Token)> {
        let mut nodes = Vec::new();
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::Text => nodes.push(Node::Text(token.value)),
                TokenKind::LeftDelim => {
                    let head = self.peek().clone();
                    match head.kind {
                        TokenKind::Comment => {
                            self.next();
                            self.expect_right_delim("comment")?;
                        }
                        TokenKind::Keyword(Keyword::End) => {
                            self.next();
                            self.expect_right_delim("end")?;
                            return Ok((nodes, Terminator::End, head));
                        }
                        TokenKind::Keyword(Keyword::Else) => {
                            self.next();
                            return Ok((nodes, Terminator::Else, head));
                        }
                        TokenKind::Keyword(Keyword::If) => {
                            self.next();
                            nodes.push(Node::If(self.parse_branch(BranchKind::If)?));
                        }
                        TokenKind::Keyword(Keyword::Range) => {
                            self.next();
                            nodes.push(Node::Range(self.parse_branch(BranchKind::Range)?));
                        }
                        TokenKind::Keyword(Keyword::With) => {
                            self.next();
                            nodes.push(Node::With(self.parse_branch(BranchKind::With)?));
                        }
                        TokenKind::Keyword(keyword @ (Keyword::Break | Keyword::Continue)) => {
                            if self.range_depth == 0 {
                                return Err(self.error_at(
                                    &head,
                                    format!("{{{{{}}}}} outside {{{{range}}}}", keyword.as_str()),
                                ));
                            }
                            self.next();
                            self.expect_right_delim(keyword.as_str())?;
                            nodes.push(if keyword == Keyword::Break {
                                Node::Break
                            } else {
                                Node::Continue
                            });
                        }
                        TokenKind::Keyword(keyword) => {
                            return Err(self.error_at(
                                &head,
                                format!("unsupported action {{{{{}}}}}", keyword.as_str()),
                            ));
                        }
                        TokenKind::RightDelim => {
                            return Err(self.error_at(&head, "missing value for command"));
                        }
                        _ => {
                            let pipe = self.parse_pipeline("command", TokenKind::RightDelim)?;
                            self.expect_right_delim("command")?;
                            nodes.push(Node::Action(pipe));
                        }
                    }
                }
                TokenKind::Eof => return Ok((nodes, Terminator::Eof, token)),
                _ => return Err(self.unexpected(&token, "template")),
            }
        }
    }

    /// Parse the rest of an `if`/`range`/`with` after its keyword.
    fn parse_branch(&mut self, kind: BranchKind) -> Result<Branch> {
        let context = kind.keyword().as_str();
        let vars_mark = self.vars.len();

        let pipe = self.parse_pipeline(context, TokenKind::RightDelim)?;
        self.expect_right_delim(context)?;

        if kind == BranchKind::Range {
            self.range_depth += 1;
        }
        let body = self.parse_body();
        if kind == BranchKind::Range {
            self.range_depth -= 1;
        }
        let (list, terminator, token) = body?;

        let else_list = match terminator {
            Terminator::End => None,
            Terminator::Eof => return Err(self.error_at(&token, "unexpected EOF")),
            Terminator::Else => Some(self.parse_else(kind)?),
        };

        self.vars.truncate(vars_mark);
        Ok(Branch {
            pipe,
            list,
            else_list,
        })
    }

    /// Parse a branch body, scoping variables declared inside it.
    fn parse_body(&mut self) -> Result<(Vec<Node>, Terminator, Token)> {
        let mark = self.vars.len();
        let result = self.parse_list();
        self.vars.truncate(mark);
        result
    }

    /// Parse after `{{else`. `else if` and `else with` chain a nested
    /// branch that consumes the shared `{{end}}`.
    fn parse_else(&mut self, kind: BranchKind) -> Result<Vec<Node>> {
        let chained = match (kind, self.peek().kind) {
            (BranchKind::If, TokenKind::Keyword(Keyword::If)) => Some(BranchKind::If),
            (BranchKind::With, TokenKind::Keyword(Keyword::With)) => Some(BranchKind::With),
            _ => None,
        };

        if let Some(nested) = chained {
            self.next();
            let branch = self.parse_branch(nested)?;
            return Ok(vec![match nested {
                BranchKind::With => Node::With(branch),
                _ => Node::If(branch),
            }]);
        }

        self.expect_right_delim("else")?;
        let (list, terminator, token) = self.parse_body()?;
        match terminator {
            Terminator::End => Ok(list),
            Terminator::Else => Err(self.error_at(&token, "expected end; found {{else}}")),
            Terminator::Eof => Err(self.error_at(&token, "unexpected EOF")),
        }
    }

    fn parse_pipeline(&mut self, context: &str, end: TokenKind) -> Result<Pipeline> {
        let mut decl = Vec::new();
        let mut is_assign = false;

        if self.peek().kind == TokenKind::Variable {
            match self.peek_at(1).kind {
                TokenKind::Declare | TokenKind::Assign => {
                    decl.push(self.next().value);
                    is_assign = self.next().kind == TokenKind::Assign;
                }
                TokenKind::Comma if context == "range" => {
                    decl.push(self.next().value);
                    self.next();
                    let second = self.next();
                    if second.kind != TokenKind::Variable {
                        return Err(self.unexpected(&second, "range declaration"));
                    }
                    decl.push(second.value);
                    let op = self.next();
                    match op.kind {
                        TokenKind::Declare => {}
                        TokenKind::Assign => is_assign = true,
                        _ => return Err(self.unexpected(&op, "range declaration")),
                    }
                }
                _ => {}
            }
        }

        if is_assign {
            for name in &decl {
                if !self.vars.contains(name) {
                    let token = self.peek().clone();
                    return Err(self.error_at(&token, format!("undefined variable \"{}\"", name)));
                }
            }
        }

        let mut cmds = Vec::new();
        loop {
            let token = self.peek().clone();
            if token.kind == end {
                break;
            }
            if token.kind == TokenKind::Pipe {
                return Err(self.error_at(&token, "missing command before |"));
            }
            cmds.push(self.parse_command(end, context)?);

            let token = self.peek().clone();
            if token.kind == TokenKind::Pipe {
                self.next();
                if self.peek().kind == end {
                    let token = self.peek().clone();
                    return Err(self.error_at(&token, "missing command after |"));
                }
            } else if token.kind != end {
                return Err(self.unexpected(&token, context));
            }
        }

        if cmds.is_empty() {
            let token = self.peek().clone();
            return Err(self.error_at(&token, format!("missing value for {}", context)));
        }

        for (stage, cmd) in cmds.iter().enumerate().skip(1) {
            if cmd.args[0].is_literal() {
                let token = self.peek().clone();
                return Err(self.error_at(
                    &token,
                    format!("non executable command in pipeline stage {}", stage + 1),
                ));
            }
        }

        if !is_assign {
            self.vars.extend(decl.iter().cloned());
        }

        Ok(Pipeline {
            decl,
            is_assign,
            cmds,
        })
    }

    fn parse_command(&mut self, end: TokenKind, context: &str) -> Result<Command> {
        let mut args = Vec::new();
        loop {
            let token = self.peek().clone();
            if token.kind == end || token.kind == TokenKind::Pipe {
                break;
            }
            match token.kind {
                TokenKind::Identifier
                | TokenKind::Dot
                | TokenKind::Nil
                | TokenKind::Bool
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Char
                | TokenKind::Variable
                | TokenKind::Field
                | TokenKind::LeftParen => args.push(self.parse_operand()?),
                _ => return Err(self.unexpected(&token, context)),
            }
        }

        if args.is_empty() {
            let token = self.peek().clone();
            return Err(self.error_at(&token, "empty command"));
        }
        Ok(Command { args })
    }

    fn parse_operand(&mut self) -> Result<Operand> {
        let token = self.next();
        let mut operand = match token.kind {
            TokenKind::Identifier => {
                if !(self.is_function)(&token.value) {
                    return Err(
                        self.error_at(&token, format!("function \"{}\" not defined", token.value))
                    );
                }
                Operand::Function(token.value.clone())
            }
            TokenKind::Dot => Operand::Dot,
            TokenKind::Nil => Operand::Nil,
            TokenKind::Bool => Operand::Bool(token.value == "true"),
            TokenKind::Number => match parse_number(&token.value) {
                Some(Number::Int(i)) => Operand::Int(i),
                Some(Number::Float(f)) => Operand::Float(f),
                None => {
                    return Err(self.error_at(
                        &token,
                        format!("bad number syntax: {:?}", token.value),
                    ));
                }
            },
            TokenKind::String => Operand::String(token.value.clone()),
            TokenKind::Char => {
                Operand::Int(token.value.chars().next().map(|c| c as i64).unwrap_or(0))
            }
            TokenKind::Variable => {
                if !self.vars.contains(&token.value) {
                    return Err(
                        self.error_at(&token, format!("undefined variable \"{}\"", token.value))
                    );
                }
                Operand::Variable {
                    name: token.value.clone(),
                    fields: Vec::new(),
                }
            }
            TokenKind::Field => Operand::Field(vec![token.value.clone()]),
            TokenKind::LeftParen => {
                let pipe = self.parse_pipeline("parenthesized pipeline", TokenKind::RightParen)?;
                let close = self.next();
                if close.kind != TokenKind::RightParen {
                    return Err(self.unexpected(&close, "parenthesized pipeline"));
                }
                Operand::Pipe {
                    pipe: Box::new(pipe),
                    fields: Vec::new(),
                }
            }
            _ => return Err(self.unexpected(&token, "operand")),
        };

        while self.peek().kind == TokenKind::Field && self.peek().start == self.last_end() {
            let field = self.next();
            match &mut operand {
                Operand::Field(names)
                | Operand::Variable { fields: names, .. }
                | Operand::Pipe { fields: names, .. } => names.push(field.value),
                _ => return Err(self.error_at(&field, "unexpected . after term")),
            }
        }

        Ok(operand)
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::Keyword(keyword) => format!("<{}>", keyword.as_str()),
        TokenKind::RightDelim => "\"}}\"".to_string(),
        TokenKind::LeftDelim => "\"{{\"".to_string(),
        TokenKind::Field => format!("<.{}>", token.value),
        TokenKind::String => format!("{:?}", token.value),
        _ => format!("<{}>", token.value),
    }
}
