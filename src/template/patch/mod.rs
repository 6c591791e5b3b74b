//! Rewriting templates into an unambiguous form before execution.
//!
//! Authors write one flat dot notation, but a reference may mean a field of
//! the caller's local context, a reserved global, an environment variable,
//! or a computed segment. The executed namespace keeps these apart (the
//! local context lives under `Data`), so each top-level reference is
//! rewritten to say which one it means:
//!
//! | written              | patched                            |
//! |----------------------|------------------------------------|
//! | `.Env.HOME`          | `(call .Getenv "HOME")`            |
//! | `.Segments.Git.Repo` | `(.Segments.MustGet "Git").Repo`   |
//! | `.Segments.Contains` | unchanged                          |
//! | `.$.OS`              | `.OS`                              |
//! | `.OS` (local field)  | `.Data.OS`                         |
//! | `.OS` (no such field)| unchanged                          |
//! | `.Name`              | `.Data.Name`                       |
//!
//! # Scanning
//!
//! The template is tokenized with the same lexer the parser uses, so dots in
//! literal text, strings, and comments are never touched. A reference starts
//! at a `.Field` or `.` that does not directly continue a preceding operand
//! (`$x.Name`, `(pipe).Name`). Rewrites are spliced into a copy of the
//! source by byte span; everything else is copied verbatim, which makes
//! templates without references come back unchanged.
//!
//! # Scopes
//!
//! Inside the body of `range` and `with` the dot is the current element, so
//! bare references there are left alone and the reserved forms are rooted
//! at `$` instead: `$.OS`, `(call $.Getenv "K")`, `($.Segments.MustGet "N")`.
//! The `else` branch of `range`/`with` runs in the enclosing scope.
//!
//! Patching is idempotent: the forms it produces are themselves left
//! untouched by a second pass.

use super::lexer::{Keyword, Token, TokenKind, tokenize};
use super::namespace::{
    DATA, ENV, GETENV, MUST_GET, RESERVED_SCALARS, SEGMENTS, is_segments_method,
};
use super::value::Fields;

#[cfg(test)]
mod tests;

/// Rewrite `template` for execution with `context` as its local context.
///
/// Never fails: a template whose syntax is broken is patched up to the
/// point the lexer gave up and copied verbatim after it, leaving the
/// compile step to report the error.
pub fn patch(template: &str, context: &dyn Fields) -> String {
    let tokens = tokenize(template);
    let mut patcher = Patcher {
        source: template,
        tokens: &tokens,
        context,
        out: String::with_capacity(template.len() + 16),
        copied: 0,
        scopes: Vec::new(),
    };
    patcher.run();
    patcher.out.push_str(&template[patcher.copied..]);
    patcher.out
}

/// One open `if`, `range`, or `with` block.
struct Frame {
    /// Whether dot is the block's element rather than the enclosing dot.
    element_dot: bool,
}

struct Patcher<'a> {
    source: &'a str,
    tokens: &'a [Token],
    context: &'a dyn Fields,
    out: String,
    /// Byte offset up to which `source` has been written to `out`.
    copied: usize,
    scopes: Vec<Frame>,
}

impl<'a> Patcher<'a> {
    fn run(&mut self) {
        let tokens = self.tokens;
        let mut i = 0;
        let mut first_in_action = false;
        let mut enter_on_close = false;

        while let Some(token) = tokens.get(i) {
            match token.kind {
                TokenKind::Error | TokenKind::Eof => return,
                TokenKind::LeftDelim => {
                    first_in_action = true;
                    i += 1;
                    continue;
                }
                TokenKind::RightDelim => {
                    if enter_on_close && let Some(top) = self.scopes.last_mut() {
                        top.element_dot = true;
                    }
                    enter_on_close = false;
                    i += 1;
                    continue;
                }
                TokenKind::Keyword(keyword) if first_in_action => {
                    enter_on_close = self.open_or_close(keyword, i);
                    i += 1;
                }
                TokenKind::Field if !self.continues(i) => i = self.patch_field(i),
                TokenKind::Dot if !self.continues(i) => i = self.patch_dot(i),
                TokenKind::Variable if token.value == "$" && !self.continues(i) => {
                    i = self.patch_root_variable(i)
                }
                _ => i += 1,
            }
            first_in_action = false;
        }
    }

    /// Track block structure for the keyword opening an action. Returns
    /// whether dot becomes the element once the action closes.
    fn open_or_close(&mut self, keyword: Keyword, i: usize) -> bool {
        match keyword {
            Keyword::If => {
                self.scopes.push(Frame { element_dot: false });
                false
            }
            Keyword::Range | Keyword::With => {
                self.scopes.push(Frame { element_dot: false });
                true
            }
            Keyword::Else => {
                if let Some(top) = self.scopes.last_mut() {
                    top.element_dot = false;
                }
                matches!(
                    self.tokens.get(i + 1).map(|t| t.kind),
                    Some(TokenKind::Keyword(Keyword::With))
                )
            }
            Keyword::End => {
                self.scopes.pop();
                false
            }
            _ => false,
        }
    }

    fn nested(&self) -> bool {
        self.scopes.iter().any(|frame| frame.element_dot)
    }

    /// Root expression for reserved names in the current scope.
    fn root(&self) -> &'static str {
        if self.nested() { "$" } else { "" }
    }

    /// Whether token `i` continues the operand directly before it.
    fn continues(&self, i: usize) -> bool {
        i.checked_sub(1)
            .and_then(|prev| self.tokens.get(prev))
            .is_some_and(|prev| prev.continues_chain() && prev.is_adjacent_to(&self.tokens[i]))
    }

    /// Collect the adjacent `.Field` tokens starting at `i`. Returns the
    /// names, the index after the chain, and the chain's end offset.
    fn chain(&self, i: usize) -> (Vec<&'a str>, usize, usize) {
        let tokens = self.tokens;
        let mut names = vec![tokens[i].value.as_str()];
        let mut j = i + 1;
        while let Some(next) = tokens.get(j) {
            if next.kind != TokenKind::Field || !tokens[j - 1].is_adjacent_to(next) {
                break;
            }
            names.push(next.value.as_str());
            j += 1;
        }
        (names, j, tokens[j - 1].end)
    }

    fn replace(&mut self, start: usize, end: usize, replacement: &str) {
        self.out.push_str(&self.source[self.copied..start]);
        self.out.push_str(replacement);
        self.copied = end;
    }

    /// `.A.B...`
    fn patch_field(&mut self, i: usize) -> usize {
        let (names, next, end) = self.chain(i);
        if let Some(rewritten) = self.rewrite_dot_chain(&names) {
            let start = self.tokens[i].start;
            self.replace(start, end, &rewritten);
        }
        next
    }

    fn rewrite_dot_chain(&self, names: &[&str]) -> Option<String> {
        let nested = self.nested();
        if let Some(reserved) = reserved_form(names, self.root()) {
            return Some(reserved);
        }

        let first = names[0];
        let written = fields(names);
        if first == ENV || first == SEGMENTS {
            return nested.then(|| format!("${}", written));
        }
        if nested {
            return None;
        }
        if self.context.has_field(first) {
            return Some(format!(".{}{}", DATA, written));
        }
        if RESERVED_SCALARS.contains(&first) || first == DATA || first == GETENV {
            return None;
        }
        Some(format!(".{}{}", DATA, written))
    }

    /// `.` alone, or the explicit-global escape `.$` / `.$.X`.
    fn patch_dot(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let dot = &tokens[i];
        let escape = tokens
            .get(i + 1)
            .filter(|next| next.kind == TokenKind::Variable && next.value == "$" && dot.is_adjacent_to(next));

        let Some(dollar) = escape else {
            if !self.nested() {
                self.replace(dot.start, dot.end, &format!(".{}", DATA));
            }
            return i + 1;
        };

        let field_follows = tokens
            .get(i + 2)
            .is_some_and(|next| next.kind == TokenKind::Field && dollar.is_adjacent_to(next));
        if !field_follows {
            self.replace(dot.start, dollar.end, "$");
            return i + 2;
        }

        let (names, next, end) = self.chain(i + 2);
        let root = self.root();
        let rewritten =
            reserved_form(&names, root).unwrap_or_else(|| format!("{}{}", root, fields(&names)));
        self.replace(dot.start, end, &rewritten);
        next
    }

    /// `$.Env.K` and `$.Segments.N` get the same treatment as their dotted
    /// forms; other `$` chains already say what they mean.
    fn patch_root_variable(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let dollar = &tokens[i];
        let field_follows = tokens
            .get(i + 1)
            .is_some_and(|next| next.kind == TokenKind::Field && dollar.is_adjacent_to(next));
        if !field_follows {
            return i + 1;
        }

        let (names, next, end) = self.chain(i + 1);
        if let Some(rewritten) = reserved_form(&names, "$") {
            self.replace(dollar.start, end, &rewritten);
        }
        next
    }
}

/// `.A.B` for `["A", "B"]`.
fn fields(names: &[&str]) -> String {
    names.iter().map(|name| format!(".{}", name)).collect()
}

/// The rewritten form of an `Env` or `Segments` chain rooted at `root`.
fn reserved_form(names: &[&str], root: &str) -> Option<String> {
    match names {
        [ENV, key, rest @ ..] => Some(format!(
            "(call {}.{} \"{}\"){}",
            root,
            GETENV,
            key,
            fields(rest)
        )),
        [SEGMENTS, name, rest @ ..] if !is_segments_method(name) => Some(format!(
            "({}.{}.{} \"{}\"){}",
            root,
            SEGMENTS,
            MUST_GET,
            name,
            fields(rest)
        )),
        _ => None,
    }
}
