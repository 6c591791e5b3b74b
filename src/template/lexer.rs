//! Lexical scan of template text.
//!
//! Splits a template into literal text and the tokens of each `{{ ... }}`
//! action. Both the patcher and the parser work from this token stream, so
//! a dot inside prose, a string literal, or a comment is never mistaken for
//! a field reference.
//!
//! Every token records its byte span in the source. Two tokens are
//! *adjacent* when one ends exactly where the next starts; that is how
//! `.A.B` (one chain) is told apart from `.A .B` (two operands).
//!
//! Literal text, delimiters, and comments are split off by hand; the tokens
//! inside an action come from a `logos` lexer.
//!
//! Lexing stops at the first error, which is emitted as a final
//! [`TokenKind::Error`] token carrying the message.

use logos::Logos;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";
const TRIM_RIGHT_DELIM: &str = "-}}";
const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Keywords recognized at the start of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
    End,
    Range,
    With,
    Break,
    Continue,
    Define,
    Template,
    Block,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        match word {
            "if" => Some(Keyword::If),
            "else" => Some(Keyword::Else),
            "end" => Some(Keyword::End),
            "range" => Some(Keyword::Range),
            "with" => Some(Keyword::With),
            "break" => Some(Keyword::Break),
            "continue" => Some(Keyword::Continue),
            "define" => Some(Keyword::Define),
            "template" => Some(Keyword::Template),
            "block" => Some(Keyword::Block),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::End => "end",
            Keyword::Range => "range",
            Keyword::With => "with",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::Define => "define",
            Keyword::Template => "template",
            Keyword::Block => "block",
        }
    }
}

/// Kinds of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal text outside actions (value is post-trim text).
    Text,
    /// `{{` or `{{- `.
    LeftDelim,
    /// `}}` or ` -}}`.
    RightDelim,
    /// `/* ... */` inside an action.
    Comment,
    /// `.Name` (value is `Name`).
    Field,
    /// A lone `.`.
    Dot,
    /// `$` or `$name` (value includes the `$`).
    Variable,
    /// A function name.
    Identifier,
    Keyword(Keyword),
    /// `true` or `false`.
    Bool,
    Nil,
    /// Quoted or raw string (value is the decoded content).
    String,
    /// Character constant (value is the decoded character).
    Char,
    Number,
    LeftParen,
    RightParen,
    Pipe,
    /// `:=`.
    Declare,
    /// `=`.
    Assign,
    Comma,
    /// Lexing failed; value is the message.
    Error,
    Eof,
}

/// A token with its byte span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Token {
    /// Whether `self` ends exactly where `next` begins.
    pub fn is_adjacent_to(&self, next: &Token) -> bool {
        self.end == next.start
    }

    /// Whether a `.Field` directly after this token continues its chain
    /// instead of starting a new reference.
    pub fn continues_chain(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Field
                | TokenKind::Dot
                | TokenKind::Variable
                | TokenKind::RightParen
                | TokenKind::Identifier
                | TokenKind::Bool
                | TokenKind::Nil
                | TokenKind::Number
                | TokenKind::String
                | TokenKind::Char
        )
    }
}

/// Tokenize `source` completely.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

/// Tokens inside an action. Words are classified into keywords, literals,
/// and identifiers after matching.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum ActionToken {
    #[regex(r"[ \t\r\n]+")]
    Space,

    #[token("}}")]
    RightDelim,

    // Only after a space; trims the whitespace that follows the action.
    #[token("-}}")]
    TrimRightDelim,

    #[regex(r"\.[\p{L}_][\p{L}\p{N}_]*")]
    Field,

    #[token(".")]
    Dot,

    #[regex(r"\$[\p{L}\p{N}_]*")]
    Variable,

    #[regex(r"[\p{L}_][\p{L}\p{N}_]*")]
    Word,

    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    Quoted,

    #[regex(r"`[^`]*`")]
    RawQuoted,

    #[regex(r"'([^'\\\n]|\\[^\n][^'\n]*)'")]
    Char,

    // Validated by `parse_number`; the pattern only decides where it ends.
    #[regex(r"[+-]?\.?[0-9]([0-9A-Za-z_.]|[eEpP][+-])*")]
    Number,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("|")]
    Pipe,
    #[token(",")]
    Comma,
    #[token(":=")]
    Declare,
    #[token("=")]
    Assign,
}

struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    trim_next_text: bool,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
            trim_next_text: false,
        }
    }

    fn run(mut self) -> Vec<Token> {
        while self.lex_text() {
            if !self.lex_action() {
                return self.tokens;
            }
        }
        let end = self.source.len();
        self.push(TokenKind::Eof, String::new(), end, end);
        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn push(&mut self, kind: TokenKind, value: String, start: usize, end: usize) {
        self.tokens.push(Token {
            kind,
            value,
            start,
            end,
        });
    }

    fn error(&mut self, message: impl Into<String>) -> bool {
        let pos = self.pos;
        self.push(TokenKind::Error, message.into(), pos, pos);
        false
    }

    /// Emit text up to the next left delimiter. Returns false at end of input.
    fn lex_text(&mut self) -> bool {
        let start = self.pos;
        let (text_end, found) = match self.rest().find(LEFT_DELIM) {
            Some(offset) => (start + offset, true),
            None => (self.source.len(), false),
        };

        let mut text = &self.source[start..text_end];
        if self.trim_next_text {
            text = text.trim_start();
            self.trim_next_text = false;
        }
        if found && has_left_trim_marker(&self.source[text_end + LEFT_DELIM.len()..]) {
            text = text.trim_end();
        }
        if !text.is_empty() {
            self.push(TokenKind::Text, text.to_string(), start, text_end);
        }

        self.pos = text_end;
        found
    }

    /// Emit the tokens of one action, starting at its left delimiter.
    fn lex_action(&mut self) -> bool {
        let start = self.pos;
        self.pos += LEFT_DELIM.len();
        if has_left_trim_marker(self.rest()) {
            self.pos += 1;
        }
        let delim_end = self.pos;
        self.push(TokenKind::LeftDelim, String::new(), start, delim_end);

        let after_space = self.rest().trim_start();
        let skipped = self.rest().len() - after_space.len();
        if after_space.starts_with(LEFT_COMMENT) {
            self.pos += skipped;
            return self.lex_comment();
        }

        let base = self.pos;
        let rest = self.rest();
        let mut follows_space = false;
        for (token, span) in ActionToken::lexer(rest).spanned() {
            let text = &rest[span.clone()];
            let (start, end) = (base + span.start, base + span.end);
            let Ok(token) = token else {
                self.pos = start;
                return self.error(action_error(&rest[span.start..]));
            };
            let spaced = std::mem::replace(&mut follows_space, token == ActionToken::Space);

            let kind = match token {
                ActionToken::Space => continue,
                ActionToken::TrimRightDelim if !spaced => {
                    self.pos = start;
                    return self.error(action_error(text));
                }
                ActionToken::RightDelim | ActionToken::TrimRightDelim => {
                    self.push(TokenKind::RightDelim, String::new(), start, end);
                    self.trim_next_text = token == ActionToken::TrimRightDelim;
                    self.pos = end;
                    return true;
                }
                ActionToken::Field => {
                    self.push(TokenKind::Field, text[1..].to_string(), start, end);
                    continue;
                }
                ActionToken::Quoted => {
                    let Some(value) = unescape(&text[1..text.len() - 1]) else {
                        self.pos = start;
                        return self.error("invalid escape in quoted string");
                    };
                    self.push(TokenKind::String, value, start, end);
                    continue;
                }
                ActionToken::RawQuoted => {
                    self.push(TokenKind::String, text[1..text.len() - 1].to_string(), start, end);
                    continue;
                }
                ActionToken::Char => {
                    let Some(c) = char_constant(&text[1..text.len() - 1]) else {
                        self.pos = start;
                        return self.error("malformed character constant");
                    };
                    self.push(TokenKind::Char, c.to_string(), start, end);
                    continue;
                }
                ActionToken::Number => {
                    if parse_number(text).is_none() {
                        self.pos = start;
                        return self.error(format!("bad number syntax: {:?}", text));
                    }
                    TokenKind::Number
                }
                ActionToken::Word => match text {
                    "true" | "false" => TokenKind::Bool,
                    "nil" => TokenKind::Nil,
                    word => Keyword::lookup(word).map_or(TokenKind::Identifier, TokenKind::Keyword),
                },
                ActionToken::Dot => TokenKind::Dot,
                ActionToken::Variable => TokenKind::Variable,
                ActionToken::LeftParen => TokenKind::LeftParen,
                ActionToken::RightParen => TokenKind::RightParen,
                ActionToken::Pipe => TokenKind::Pipe,
                ActionToken::Comma => TokenKind::Comma,
                ActionToken::Declare => TokenKind::Declare,
                ActionToken::Assign => TokenKind::Assign,
            };
            self.push(kind, text.to_string(), start, end);
        }

        self.pos = self.source.len();
        self.error("unclosed action")
    }

    fn lex_comment(&mut self) -> bool {
        let start = self.pos;
        let Some(offset) = self.rest().find(RIGHT_COMMENT) else {
            return self.error("unclosed comment");
        };
        self.pos += offset + RIGHT_COMMENT.len();
        let text = self.source[start..self.pos].to_string();
        self.push(TokenKind::Comment, text, start, self.pos);

        let rest = self.rest();
        if rest.starts_with(RIGHT_DELIM) {
            let start = self.pos;
            self.pos += RIGHT_DELIM.len();
            self.push(TokenKind::RightDelim, String::new(), start, self.pos);
            return true;
        }

        let after_space = rest.trim_start();
        if after_space.len() < rest.len() && after_space.starts_with(TRIM_RIGHT_DELIM) {
            let start = self.pos + (rest.len() - after_space.len());
            self.pos = start + TRIM_RIGHT_DELIM.len();
            self.trim_next_text = true;
            self.push(TokenKind::RightDelim, String::new(), start, self.pos);
            return true;
        }
        self.error("comment ends before closing delimiter")
    }
}

/// The message for input no action token matches, given the text from the
/// failing position onwards.
fn action_error(rest: &str) -> String {
    match rest.chars().next() {
        Some('"') => "unterminated quoted string".to_string(),
        Some('`') => "unterminated raw quoted string".to_string(),
        Some('\'') => "malformed character constant".to_string(),
        Some(':') => "expected :=".to_string(),
        Some('+' | '-') => {
            let len = rest[1..]
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
                .map_or(rest.len(), |offset| offset + 1);
            format!("bad number syntax: {:?}", &rest[..len])
        }
        Some(other) => format!("unrecognized character in action: {:?}", other),
        None => "unclosed action".to_string(),
    }
}

/// Decode the escapes in the body of a quoted string.
fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            c @ ('\\' | '"' | '\'') => c,
            'x' => hex_escape(&mut chars, 2)?,
            'u' => hex_escape(&mut chars, 4)?,
            'U' => hex_escape(&mut chars, 8)?,
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

fn hex_escape(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<char> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return None;
    }
    char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
}

/// A character constant's body must decode to exactly one character.
fn char_constant(body: &str) -> Option<char> {
    let decoded = unescape(body)?;
    let mut chars = decoded.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

/// A parsed numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

/// Parse integer (decimal, `0x`, `0o`, `0b`, `_` separators) or float text.
pub fn parse_number(text: &str) -> Option<Number> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (negative, digits) = match cleaned.as_bytes().first() {
        Some(b'-') => (true, &cleaned[1..]),
        Some(b'+') => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };
    if digits.is_empty() {
        return None;
    }

    // The sign is parsed with the magnitude so the most negative value fits.
    let int = |magnitude: &str, radix: u32| {
        if magnitude.is_empty() || magnitude.starts_with(['+', '-']) {
            return None;
        }
        let signed = if negative {
            format!("-{}", magnitude)
        } else {
            magnitude.to_string()
        };
        i64::from_str_radix(&signed, radix).ok().map(Number::Int)
    };
    let lower = digits.to_ascii_lowercase();
    if lower.starts_with("0x") {
        return int(&digits[2..], 16);
    }
    if lower.starts_with("0o") {
        return int(&digits[2..], 8);
    }
    if lower.starts_with("0b") {
        return int(&digits[2..], 2);
    }

    if digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.len() > 1 && digits.starts_with('0') {
            return int(&digits[1..], 8);
        }
        return int(digits, 10);
    }

    if !digits.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }
    digits
        .parse::<f64>()
        .ok()
        .map(|v| Number::Float(if negative { -v } else { v }))
}

fn has_left_trim_marker(after_delim: &str) -> bool {
    let mut chars = after_delim.chars();
    chars.next() == Some('-') && chars.next().is_some_and(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_plain_text() {
        let tokens = tokenize("hello . what's up");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Text);
        assert_eq!(tokens[0].value, "hello . what's up");
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_field_chain_is_adjacent() {
        let tokens = tokenize("{{ .World.Trend }}");
        assert_eq!(
            kinds("{{ .World.Trend }}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Field,
                TokenKind::Field,
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[1].value, "World");
        assert_eq!(tokens[2].value, "Trend");
        assert!(tokens[1].is_adjacent_to(&tokens[2]));
    }

    #[test]
    fn test_separate_fields_are_not_adjacent() {
        let tokens = tokenize("{{.A .B}}");
        assert!(!tokens[1].is_adjacent_to(&tokens[2]));
    }

    #[test]
    fn test_global_escape_lexes_as_dot_variable_field() {
        assert_eq!(
            kinds("{{.$.OS}}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Dot,
                TokenKind::Variable,
                TokenKind::Field,
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_string_hides_dots() {
        let tokens = tokenize(r#"{{ if eq .Text ".Net" }}x{{ end }}"#);
        let string = tokens.iter().find(|t| t.kind == TokenKind::String).unwrap();
        assert_eq!(string.value, ".Net");
        assert_eq!(
            tokens.iter().filter(|t| t.kind == TokenKind::Field).count(),
            1
        );
    }

    #[test]
    fn test_string_escapes() {
        let tokens = tokenize(r#"{{ "a\tb\"cé" }}"#);
        assert_eq!(tokens[1].value, "a\tb\"cé");
    }

    #[test]
    fn test_raw_string_keeps_backslashes() {
        let tokens = tokenize(r"{{ `\d+` }}");
        assert_eq!(tokens[1].kind, TokenKind::String);
        assert_eq!(tokens[1].value, r"\d+");
    }

    #[test]
    fn test_keywords_and_literals() {
        assert_eq!(
            kinds("{{ if true }}{{ else }}{{ nil }}{{ end }}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Keyword(Keyword::If),
                TokenKind::Bool,
                TokenKind::RightDelim,
                TokenKind::LeftDelim,
                TokenKind::Keyword(Keyword::Else),
                TokenKind::RightDelim,
                TokenKind::LeftDelim,
                TokenKind::Nil,
                TokenKind::RightDelim,
                TokenKind::LeftDelim,
                TokenKind::Keyword(Keyword::End),
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_declaration() {
        assert_eq!(
            kinds("{{ range $i, $cpu := .CPU }}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Keyword(Keyword::Range),
                TokenKind::Variable,
                TokenKind::Comma,
                TokenKind::Variable,
                TokenKind::Declare,
                TokenKind::Field,
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        let tokens = tokenize("a  {{- .X -}}  b");
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[3].kind, TokenKind::RightDelim);
        assert_eq!(tokens[4].value, "b");
    }

    #[test]
    fn test_negative_number_is_not_trim_marker() {
        let tokens = tokenize("{{-3}}");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].value, "-3");
    }

    #[test]
    fn test_comment() {
        assert_eq!(
            kinds("{{/* .Hidden */}}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Comment,
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_unclosed_action_is_error() {
        let tokens = tokenize("{{ .Text");
        let last = tokens.last().unwrap();
        assert_eq!(last.kind, TokenKind::Error);
        assert_eq!(last.value, "unclosed action");
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let tokens = tokenize(r#"{{ "abc }}"#);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Error);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(Number::Int(42)));
        assert_eq!(parse_number("-7"), Some(Number::Int(-7)));
        assert_eq!(parse_number("0x1F"), Some(Number::Int(31)));
        assert_eq!(parse_number("1_000"), Some(Number::Int(1000)));
        assert_eq!(parse_number("2.5"), Some(Number::Float(2.5)));
        assert_eq!(parse_number("1e3"), Some(Number::Float(1000.0)));
        assert_eq!(parse_number(".5"), Some(Number::Float(0.5)));
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("-"), None);
    }

    #[test]
    fn test_parse_number_extremes() {
        assert_eq!(
            parse_number("-9223372036854775808"),
            Some(Number::Int(i64::MIN))
        );
        assert_eq!(
            parse_number("-0x8000000000000000"),
            Some(Number::Int(i64::MIN))
        );
        assert_eq!(parse_number("9223372036854775807"), Some(Number::Int(i64::MAX)));
        assert_eq!(parse_number("9223372036854775808"), None);
        assert_eq!(parse_number("0x-5"), None);
    }

    #[test]
    fn test_most_negative_integer_lexes() {
        let tokens = tokenize("{{ -9223372036854775808 }}");
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[1].value, "-9223372036854775808");
    }

    #[test]
    fn test_signed_argument_is_not_trim_marker() {
        let tokens = tokenize("{{ sub 5 -3 }}");
        assert_eq!(
            kinds("{{ sub 5 -3 }}"),
            vec![
                TokenKind::LeftDelim,
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::RightDelim,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[3].value, "-3");
    }

    #[test]
    fn test_trim_marker_needs_preceding_space() {
        let last = tokenize("{{ 3-}}").pop().unwrap();
        assert_eq!(last.kind, TokenKind::Error);
        assert_eq!(last.value, "bad number syntax: \"-\"");
    }

    #[test]
    fn test_spans_cover_source() {
        let source = "ab {{ .X | printf \"%d\" 3 -}}  cd";
        for token in tokenize(source) {
            if matches!(token.kind, TokenKind::Field | TokenKind::Identifier | TokenKind::Number) {
                let text = &source[token.start..token.end];
                assert!(text.ends_with(token.value.as_str()), "{:?}", token);
            }
        }
        let tokens = tokenize(source);
        let close = tokens.iter().find(|t| t.kind == TokenKind::RightDelim).unwrap();
        assert_eq!(&source[close.start..close.end], "-}}");
    }

    #[test]
    fn test_char_constants() {
        let tokens = tokenize(r"{{ 'a' '\n' '\x41' 'é' }}");
        let chars: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Char)
            .map(|t| t.value.as_str())
            .collect();
        assert_eq!(chars, vec!["a", "\n", "A", "é"]);
    }

    #[test]
    fn test_error_messages() {
        let message = |source: &str| tokenize(source).pop().unwrap().value;
        assert_eq!(message("{{ $x : 1 }}"), "expected :=");
        assert_eq!(message("{{ # }}"), "unrecognized character in action: '#'");
        assert_eq!(message(r#"{{ "\q" }}"#), "invalid escape in quoted string");
        assert_eq!(message("{{ 'ab' }}"), "malformed character constant");
        assert_eq!(message("{{ `raw }}"), "unterminated raw quoted string");
        assert_eq!(message("{{ 12abc }}"), "bad number syntax: \"12abc\"");
        assert_eq!(message("{{/* open }}"), "unclosed comment");
        assert_eq!(message("{{/* x */ .Y }}"), "comment ends before closing delimiter");
    }

    #[test]
    fn test_comment_with_trim_marker() {
        let tokens = tokenize("a {{- /* note */ -}} b");
        assert_eq!(tokens[0].value, "a");
        assert_eq!(tokens[2].kind, TokenKind::Comment);
        assert_eq!(tokens[3].kind, TokenKind::RightDelim);
        assert_eq!(tokens[4].value, "b");
    }

    #[test]
    fn test_unicode_text_is_preserved() {
        let tokens = tokenize("😺💬 {{ .Text }} \u{E77F}");
        assert_eq!(tokens[0].value, "😺💬 ");
        assert_eq!(tokens[4].value, " \u{E77F}");
    }
}
