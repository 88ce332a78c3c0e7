use crate::source_location::{SourceLocation, SourceSpan};
use serde::Serialize;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Token<'a> {
    pub span: SourceSpan,
    /// Byte offset of the first character of the token.
    pub start: usize,
    /// Byte offset one past the last character of the token.
    pub end: usize,
    pub kind: TokenKind<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TokenKind<'a> {
    // Declaration
    KeywordPackage,
    KeywordImport,
    KeywordType,
    KeywordConst,
    KeywordVar,
    KeywordFunc,

    // Type constructor
    KeywordStruct,
    KeywordInterface,
    KeywordMap,
    KeywordChan,

    Identifier(&'a str),
    IntLiteral(u64),
    /// Contents of an interpreted or raw string literal, quotes stripped.
    StringLiteral(&'a str),
    /// Float, imaginary and rune literals, and integers that do not fit a u64.
    OtherLiteral(&'a str),

    BraceOpen,
    BraceClose,

    ParenOpen,
    ParenClose,

    BracketOpen,
    BracketClose,

    Semicolon,
    Colon,
    Comma,
    Period,
    Ellipsis,
    EqualSign,
    Star,
    Arrow,

    // Only shows up in code the parser skips over.
    Operator(&'a str),

    Invalid(&'static str),
}

impl TokenKind<'_> {
    pub fn describe(&self) -> &'static str {
        use TokenKind::*;

        match self {
            KeywordPackage => "'package'",
            KeywordImport => "'import'",
            KeywordType => "'type'",
            KeywordConst => "'const'",
            KeywordVar => "'var'",
            KeywordFunc => "'func'",
            KeywordStruct => "'struct'",
            KeywordInterface => "'interface'",
            KeywordMap => "'map'",
            KeywordChan => "'chan'",
            Identifier(_) => "identifier",
            IntLiteral(_) => "integer literal",
            StringLiteral(_) => "string literal",
            OtherLiteral(_) => "literal",
            BraceOpen => "'{'",
            BraceClose => "'}'",
            ParenOpen => "'('",
            ParenClose => "')'",
            BracketOpen => "'['",
            BracketClose => "']'",
            Semicolon => "';' or newline",
            Colon => "':'",
            Comma => "','",
            Period => "'.'",
            Ellipsis => "'...'",
            EqualSign => "'='",
            Star => "'*'",
            Arrow => "'<-'",
            Operator(_) => "operator",
            Invalid(what) => what,
        }
    }

    // A newline directly after one of these terminates the statement.
    fn ends_statement(&self) -> bool {
        use TokenKind::*;

        matches!(
            self,
            Identifier(_)
                | IntLiteral(_)
                | StringLiteral(_)
                | OtherLiteral(_)
                | ParenClose
                | BracketClose
                | BraceClose
                | Operator("++")
                | Operator("--")
        )
    }
}

/// Splits Go source text into tokens, inserting the semicolons that Go's
/// grammar leaves implicit at line ends.
pub struct Tokenizer<'a> {
    source: &'a str,
    iter: Peekable<Chars<'a>>,
    loc: SourceLocation,
    last_loc: SourceLocation,
    offset: usize,
    insert_semicolon: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str) -> Self {
        let start = SourceLocation { line: 1, col: 1 };

        Tokenizer {
            source,
            iter: source.chars().peekable(),
            loc: start,
            last_loc: start,
            offset: 0,
            insert_semicolon: false,
        }
    }

    fn advance(&mut self) -> Option<(usize, SourceLocation, char)> {
        let c = self.iter.next()?;

        let offset = self.offset;
        let loc = self.loc;

        if c == '\n' {
            self.loc.line += 1;
            self.loc.col = 1;
        } else {
            self.loc.col += 1;
        }

        self.offset += c.len_utf8();
        self.last_loc = loc;

        Some((offset, loc, c))
    }

    fn rest(&self) -> &'a str {
        &self.source[self.offset..]
    }

    fn read_while<P: Fn(char) -> bool>(&mut self, predicate: P) {
        while let Some(c) = self.iter.peek() {
            if !predicate(*c) {
                break;
            }

            self.advance();
        }
    }

    fn token(&self, start: usize, start_loc: SourceLocation, kind: TokenKind<'a>) -> Token<'a> {
        Token {
            span: SourceSpan {
                start: start_loc,
                end: self.last_loc,
            },
            start,
            end: self.offset,
            kind,
        }
    }

    fn take_pending_semicolon(&mut self, loc: SourceLocation) -> Option<Token<'a>> {
        if !self.insert_semicolon {
            return None;
        }

        self.insert_semicolon = false;

        Some(Token {
            span: SourceSpan::single(loc),
            start: self.offset,
            end: self.offset,
            kind: TokenKind::Semicolon,
        })
    }

    // Skips whitespace and comments. Returns early with an implicit semicolon
    // when a line break terminates a statement.
    fn skip_trivia(&mut self) -> Option<Token<'a>> {
        loop {
            let c = *self.iter.peek()?;

            if c == '\n' {
                let (_, loc, _) = self.advance()?;
                if let Some(tok) = self.take_pending_semicolon(loc) {
                    return Some(tok);
                }
            } else if c.is_whitespace() {
                self.advance();
            } else if self.rest().starts_with("//") {
                self.read_while(|c| c != '\n');
            } else if self.rest().starts_with("/*") {
                let (offset, start, _) = self.advance()?;
                self.advance();

                let mut saw_newline = false;
                loop {
                    if self.rest().starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }

                    match self.advance() {
                        Some((_, _, '\n')) => saw_newline = true,
                        Some(_) => {}
                        None => {
                            self.insert_semicolon = false;
                            return Some(self.token(
                                offset,
                                start,
                                TokenKind::Invalid("unterminated comment"),
                            ));
                        }
                    }
                }

                if saw_newline {
                    if let Some(tok) = self.take_pending_semicolon(start) {
                        return Some(tok);
                    }
                }
            } else {
                return None;
            }
        }
    }

    fn read_number(&mut self, first: char) {
        let is_hex = first == '0' && matches!(self.iter.peek(), Some('x') | Some('X'));
        let mut prev = first;

        while let Some(&c) = self.iter.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && (matches!(prev, 'p' | 'P') || (!is_hex && matches!(prev, 'e' | 'E')));

            if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
                break;
            }

            self.advance();
            prev = c;
        }
    }

    // Returns false when the literal runs into a line break or the end of the
    // source before its closing delimiter.
    fn read_quoted(&mut self, delimiter: char, allow_newlines: bool) -> bool {
        let mut escaped = false;

        while let Some((_, _, c)) = self.advance() {
            if c == '\n' && !allow_newlines {
                return false;
            }

            if escaped {
                escaped = false;
            } else if c == '\\' && delimiter != '`' {
                escaped = true;
            } else if c == delimiter {
                return true;
            }
        }

        false
    }
}

fn is_identifier_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_rest_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '/' | '%' | '&' | '|' | '^' | '<' | '>' | '!' | '~' | '='
    )
}

/// Parses a Go integer literal, including radix prefixes and digit
/// separators. Returns `None` for anything that is not an integer that fits
/// in a `u64`.
pub fn parse_int_literal(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(|&c| c != '_').collect();

    let (radix, body) = if let Some(rest) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, rest)
    } else if let Some(rest) = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix("0O"))
    {
        (8, rest)
    } else if let Some(rest) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits.as_str())
    };

    u64::from_str_radix(body, radix).ok()
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if let Some(semicolon) = self.skip_trivia() {
            return Some(semicolon);
        }

        let Some((offset, start, c)) = self.advance() else {
            // The end of the source also ends the last line.
            let loc = self.loc;
            return self.take_pending_semicolon(loc);
        };

        #[rustfmt::skip]
        let kind = match c {
            _ if is_identifier_start_char(c) => {
                self.read_while(is_identifier_rest_char);

                match &self.source[offset..self.offset] {
                    "package"   => TokenKind::KeywordPackage,
                    "import"    => TokenKind::KeywordImport,
                    "type"      => TokenKind::KeywordType,
                    "const"     => TokenKind::KeywordConst,
                    "var"       => TokenKind::KeywordVar,
                    "func"      => TokenKind::KeywordFunc,
                    "struct"    => TokenKind::KeywordStruct,
                    "interface" => TokenKind::KeywordInterface,
                    "map"       => TokenKind::KeywordMap,
                    "chan"      => TokenKind::KeywordChan,
                    identifier  => TokenKind::Identifier(identifier),
                }
            }

            _ if c.is_ascii_digit()
                || (c == '.' && self.iter.peek().map_or(false, |d| d.is_ascii_digit())) =>
            {
                self.read_number(c);

                let text = &self.source[offset..self.offset];
                match parse_int_literal(text) {
                    Some(value) => TokenKind::IntLiteral(value),
                    None => TokenKind::OtherLiteral(text),
                }
            }

            '"' | '`' => {
                if self.read_quoted(c, c == '`') {
                    TokenKind::StringLiteral(&self.source[offset + 1..self.offset - 1])
                } else {
                    TokenKind::Invalid("unterminated string literal")
                }
            }

            '\'' => {
                if self.read_quoted('\'', false) {
                    TokenKind::OtherLiteral(&self.source[offset..self.offset])
                } else {
                    TokenKind::Invalid("unterminated rune literal")
                }
            }

            '.' => {
                if self.rest().starts_with("..") {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else {
                    TokenKind::Period
                }
            }

            '{' => TokenKind::BraceOpen,
            '}' => TokenKind::BraceClose,
            '(' => TokenKind::ParenOpen,
            ')' => TokenKind::ParenClose,
            '[' => TokenKind::BracketOpen,
            ']' => TokenKind::BracketClose,

            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '*' => TokenKind::Star,

            '<' if self.iter.peek() == Some(&'-') => {
                self.advance();
                TokenKind::Arrow
            }

            '=' if self.iter.peek() != Some(&'=') => TokenKind::EqualSign,

            _ if is_operator_char(c) => {
                self.read_while(is_operator_char);
                TokenKind::Operator(&self.source[offset..self.offset])
            }

            _ => TokenKind::Invalid("unexpected character"),
        };

        self.insert_semicolon = kind.ends_statement();

        Some(self.token(offset, start, kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind<'_>> {
        Tokenizer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn newlines_terminate_field_declarations() {
        let source = "type A struct {\n\tX int8\n\tY *int32\n}\n";

        assert_eq!(
            kinds(source),
            vec![
                KeywordType,
                Identifier("A"),
                KeywordStruct,
                BraceOpen,
                Identifier("X"),
                Identifier("int8"),
                Semicolon,
                Identifier("Y"),
                Star,
                Identifier("int32"),
                Semicolon,
                BraceClose,
                Semicolon,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace_or_comma() {
        assert_eq!(
            kinds("A,\nB {\n"),
            vec![Identifier("A"), Comma, Identifier("B"), BraceOpen]
        );
    }

    #[test]
    fn end_of_source_terminates_the_last_line() {
        assert_eq!(kinds("X int"), vec![Identifier("X"), Identifier("int"), Semicolon]);
    }

    #[test]
    fn comments_are_skipped() {
        let source = "A int // trailing\n/* block\n spanning */ B /* inline */ bool";

        assert_eq!(
            kinds(source),
            vec![
                Identifier("A"),
                Identifier("int"),
                Semicolon,
                Identifier("B"),
                Identifier("bool"),
                Semicolon,
            ]
        );
    }

    #[test]
    fn multi_line_block_comment_acts_like_a_newline() {
        assert_eq!(
            kinds("A int /* one\ntwo */ B bool"),
            vec![
                Identifier("A"),
                Identifier("int"),
                Semicolon,
                Identifier("B"),
                Identifier("bool"),
                Semicolon,
            ]
        );
    }

    #[test]
    fn struct_tags_become_string_literals() {
        assert_eq!(
            kinds("Name string `json:\"name\"`\nID int \"id\""),
            vec![
                Identifier("Name"),
                Identifier("string"),
                StringLiteral("json:\"name\""),
                Semicolon,
                Identifier("ID"),
                Identifier("int"),
                StringLiteral("id"),
                Semicolon,
            ]
        );
    }

    #[test]
    fn integer_literals_in_every_radix() {
        assert_eq!(
            kinds("[16] [0x10] [0o20] [020] [0b1_0000] [1.5]"),
            vec![
                BracketOpen,
                IntLiteral(16),
                BracketClose,
                BracketOpen,
                IntLiteral(16),
                BracketClose,
                BracketOpen,
                IntLiteral(16),
                BracketClose,
                BracketOpen,
                IntLiteral(16),
                BracketClose,
                BracketOpen,
                IntLiteral(16),
                BracketClose,
                BracketOpen,
                OtherLiteral("1.5"),
                BracketClose,
                Semicolon,
            ]
        );
    }

    #[test]
    fn channel_and_variadic_punctuation() {
        assert_eq!(
            kinds("<-chan int ...T a == b"),
            vec![
                Arrow,
                KeywordChan,
                Identifier("int"),
                Ellipsis,
                Identifier("T"),
                Identifier("a"),
                Operator("=="),
                Identifier("b"),
                Semicolon,
            ]
        );
    }

    #[test]
    fn tokens_carry_spans_and_offsets() {
        let source = "type Point struct {\n    X int\n}";
        let tokens = Tokenizer::new(source).collect::<Vec<_>>();

        let x = tokens
            .iter()
            .find(|t| t.kind == Identifier("X"))
            .expect("X should be tokenized");

        assert_eq!(x.span.start, SourceLocation { line: 2, col: 5 });
        assert_eq!(&source[x.start..x.end], "X");

        let point = tokens[1];
        assert_eq!(point.span.start, SourceLocation { line: 1, col: 6 });
        assert_eq!(point.span.end, SourceLocation { line: 1, col: 10 });
    }

    #[test]
    fn unterminated_literals_are_reported() {
        assert_eq!(
            kinds("\"abc\nX"),
            vec![Invalid("unterminated string literal"), Identifier("X"), Semicolon]
        );
        assert_eq!(kinds("/* open"), vec![Invalid("unterminated comment")]);
        assert_eq!(kinds("$"), vec![Invalid("unexpected character")]);
    }
}
