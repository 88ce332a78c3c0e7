use crate::ast::*;
use crate::error::Error;
use crate::source_location::SourceSpan;
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use std::iter::Peekable;

type Result<T> = std::result::Result<T, ParseError>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    UnexpectedEnd(&'static str),
    UnexpectedToken {
        span: SourceSpan,
        found: &'static str,
        expected: &'static str,
    },
    Unsupported(SourceSpan, &'static str),
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::UnexpectedEnd(expected) => {
                Error::malformed(format!("unexpected end of input, expected {expected}"), None)
            }
            ParseError::UnexpectedToken {
                span,
                found,
                expected,
            } => Error::malformed(
                format!("unexpected {found}, expected {expected}"),
                Some(span.start),
            ),
            ParseError::Unsupported(span, what) => {
                Error::malformed(format!("{what} are not supported"), Some(span.start))
            }
        }
    }
}

macro_rules! expect_token {
    // The pattern matching code for `pattern` is taken from:
    // https://doc.rust-lang.org/src/core/macros/mod.rs.html#342
    ($token:expr, $expected:expr, $(|)? $( $pattern:pat_param )|+ $( if $guard: expr )? $(,)?) => {
        if let Some(tok) = $token {
            let token_matches_pattern = matches!(tok.kind, $( $pattern )|+ $( if $guard )?);
            if !token_matches_pattern {
                Err(ParseError::UnexpectedToken {
                    span: tok.span,
                    found: tok.kind.describe(),
                    expected: $expected,
                })
            } else {
                Ok(tok)
            }
        } else {
            Err(ParseError::UnexpectedEnd($expected))
        }
    };
}

/// Parses the subset of Go that declares types: the package clause, imports,
/// type and constant declarations. Function and variable declarations are
/// skipped without being interpreted.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Peekable<Tokenizer<'a>>,
    prev_end: usize,
}

pub fn parse_file(source: &str) -> std::result::Result<File<'_>, Error> {
    Parser::new(source).parse_file().map_err(Error::from)
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Parser<'a> {
        Parser {
            source,
            tokens: Tokenizer::new(source).peekable(),
            prev_end: 0,
        }
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let tok = self.tokens.next()?;
        self.prev_end = tok.end;
        Some(tok)
    }

    fn peek_kind(&mut self) -> Option<TokenKind<'a>> {
        self.tokens.peek().map(|t| t.kind)
    }

    fn eat(&mut self, kind: TokenKind<'a>) -> Option<Token<'a>> {
        if self.peek_kind() == Some(kind) {
            self.bump()
        } else {
            None
        }
    }

    fn skip_semicolons(&mut self) {
        while self.eat(TokenKind::Semicolon).is_some() {}
    }

    fn expect_terminator(&mut self) -> Result<()> {
        if self.tokens.peek().is_some() {
            expect_token!(self.bump(), "';' or newline", TokenKind::Semicolon)?;
        }

        Ok(())
    }

    // Source text of the consumed tokens starting at `start`, whitespace collapsed.
    fn text_from(&self, start: usize) -> String {
        self.source[start..self.prev_end]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn parse_file(&mut self) -> Result<File<'a>> {
        use TokenKind::*;

        let mut file = File::default();

        self.skip_semicolons();

        if self.eat(KeywordPackage).is_some() {
            let name = expect_token!(self.bump(), "package name", Identifier(_))?;
            let Identifier(name) = name.kind else {
                unreachable!()
            };
            file.package = Some(name);
            self.expect_terminator()?;
        }

        loop {
            self.skip_semicolons();

            let Some(peeked) = self.peek_kind() else {
                break;
            };

            match peeked {
                KeywordImport => {
                    self.bump();
                    let imports = self.parse_group(Self::parse_import_spec)?;
                    file.imports.extend(imports);
                }
                KeywordType => {
                    self.bump();
                    let types = self.parse_group(Self::parse_type_spec)?;
                    file.types.extend(types);
                }
                KeywordConst => {
                    self.bump();
                    let consts = self.parse_group(Self::parse_const_spec)?;
                    file.consts.extend(consts);
                }
                KeywordFunc | KeywordVar => self.skip_declaration(),
                _ => {
                    expect_token!(self.bump(), "declaration", KeywordType)?;
                }
            }
        }

        Ok(file)
    }

    // Parses either a single spec or a parenthesized group of specs.
    fn parse_group<T>(&mut self, parse_spec: fn(&mut Self) -> Result<Vec<T>>) -> Result<Vec<T>> {
        use TokenKind::*;

        if self.eat(ParenOpen).is_none() {
            let specs = parse_spec(self)?;
            self.expect_terminator()?;
            return Ok(specs);
        }

        let mut specs = Vec::new();

        loop {
            self.skip_semicolons();

            if self.eat(ParenClose).is_some() {
                break;
            }

            specs.extend(parse_spec(self)?);

            let peeked = expect_token!(self.tokens.peek(), "';' or ')'", Semicolon | ParenClose)?;
            if matches!(peeked.kind, Semicolon) {
                self.bump();
            }
        }

        self.expect_terminator()?;

        Ok(specs)
    }

    // Function bodies go with the declaration, local types included.
    fn skip_declaration(&mut self) {
        use TokenKind::*;

        let mut depth = 0usize;

        while let Some(kind) = self.peek_kind() {
            match kind {
                Semicolon if depth == 0 => break,
                ParenOpen | BraceOpen | BracketOpen => depth += 1,
                ParenClose | BraceClose | BracketClose => depth = depth.saturating_sub(1),
                _ => {}
            }

            self.bump();
        }
    }

    fn parse_import_spec(&mut self) -> Result<Vec<Import<'a>>> {
        use TokenKind::*;

        let first = *expect_token!(
            self.tokens.peek(),
            "import path",
            StringLiteral(_) | Identifier(_) | Period
        )?;

        let alias = match first.kind {
            Identifier(name) => {
                self.bump();
                Some(name)
            }
            Period => {
                self.bump();
                Some(".")
            }
            _ => None,
        };

        let path_token = expect_token!(self.bump(), "import path", StringLiteral(_))?;
        let StringLiteral(path) = path_token.kind else {
            unreachable!()
        };

        Ok(vec![Import {
            span: first.span.extend(&path_token.span),
            alias,
            path,
        }])
    }

    fn parse_type_spec(&mut self) -> Result<Vec<TypeSpec<'a>>> {
        use TokenKind::*;

        let name_token = expect_token!(self.bump(), "type name", Identifier(_))?;
        let Identifier(name) = name_token.kind else {
            unreachable!()
        };

        let mut is_alias = false;

        let ty = if let Some(open) = self.eat(BracketOpen) {
            // `type A [N]T` and `type A[T any] ...` only differ after the first identifier.
            match self.peek_kind() {
                Some(Identifier(len)) => {
                    self.bump();
                    if self.eat(BracketClose).is_none() {
                        return Err(ParseError::Unsupported(open.span, "generic type parameters"));
                    }
                    let elem = self.parse_type()?;
                    TypeExpr {
                        span: open.span.extend(&elem.span),
                        kind: TypeExprKind::Array {
                            len: ArrayLen::Constant(len),
                            elem: Box::new(elem),
                        },
                    }
                }
                _ => self.parse_after_bracket(open)?,
            }
        } else {
            is_alias = self.eat(EqualSign).is_some();
            self.parse_type()?
        };

        Ok(vec![TypeSpec {
            span: name_token.span.extend(&ty.span),
            name,
            is_alias,
            ty,
        }])
    }

    fn parse_const_spec(&mut self) -> Result<Vec<ConstSpec<'a>>> {
        use TokenKind::*;

        let mut names = Vec::new();
        loop {
            let tok = expect_token!(self.bump(), "constant name", Identifier(_))?;
            let Identifier(name) = tok.kind else {
                unreachable!()
            };
            names.push((name, tok.span));

            if self.eat(Comma).is_none() {
                break;
            }
        }

        if !matches!(
            self.peek_kind(),
            Some(EqualSign) | Some(Semicolon) | Some(ParenClose) | None
        ) {
            self.parse_type()?;
        }

        let mut values: Vec<Vec<TokenKind<'a>>> = Vec::new();

        if self.eat(EqualSign).is_some() {
            let mut depth = 0usize;
            let mut current = Vec::new();

            while let Some(kind) = self.peek_kind() {
                match kind {
                    Semicolon | ParenClose if depth == 0 => break,
                    Comma if depth == 0 => {
                        self.bump();
                        values.push(std::mem::take(&mut current));
                        continue;
                    }
                    ParenOpen | BraceOpen | BracketOpen => depth += 1,
                    ParenClose | BraceClose | BracketClose => depth = depth.saturating_sub(1),
                    _ => {}
                }

                current.push(kind);
                self.bump();
            }

            values.push(current);
        }

        let consts = names
            .into_iter()
            .enumerate()
            .map(|(i, (name, span))| ConstSpec {
                span,
                name,
                value: match values.get(i).map(Vec::as_slice) {
                    Some([IntLiteral(value)]) => Some(*value),
                    _ => None,
                },
            })
            .collect();

        Ok(consts)
    }

    fn parse_type(&mut self) -> Result<TypeExpr<'a>> {
        use TokenKind::*;

        let tok = expect_token!(
            self.bump(),
            "type",
            Identifier(_)
                | Star
                | BracketOpen
                | KeywordMap
                | KeywordChan
                | Arrow
                | KeywordFunc
                | KeywordInterface
                | KeywordStruct
                | ParenOpen
        )?;

        let (kind, end) = match tok.kind {
            Identifier(name) => {
                if self.eat(Period).is_some() {
                    let selector = expect_token!(self.bump(), "qualified type name", Identifier(_))?;
                    let Identifier(selected) = selector.kind else {
                        unreachable!()
                    };

                    (
                        TypeExprKind::Qualified {
                            package: name,
                            name: selected,
                        },
                        selector.span,
                    )
                } else if let Some(open) = self.eat(BracketOpen) {
                    return Err(ParseError::Unsupported(open.span, "generic type instantiations"));
                } else {
                    (TypeExprKind::Named(name), tok.span)
                }
            }
            Star => {
                let inner = self.parse_type()?;
                let end = inner.span;
                (TypeExprKind::Pointer(Box::new(inner)), end)
            }
            BracketOpen => return self.parse_after_bracket(tok),
            KeywordMap => {
                expect_token!(self.bump(), "'['", BracketOpen)?;
                let key = self.parse_type()?;
                expect_token!(self.bump(), "']'", BracketClose)?;
                let value = self.parse_type()?;
                let end = value.span;
                (
                    TypeExprKind::Map {
                        key: Box::new(key),
                        value: Box::new(value),
                    },
                    end,
                )
            }
            KeywordChan => {
                let dir = if self.eat(Arrow).is_some() {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                let elem = self.parse_type()?;
                let end = elem.span;
                (
                    TypeExprKind::Chan {
                        dir,
                        elem: Box::new(elem),
                    },
                    end,
                )
            }
            Arrow => {
                expect_token!(self.bump(), "'chan'", KeywordChan)?;
                let elem = self.parse_type()?;
                let end = elem.span;
                (
                    TypeExprKind::Chan {
                        dir: ChanDir::Receive,
                        elem: Box::new(elem),
                    },
                    end,
                )
            }
            KeywordFunc => {
                let end = self.skip_signature()?;
                (TypeExprKind::Func(self.text_from(tok.start)), end)
            }
            KeywordInterface => {
                let close = self.skip_balanced(BraceOpen, "'{'")?;
                (TypeExprKind::Interface(self.text_from(tok.start)), close.span)
            }
            KeywordStruct => {
                let (fields, close) = self.parse_struct_body()?;
                (TypeExprKind::Struct(fields), close.span)
            }
            ParenOpen => {
                let inner = self.parse_type()?;
                expect_token!(self.bump(), "')'", ParenClose)?;
                return Ok(inner);
            }
            _ => unreachable!(),
        };

        Ok(TypeExpr {
            span: tok.span.extend(&end),
            kind,
        })
    }

    // Slice or array type, with the opening bracket already consumed.
    fn parse_after_bracket(&mut self, open: Token<'a>) -> Result<TypeExpr<'a>> {
        use TokenKind::*;

        let tok = expect_token!(
            self.bump(),
            "array length or ']'",
            BracketClose | IntLiteral(_) | Identifier(_) | Ellipsis
        )?;

        let len = match tok.kind {
            BracketClose => {
                let elem = self.parse_type()?;
                return Ok(TypeExpr {
                    span: open.span.extend(&elem.span),
                    kind: TypeExprKind::Slice(Box::new(elem)),
                });
            }
            IntLiteral(n) => ArrayLen::Literal(n),
            Identifier(name) => ArrayLen::Constant(name),
            _ => return Err(ParseError::Unsupported(tok.span, "implicitly sized arrays")),
        };

        expect_token!(self.bump(), "']'", BracketClose)?;

        let elem = self.parse_type()?;

        Ok(TypeExpr {
            span: open.span.extend(&elem.span),
            kind: TypeExprKind::Array {
                len,
                elem: Box::new(elem),
            },
        })
    }

    // Consumes a bracketed token sequence and returns the closing token.
    fn skip_balanced(&mut self, open: TokenKind<'a>, expected: &'static str) -> Result<Token<'a>> {
        use TokenKind::*;

        let first = expect_token!(self.bump(), expected, ParenOpen | BraceOpen | BracketOpen)?;
        if first.kind != open {
            return Err(ParseError::UnexpectedToken {
                span: first.span,
                found: first.kind.describe(),
                expected,
            });
        }

        let mut depth = 1usize;

        loop {
            let tok = self.bump().ok_or(ParseError::UnexpectedEnd("closing bracket"))?;

            match tok.kind {
                ParenOpen | BraceOpen | BracketOpen => depth += 1,
                ParenClose | BraceClose | BracketClose => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tok);
                    }
                }
                _ => {}
            }
        }
    }

    // Parameters and optional results of a function type. The signature only
    // matters for its text, a func value is always one word.
    fn skip_signature(&mut self) -> Result<SourceSpan> {
        use TokenKind::*;

        let params = self.skip_balanced(ParenOpen, "'('")?;

        match self.peek_kind() {
            Some(ParenOpen) => Ok(self.skip_balanced(ParenOpen, "'('")?.span),
            Some(
                Identifier(_) | Star | BracketOpen | KeywordMap | KeywordChan | Arrow | KeywordFunc
                | KeywordInterface | KeywordStruct,
            ) => Ok(self.parse_type()?.span),
            _ => Ok(params.span),
        }
    }

    fn parse_struct_body(&mut self) -> Result<(Vec<FieldDecl<'a>>, Token<'a>)> {
        use TokenKind::*;

        expect_token!(self.bump(), "'{'", BraceOpen)?;

        let mut fields = Vec::new();

        loop {
            self.skip_semicolons();

            if let Some(close) = self.eat(BraceClose) {
                return Ok((fields, close));
            }

            self.parse_field_decl(&mut fields)?;

            let peeked = expect_token!(self.tokens.peek(), "';' or '}'", Semicolon | BraceClose)?;
            if matches!(peeked.kind, Semicolon) {
                self.bump();
            }
        }
    }

    fn parse_field_decl(&mut self, fields: &mut Vec<FieldDecl<'a>>) -> Result<()> {
        use TokenKind::*;

        let first = *expect_token!(
            self.tokens.peek(),
            "field name or embedded type",
            Identifier(_) | Star
        )?;

        if matches!(first.kind, Star) {
            let ty = self.parse_type()?;
            return self.push_embedded(fields, ty);
        }

        self.bump();

        let Identifier(first_name) = first.kind else {
            unreachable!()
        };

        match self.peek_kind() {
            Some(Period) => {
                self.bump();
                let selector = expect_token!(self.bump(), "qualified type name", Identifier(_))?;
                let Identifier(name) = selector.kind else {
                    unreachable!()
                };

                let ty = TypeExpr {
                    span: first.span.extend(&selector.span),
                    kind: TypeExprKind::Qualified {
                        package: first_name,
                        name,
                    },
                };

                self.push_embedded(fields, ty)
            }
            None | Some(Semicolon) | Some(BraceClose) | Some(StringLiteral(_)) => {
                let ty = TypeExpr {
                    span: first.span,
                    kind: TypeExprKind::Named(first_name),
                };

                self.push_embedded(fields, ty)
            }
            _ => {
                let mut names = vec![(first_name, first.span)];

                while self.eat(Comma).is_some() {
                    let tok = expect_token!(self.bump(), "field name", Identifier(_))?;
                    let Identifier(name) = tok.kind else {
                        unreachable!()
                    };
                    names.push((name, tok.span));
                }

                let ty = self.parse_type()?;
                let tag = self.parse_tag();

                for (name, span) in names {
                    fields.push(FieldDecl {
                        span: span.extend(&ty.span),
                        name,
                        ty: ty.clone(),
                        embedded: false,
                        tag,
                    });
                }

                Ok(())
            }
        }
    }

    fn push_embedded(&mut self, fields: &mut Vec<FieldDecl<'a>>, ty: TypeExpr<'a>) -> Result<()> {
        let Some(name) = ty.embedded_name() else {
            return Err(ParseError::Unsupported(
                ty.span,
                "embedded fields of unnamed types",
            ));
        };

        let tag = self.parse_tag();

        fields.push(FieldDecl {
            span: ty.span,
            name,
            ty,
            embedded: true,
            tag,
        });

        Ok(())
    }

    fn parse_tag(&mut self) -> Option<&'a str> {
        match self.peek_kind() {
            Some(TokenKind::StringLiteral(tag)) => {
                self.bump();
                Some(tag)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(source: &str) -> File<'_> {
        Parser::new(source)
            .parse_file()
            .unwrap_or_else(|e| panic!("{source:?} should parse, got {e:?}"))
    }

    fn field_summary(spec: &TypeSpec) -> Vec<String> {
        spec.ty
            .as_struct()
            .expect("type should be a struct")
            .iter()
            .map(|f| format!("{} {}", f.name, f.ty))
            .collect()
    }

    #[test]
    fn parses_a_basic_struct() {
        let file = parse(
            "type Basic struct {
                A int64
                B, C int32
                D bool
            }",
        );

        assert_eq!(file.package, None);
        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].name, "Basic");
        assert_eq!(
            field_summary(&file.types[0]),
            vec!["A int64", "B int32", "C int32", "D bool"]
        );
    }

    #[test]
    fn parses_package_imports_and_grouped_declarations() {
        let file = parse(
            r#"package models

            import "time"
            import (
                j "encoding/json"
                "net/http"
            )

            type (
                ID int64
                Pair struct { Left, Right ID }
                Alias = Pair
            )
            "#,
        );

        assert_eq!(file.package, Some("models"));

        let names = file
            .imports
            .iter()
            .map(|i| i.package_name())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["time", "j", "http"]);

        let types = file.types.iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(types, vec!["ID", "Pair", "Alias"]);
        assert!(file.types[2].is_alias);
        assert!(!file.types[1].is_alias);
    }

    #[test]
    fn parses_composite_field_types() {
        let file = parse(
            "type Everything struct {
                P *int
                S []string
                A [4]uint16
                N [Size]byte
                M map[string][]int
                C chan<- int
                R <-chan bool
                F func(a int, b string) (int, error)
                G func()
                I interface{ String() string }
                E interface{}
                T time.Time
                Inner struct { X int8; Y struct{} }
            }",
        );

        assert_eq!(
            field_summary(&file.types[0]),
            vec![
                "P *int",
                "S []string",
                "A [4]uint16",
                "N [Size]byte",
                "M map[string][]int",
                "C chan<- int",
                "R <-chan bool",
                "F func(a int, b string) (int, error)",
                "G func()",
                "I interface{ String() string }",
                "E interface{}",
                "T time.Time",
                "Inner struct{X int8; Y struct{}}",
            ]
        );
    }

    #[test]
    fn parses_embedded_fields_and_tags() {
        let file = parse(
            "type Wrapper struct {
                Base
                *Other `json:\"other\"`
                sync.Mutex
                Name string `json:\"name\"`
            }",
        );

        let fields = file.types[0].ty.as_struct().unwrap();

        let embedded = fields
            .iter()
            .map(|f| (f.name, f.embedded, f.tag))
            .collect::<Vec<_>>();

        assert_eq!(
            embedded,
            vec![
                ("Base", true, None),
                ("Other", true, Some("json:\"other\"")),
                ("Mutex", true, None),
                ("Name", false, Some("json:\"name\"")),
            ]
        );
    }

    #[test]
    fn records_integer_constants() {
        let file = parse(
            "const Size = 16
            const (
                A, B = 0x2, 3
                Ratio = 1.5
                Computed = Size * 2
                Typed uint8 = 7
            )",
        );

        let consts = file
            .consts
            .iter()
            .map(|c| (c.name, c.value))
            .collect::<Vec<_>>();

        assert_eq!(
            consts,
            vec![
                ("Size", Some(16)),
                ("A", Some(2)),
                ("B", Some(3)),
                ("Ratio", None),
                ("Computed", None),
                ("Typed", Some(7)),
            ]
        );
    }

    #[test]
    fn skips_functions_and_variables() {
        let file = parse(
            "package main

            var global = map[string]int{\"a\": 1}

            func (p *Point) Len() float64 {
                if p == nil {
                    return 0
                }
                return p.X * p.Y
            }

            type Point struct {
                X, Y float64
            }

            func main() {}
            ",
        );

        assert_eq!(file.types.len(), 1);
        assert_eq!(file.types[0].name, "Point");
    }

    #[test]
    fn types_local_to_a_function_are_skipped() {
        let file = parse(
            "package main

            func handler() {
                type request struct {
                    ID   int64
                    Done bool
                }
                _ = request{}
            }

            type Response struct{ Code int32 }
            ",
        );

        let names = file.types.iter().map(|t| t.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Response"]);
    }

    #[test]
    fn colon_after_field_name_is_malformed() {
        let result = Parser::new(
            "type Invalid struct {
                Field: string
            }",
        )
        .parse_file();

        let Err(ParseError::UnexpectedToken {
            span,
            found,
            expected,
        }) = result
        else {
            panic!("expected an unexpected token error, got {result:?}");
        };

        assert_eq!(span.start.line, 2);
        assert_eq!(found, "':'");
        assert_eq!(expected, "type");
    }

    #[test]
    fn generics_are_rejected() {
        let err = parse_file("type List[T any] struct { items []T }").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.to_string().contains("generic type parameters are not supported"));
    }

    #[test]
    fn unclosed_struct_is_reported_as_unexpected_end() {
        let err = Parser::new("type A struct {\n X int\n").parse_file().unwrap_err();
        assert_eq!(err, ParseError::UnexpectedEnd("field name or embedded type"));
    }
}
