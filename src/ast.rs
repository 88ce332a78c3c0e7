use crate::source_location::SourceSpan;
use std::fmt;

/// The declarations of one Go source file that matter for memory layout.
/// Function and variable declarations are skipped by the parser.
#[derive(Clone, Debug, Default)]
pub struct File<'a> {
    pub package: Option<&'a str>,
    pub imports: Vec<Import<'a>>,
    pub types: Vec<TypeSpec<'a>>,
    pub consts: Vec<ConstSpec<'a>>,
}

#[derive(Clone, Debug)]
pub struct Import<'a> {
    pub span: SourceSpan,
    pub alias: Option<&'a str>,
    pub path: &'a str,
}

impl<'a> Import<'a> {
    /// The name the imported package is referred to by in this file.
    pub fn package_name(&self) -> &'a str {
        match self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(self.path),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypeSpec<'a> {
    pub span: SourceSpan,
    pub name: &'a str,
    pub is_alias: bool,
    pub ty: TypeExpr<'a>,
}

#[derive(Clone, Debug)]
pub struct ConstSpec<'a> {
    pub span: SourceSpan,
    pub name: &'a str,
    /// Only set when the constant is a plain integer literal.
    pub value: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct TypeExpr<'a> {
    pub span: SourceSpan,
    pub kind: TypeExprKind<'a>,
}

#[derive(Clone, Debug)]
pub enum TypeExprKind<'a> {
    Named(&'a str),
    Qualified {
        package: &'a str,
        name: &'a str,
    },
    Pointer(Box<TypeExpr<'a>>),
    Slice(Box<TypeExpr<'a>>),
    Array {
        len: ArrayLen<'a>,
        elem: Box<TypeExpr<'a>>,
    },
    Map {
        key: Box<TypeExpr<'a>>,
        value: Box<TypeExpr<'a>>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr<'a>>,
    },
    /// Signature text with whitespace collapsed, e.g. `func(int) error`.
    Func(String),
    Interface(String),
    Struct(Vec<FieldDecl<'a>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Receive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArrayLen<'a> {
    Literal(u64),
    Constant(&'a str),
}

#[derive(Clone, Debug)]
pub struct FieldDecl<'a> {
    pub span: SourceSpan,
    pub name: &'a str,
    pub ty: TypeExpr<'a>,
    pub embedded: bool,
    pub tag: Option<&'a str>,
}

impl<'a> TypeExpr<'a> {
    pub fn as_struct(&self) -> Option<&[FieldDecl<'a>]> {
        match &self.kind {
            TypeExprKind::Struct(fields) => Some(fields.as_slice()),
            _ => None,
        }
    }

    /// The type name an embedded field of this type is known by.
    pub fn embedded_name(&self) -> Option<&'a str> {
        match &self.kind {
            TypeExprKind::Named(name) | TypeExprKind::Qualified { name, .. } => Some(*name),
            TypeExprKind::Pointer(inner) => inner.embedded_name(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TypeExprKind::*;

        match &self.kind {
            Named(name) => write!(f, "{name}"),
            Qualified { package, name } => write!(f, "{package}.{name}"),
            Pointer(inner) => write!(f, "*{inner}"),
            Slice(elem) => write!(f, "[]{elem}"),
            Array { len, elem } => match len {
                ArrayLen::Literal(n) => write!(f, "[{n}]{elem}"),
                ArrayLen::Constant(name) => write!(f, "[{name}]{elem}"),
            },
            Map { key, value } => write!(f, "map[{key}]{value}"),
            Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {elem}"),
                ChanDir::Send => write!(f, "chan<- {elem}"),
                ChanDir::Receive => write!(f, "<-chan {elem}"),
            },
            Func(signature) => write!(f, "{signature}"),
            Interface(text) => write!(f, "{text}"),
            Struct(fields) => {
                write!(f, "struct{{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                write!(f, "}}")
            }
        }
    }
}
