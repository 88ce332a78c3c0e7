use serde::Serialize;

/// Go's predeclared numeric, boolean and string types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BasicKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    /// `int`, `uint` and `uintptr` are as wide as a machine word.
    Int,
    Uint,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
}

impl BasicKind {
    pub fn is_complex(self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }
}

/// What a predeclared identifier stands for when used as a type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predeclared {
    Basic(BasicKind),
    /// `any` and `error`.
    Interface,
}

pub fn lookup_predeclared(name: &str) -> Option<Predeclared> {
    use BasicKind::*;

    let kind = match name {
        "bool" => Bool,
        "int8" => Int8,
        "int16" => Int16,
        "int32" | "rune" => Int32,
        "int64" => Int64,
        "uint8" | "byte" => Uint8,
        "uint16" => Uint16,
        "uint32" => Uint32,
        "uint64" => Uint64,
        "int" => Int,
        "uint" => Uint,
        "uintptr" => Uintptr,
        "float32" => Float32,
        "float64" => Float64,
        "complex64" => Complex64,
        "complex128" => Complex128,
        "string" => String,
        "any" | "error" => return Some(Predeclared::Interface),
        _ => return None,
    };

    Some(Predeclared::Basic(kind))
}
