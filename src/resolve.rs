//! Turns parsed declarations into struct field lists with concrete sizes.

use crate::ast::{ArrayLen, FieldDecl, File, TypeExpr, TypeExprKind, TypeSpec};
use crate::error::Error;
use crate::layout::{FieldDescriptor, TypeLayout};
use crate::sizing::SizingModel;
use crate::source_location::{SourceLocation, SourceSpan};
use crate::types::{lookup_predeclared, Predeclared};
use log::{debug, warn};
use nohash_hasher::IntMap;
use std::collections::{HashMap, HashSet};

/// A struct type from the input with every field sized.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedStruct {
    /// Anonymous structs nested in a field are named `Outer.Field`.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
}

/// Collects every struct type declared in `file`, in declaration order.
/// An anonymous struct used by a field is listed right after the struct that
/// contains it. Any unresolved name fails the whole file.
pub fn extract_structs(file: &File<'_>, sizing: SizingModel) -> Result<Vec<ExtractedStruct>, Error> {
    let mut resolver = Resolver::new(file, sizing)?;
    resolver.validate()?;
    resolver.extract()
}

#[derive(Clone, Copy, Debug)]
enum Resolution {
    InProgress,
    Done(TypeLayout),
}

struct Resolver<'f, 'a> {
    file: &'f File<'a>,
    sizing: SizingModel,
    types: HashMap<&'a str, usize>,
    consts: HashMap<&'a str, Option<u64>>,
    packages: HashSet<&'a str>,
    // keyed by index into `file.types`
    resolved: IntMap<usize, Resolution>,
}

impl<'f, 'a> Resolver<'f, 'a> {
    fn new(file: &'f File<'a>, sizing: SizingModel) -> Result<Self, Error> {
        let mut types = HashMap::new();
        let mut consts = HashMap::new();

        for (index, spec) in file.types.iter().enumerate() {
            if spec.name == "_" {
                continue;
            }
            if types.insert(spec.name, index).is_some() {
                return Err(redeclared(spec.name, spec.span));
            }
        }

        for spec in &file.consts {
            if spec.name == "_" {
                continue;
            }
            if types.contains_key(spec.name) || consts.insert(spec.name, spec.value).is_some() {
                return Err(redeclared(spec.name, spec.span));
            }
        }

        let packages = file
            .imports
            .iter()
            .map(|import| import.package_name())
            .filter(|name| *name != "_" && *name != ".")
            .collect();

        Ok(Resolver {
            file,
            sizing,
            types,
            consts,
            packages,
            resolved: IntMap::default(),
        })
    }

    /// Checks every name used by a type declaration, in source order, so the
    /// first problem reported is the first one in the input.
    fn validate(&self) -> Result<(), Error> {
        for spec in &self.file.types {
            self.validate_type(&spec.ty)?;
        }

        Ok(())
    }

    fn validate_type(&self, ty: &TypeExpr<'a>) -> Result<(), Error> {
        match &ty.kind {
            TypeExprKind::Named(name) => self.check_type_name(name, ty.span),
            TypeExprKind::Qualified { package, name } => {
                if *package == "unsafe" && *name == "Pointer" && self.packages.contains("unsafe") {
                    Ok(())
                } else {
                    Err(Error::unresolved_package(package, ty.span.start))
                }
            }
            TypeExprKind::Pointer(inner)
            | TypeExprKind::Slice(inner)
            | TypeExprKind::Chan { elem: inner, .. } => self.validate_type(inner),
            TypeExprKind::Array { len, elem } => {
                self.array_len(len, ty.span)?;
                self.validate_type(elem)
            }
            TypeExprKind::Map { key, value } => {
                self.validate_type(key)?;
                self.validate_type(value)
            }
            // signatures and method sets never change a layout
            TypeExprKind::Func(_) | TypeExprKind::Interface(_) => Ok(()),
            TypeExprKind::Struct(fields) => {
                let mut seen = HashSet::new();
                for field in fields {
                    if field.name != "_" && !seen.insert(field.name) {
                        return Err(Error::malformed(
                            format!("duplicate field {}", field.name),
                            Some(field.span.start),
                        ));
                    }
                    self.validate_type(&field.ty)?;
                }
                Ok(())
            }
        }
    }

    fn check_type_name(&self, name: &str, span: SourceSpan) -> Result<(), Error> {
        if self.types.contains_key(name) || lookup_predeclared(name).is_some() {
            return Ok(());
        }

        if self.consts.contains_key(name) {
            return Err(Error::malformed(format!("{name} is not a type"), Some(span.start)));
        }

        Err(Error::unresolved_identifier(name, span.start))
    }

    fn array_len(&self, len: &ArrayLen<'a>, span: SourceSpan) -> Result<u64, Error> {
        match len {
            ArrayLen::Literal(n) => Ok(*n),
            ArrayLen::Constant(name) => match self.consts.get(name) {
                Some(Some(value)) => Ok(*value),
                Some(None) => Err(Error::malformed(
                    format!("array length {name} must be an integer constant"),
                    Some(span.start),
                )),
                None => Err(Error::malformed(
                    format!("undefined array length {name}"),
                    Some(span.start),
                )),
            },
        }
    }

    fn extract(&mut self) -> Result<Vec<ExtractedStruct>, Error> {
        let file = self.file;
        let mut structs = Vec::new();

        for spec in &file.types {
            if let Some(fields) = spec.ty.as_struct() {
                self.extract_struct(spec.name.to_string(), fields, spec.span.start, &mut structs)?;
            }
        }

        Ok(structs)
    }

    fn extract_struct(
        &mut self,
        name: String,
        fields: &'f [FieldDecl<'a>],
        location: SourceLocation,
        out: &mut Vec<ExtractedStruct>,
    ) -> Result<(), Error> {
        let descriptors = self.field_descriptors(fields)?;
        self.record(&descriptors, location)?;

        if descriptors.is_empty() {
            warn!("struct {name} has no fields");
        }
        debug!("extracted struct {name} with {} fields", descriptors.len());

        out.push(ExtractedStruct {
            name: name.clone(),
            fields: descriptors,
        });

        for field in fields {
            if let Some(nested) = anonymous_struct(&field.ty) {
                let nested_name = format!("{name}.{}", field.name);
                self.extract_struct(nested_name, nested, field.ty.span.start, out)?;
            }
        }

        Ok(())
    }

    fn field_descriptors(&mut self, fields: &'f [FieldDecl<'a>]) -> Result<Vec<FieldDescriptor>, Error> {
        fields
            .iter()
            .map(|field| {
                let layout = self.layout_of(&field.ty)?;
                Ok(FieldDescriptor::new(field.name, field.ty.to_string(), layout))
            })
            .collect()
    }

    fn layout_of(&mut self, ty: &'f TypeExpr<'a>) -> Result<TypeLayout, Error> {
        match &ty.kind {
            TypeExprKind::Named(name) => {
                if let Some(&index) = self.types.get(name) {
                    return self.resolve_declared(index);
                }

                match lookup_predeclared(name) {
                    Some(Predeclared::Basic(kind)) => Ok(self.sizing.basic(kind)),
                    Some(Predeclared::Interface) => Ok(self.sizing.interface()),
                    None => Err(Error::unresolved_identifier(name, ty.span.start)),
                }
            }
            // only `unsafe.Pointer` gets past validation
            TypeExprKind::Qualified { .. } => Ok(self.sizing.pointer()),
            TypeExprKind::Pointer(_)
            | TypeExprKind::Map { .. }
            | TypeExprKind::Chan { .. }
            | TypeExprKind::Func(_) => Ok(self.sizing.pointer()),
            TypeExprKind::Slice(_) => Ok(self.sizing.slice()),
            TypeExprKind::Interface(_) => Ok(self.sizing.interface()),
            TypeExprKind::Array { len, elem } => {
                let len = self.array_len(len, ty.span)?;
                let elem = self.layout_of(elem)?;

                self.sizing
                    .array(elem, len)
                    .ok_or_else(|| Error::malformed("array type too large", Some(ty.span.start)))
            }
            TypeExprKind::Struct(fields) => {
                let descriptors = self.field_descriptors(fields)?;
                self.record(&descriptors, ty.span.start)
            }
        }
    }

    fn record(&self, fields: &[FieldDescriptor], location: SourceLocation) -> Result<TypeLayout, Error> {
        self.sizing
            .record(fields)
            .ok_or_else(|| Error::malformed("struct type too large", Some(location)))
    }

    fn resolve_declared(&mut self, index: usize) -> Result<TypeLayout, Error> {
        let file = self.file;
        let spec: &'f TypeSpec<'a> = &file.types[index];

        match self.resolved.get(&index) {
            Some(Resolution::Done(layout)) => return Ok(*layout),
            Some(Resolution::InProgress) => {
                return Err(Error::malformed(
                    format!("invalid recursive type {}", spec.name),
                    Some(spec.span.start),
                ))
            }
            None => {}
        }

        self.resolved.insert(index, Resolution::InProgress);
        let layout = self.layout_of(&spec.ty)?;
        self.resolved.insert(index, Resolution::Done(layout));

        Ok(layout)
    }
}

fn redeclared(name: &str, span: SourceSpan) -> Error {
    Error::malformed(format!("{name} redeclared"), Some(span.start))
}

/// The anonymous struct a field stores by value or through a container.
fn anonymous_struct<'t, 'a>(ty: &'t TypeExpr<'a>) -> Option<&'t [FieldDecl<'a>]> {
    match &ty.kind {
        TypeExprKind::Struct(fields) => Some(fields.as_slice()),
        TypeExprKind::Pointer(inner)
        | TypeExprKind::Slice(inner)
        | TypeExprKind::Array { elem: inner, .. }
        | TypeExprKind::Chan { elem: inner, .. }
        | TypeExprKind::Map { value: inner, .. } => anonymous_struct(inner),
        _ => None,
    }
}
