//! Byte layout of a struct's fields, in declaration order and in a
//! reordering that minimizes padding.

use crate::error::Error;
use log::{debug, trace};
use serde::Serialize;

pub const PADDING_NAME: &str = "padding";
pub const TAIL_PADDING_NAME: &str = "tail padding";

/// Size and alignment of a value, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TypeLayout {
    pub size: u64,
    pub align: u64,
}

impl TypeLayout {
    pub const fn new(size: u64, align: u64) -> TypeLayout {
        TypeLayout { size, align }
    }
}

/// One struct member, or a run of padding bytes the engine inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    /// Empty for padding.
    pub type_name: String,
    pub size: u64,
    /// Always a power of two. Padding uses 1.
    pub align: u64,
    pub is_padding: bool,
}

impl FieldDescriptor {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        layout: TypeLayout,
    ) -> FieldDescriptor {
        debug_assert!(layout.align.is_power_of_two());

        FieldDescriptor {
            name: name.into(),
            type_name: type_name.into(),
            size: layout.size,
            align: layout.align,
            is_padding: false,
        }
    }

    fn padding(name: &str, size: u64) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            type_name: String::new(),
            size,
            align: 1,
            is_padding: true,
        }
    }

    pub fn layout(&self) -> TypeLayout {
        TypeLayout::new(self.size, self.align)
    }
}

/// Rounds `offset` up to the next multiple of `align`, `None` on overflow.
pub fn align_up(offset: u64, align: u64) -> Option<u64> {
    match offset % align {
        0 => Some(offset),
        rem => offset.checked_add(align - rem),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedField<'a> {
    pub offset: u64,
    pub field: &'a FieldDescriptor,
}

/// An ordered field sequence with its padding. Offsets are not stored, they
/// follow from the sizes of everything placed before a field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<FieldDescriptor>,
}

impl Layout {
    /// Places the fields in the order given, inserting padding wherever a
    /// field's alignment requires it and after the last field so the total
    /// size is a multiple of the struct's alignment. Padding entries in the
    /// input are ignored.
    ///
    /// Returns `None` when the struct would not fit in a `u64`. Every offset
    /// of a layout that was built is therefore representable.
    pub fn declared<'f>(fields: impl IntoIterator<Item = &'f FieldDescriptor>) -> Option<Layout> {
        let mut layout = Layout::default();
        let mut offset: u64 = 0;
        let mut struct_align = 1;

        for field in fields.into_iter().filter(|f| !f.is_padding) {
            let aligned = align_up(offset, field.align)?;
            if aligned != offset {
                layout.push_padding(PADDING_NAME, offset, aligned - offset);
                offset = aligned;
            }

            layout.fields.push(field.clone());
            offset = offset.checked_add(field.size)?;
            struct_align = struct_align.max(field.align);
        }

        let end = align_up(offset, struct_align)?;
        if end != offset {
            layout.push_padding(TAIL_PADDING_NAME, offset, end - offset);
        }

        Some(layout)
    }

    /// Places the fields widest alignment first, then largest size first.
    /// Fields that tie on both keep their declaration order.
    pub fn optimized(fields: &[FieldDescriptor]) -> Option<Layout> {
        let mut sorted = fields.iter().filter(|f| !f.is_padding).collect::<Vec<_>>();

        sorted.sort_by(|a, b| b.align.cmp(&a.align).then(b.size.cmp(&a.size)));

        Layout::declared(sorted)
    }

    fn push_padding(&mut self, name: &str, offset: u64, size: u64) {
        debug_assert!(size > 0);

        trace!("{size} bytes of {name} at offset {offset}");

        match self.fields.last_mut() {
            Some(last) if last.is_padding => last.size += size,
            _ => self.fields.push(FieldDescriptor::padding(name, size)),
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn real_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.fields.iter().filter(|f| !f.is_padding)
    }

    pub fn padding(&self) -> impl Iterator<Item = PlacedField<'_>> + '_ {
        self.placed().filter(|p| p.field.is_padding)
    }

    pub fn placed(&self) -> impl Iterator<Item = PlacedField<'_>> + '_ {
        self.fields.iter().scan(0, |offset, field| {
            let placed = PlacedField {
                offset: *offset,
                field,
            };
            *offset += field.size;
            Some(placed)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.fields.iter().map(|f| f.size).sum()
    }

    pub fn struct_align(&self) -> u64 {
        self.real_fields().map(|f| f.align).max().unwrap_or(1)
    }

    pub fn type_layout(&self) -> TypeLayout {
        TypeLayout::new(self.total_size(), self.struct_align())
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.fields
            .iter()
            .filter(|f| f.is_padding)
            .map(|f| f.size)
            .sum()
    }

    pub fn wasted_percent(&self) -> f64 {
        percent(self.wasted_bytes(), self.total_size())
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }

    part as f64 / whole as f64 * 100.0
}

/// The analysis of one struct type: its layout as declared and the layout
/// after reordering.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutResult {
    name: String,
    declared: Layout,
    optimized: Layout,
}

impl LayoutResult {
    /// Lays `fields` out both ways. When a field's size is not a multiple of
    /// its alignment the sorted order can come out larger, in which case the
    /// declared order is kept as the optimized one.
    pub fn new(name: impl Into<String>, fields: &[FieldDescriptor]) -> Result<LayoutResult, Error> {
        let name = name.into();
        let too_large = || Error::malformed(format!("struct type {name} too large"), None);

        let declared = Layout::declared(fields).ok_or_else(too_large)?;
        let optimized = match Layout::optimized(fields) {
            Some(sorted) if sorted.total_size() <= declared.total_size() => sorted,
            _ => {
                debug!("{name}: reordering does not shrink the struct");
                declared.clone()
            }
        };

        Ok(LayoutResult {
            name,
            declared,
            optimized,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declared(&self) -> &Layout {
        &self.declared
    }

    pub fn optimized(&self) -> &Layout {
        &self.optimized
    }

    pub fn total_size(&self) -> u64 {
        self.declared.total_size()
    }

    pub fn optimized_total_size(&self) -> u64 {
        self.optimized.total_size()
    }

    pub fn wasted_bytes(&self) -> u64 {
        self.declared.wasted_bytes()
    }

    pub fn wasted_percent(&self) -> f64 {
        self.declared.wasted_percent()
    }

    pub fn optimized_wasted_bytes(&self) -> u64 {
        self.optimized.wasted_bytes()
    }

    /// Relative to the optimized total size.
    pub fn optimized_wasted_percent(&self) -> f64 {
        self.optimized.wasted_percent()
    }

    pub fn saved_bytes(&self) -> u64 {
        self.total_size().saturating_sub(self.optimized_total_size())
    }
}
