use crate::error::Error;
use crate::layout::{align_up, FieldDescriptor, Layout, TypeLayout};
use crate::types::BasicKind;

/// Target word size and alignment cap, following the rules Go uses for its
/// standard sizes. The default describes a 64-bit target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizingModel {
    word_size: u64,
    max_align: u64,
}

impl Default for SizingModel {
    fn default() -> Self {
        SizingModel {
            word_size: Self::DEFAULT_WORD_SIZE,
            max_align: Self::DEFAULT_MAX_ALIGN,
        }
    }
}

impl SizingModel {
    pub const DEFAULT_WORD_SIZE: u64 = 8;
    pub const DEFAULT_MAX_ALIGN: u64 = 8;

    pub fn new(word_size: u64, max_align: u64) -> Result<SizingModel, Error> {
        for (what, value) in [("word size", word_size), ("max alignment", max_align)] {
            if !value.is_power_of_two() {
                return Err(Error::InvalidSizingConfig(format!(
                    "{what} must be a positive power of two, got {value}"
                )));
            }
        }

        Ok(SizingModel {
            word_size,
            max_align,
        })
    }

    pub fn word_size(&self) -> u64 {
        self.word_size
    }

    pub fn max_align(&self) -> u64 {
        self.max_align
    }

    pub fn basic(&self, kind: BasicKind) -> TypeLayout {
        TypeLayout::new(self.size_of(kind), self.align_of(kind))
    }

    pub fn size_of(&self, kind: BasicKind) -> u64 {
        use BasicKind::*;

        match kind {
            Bool | Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float32 => 4,
            Int64 | Uint64 | Float64 | Complex64 => 8,
            Complex128 => 16,
            Int | Uint | Uintptr => self.word_size,
            String => 2 * self.word_size,
        }
    }

    pub fn align_of(&self, kind: BasicKind) -> u64 {
        match kind {
            BasicKind::String => self.word_align(),
            // complex numbers align like a pair of floats
            _ if kind.is_complex() => self.clamp_align(self.size_of(kind) / 2),
            _ => self.clamp_align(self.size_of(kind)),
        }
    }

    fn clamp_align(&self, align: u64) -> u64 {
        align.clamp(1, self.max_align)
    }

    fn word_align(&self) -> u64 {
        self.clamp_align(self.word_size)
    }

    /// Pointers, maps, channels, functions and `unsafe.Pointer`.
    pub fn pointer(&self) -> TypeLayout {
        TypeLayout::new(self.word_size, self.word_align())
    }

    pub fn string(&self) -> TypeLayout {
        self.basic(BasicKind::String)
    }

    pub fn interface(&self) -> TypeLayout {
        TypeLayout::new(2 * self.word_size, self.word_align())
    }

    pub fn slice(&self) -> TypeLayout {
        TypeLayout::new(3 * self.word_size, self.word_align())
    }

    /// `[len]elem`. The last element carries no trailing stride padding.
    /// Returns `None` when the size does not fit in a `u64`.
    pub fn array(&self, elem: TypeLayout, len: u64) -> Option<TypeLayout> {
        if len == 0 {
            return Some(TypeLayout::new(0, elem.align));
        }

        let stride = align_up(elem.size, elem.align)?;
        let size = stride.checked_mul(len - 1)?.checked_add(elem.size)?;

        Some(TypeLayout::new(size, elem.align))
    }

    /// A struct's size includes its tail padding, its alignment is that of its
    /// widest-aligned member. `None` when the struct does not fit in a `u64`.
    pub fn record(&self, fields: &[FieldDescriptor]) -> Option<TypeLayout> {
        Layout::declared(fields).map(|layout| layout.type_layout())
    }
}
