//! Fixed-width record layout types
//!
//! Offsets are the prefix sum of column sizes in declaration order; there is
//! no padding and no reordering.

use std::fmt;

use serde::Serialize;

/// Storage type of one column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalType {
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float,
    Double,
}

impl LogicalType {
    /// C type name in generated code
    pub fn c_type(&self) -> &'static str {
        match self {
            LogicalType::Int32 => "int32_t",
            LogicalType::UInt32 => "uint32_t",
            LogicalType::Int64 => "int64_t",
            LogicalType::UInt64 => "uint64_t",
            LogicalType::Float => "float",
            LogicalType::Double => "double",
        }
    }

    pub fn byte_size(&self) -> u8 {
        match self {
            LogicalType::Int32 | LogicalType::UInt32 | LogicalType::Float => 4,
            LogicalType::Int64 | LogicalType::UInt64 | LogicalType::Double => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, LogicalType::Float | LogicalType::Double)
    }

    pub fn is_signed(&self) -> bool {
        !matches!(self, LogicalType::UInt32 | LogicalType::UInt64)
    }

    /// printf conversion used by the CSV driver
    pub fn printf_spec(&self) -> &'static str {
        if self.is_float() {
            "%f"
        } else {
            "%d"
        }
    }

    /// Integer type of the given width; `None` for widths other than 4 or 8
    pub fn integer(byte_size: u8, signed: bool) -> Option<LogicalType> {
        match (byte_size, signed) {
            (4, true) => Some(LogicalType::Int32),
            (4, false) => Some(LogicalType::UInt32),
            (8, true) => Some(LogicalType::Int64),
            (8, false) => Some(LogicalType::UInt64),
            _ => None,
        }
    }

    /// Floating type of the given width; `None` for widths other than 4 or 8
    pub fn floating(byte_size: u8) -> Option<LogicalType> {
        match byte_size {
            4 => Some(LogicalType::Float),
            8 => Some(LogicalType::Double),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.c_type())
    }
}

/// One column of a record layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub byte_size: u8,
    pub logical_type: LogicalType,
    pub byte_offset: usize,
}

/// Ordered record layout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column at the end of the record
    pub fn push(&mut self, name: impl Into<String>, logical_type: LogicalType) -> usize {
        let byte_offset = self.record_size();
        self.columns.push(Column {
            name: name.into(),
            byte_size: logical_type.byte_size(),
            logical_type,
            byte_offset,
        });
        self.columns.len() - 1
    }

    /// Change a column's type, shifting later offsets if the width changed
    pub fn retype(&mut self, index: usize, logical_type: LogicalType) {
        if let Some(column) = self.columns.get_mut(index) {
            column.logical_type = logical_type;
            column.byte_size = logical_type.byte_size();
        }
        let mut offset = 0;
        for column in &mut self.columns {
            column.byte_offset = offset;
            offset += column.byte_size as usize;
        }
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sum of all column sizes
    pub fn record_size(&self) -> usize {
        self.columns.iter().map(|c| c.byte_size as usize).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter()
    }
}
