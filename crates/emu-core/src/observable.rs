//! Read-only state inspection.
//!
//! Debuggers and tests query component state by dotted path. Queries never
//! affect emulation state.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// Symbolic state such as a mode name.
    Str(&'static str),
    Array(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U32(v) => write!(f, "{v:#010X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::Str(v) => f.write_str(v),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        })*
    };
}

value_from!(bool => Bool, u8 => U8, u16 => U16, u32 => U32, u64 => U64, &'static str => Str);

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a property by dotted path, e.g. `beam.vpos` or `blitter.busy`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path `query` understands.
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_hex_widths() {
        assert_eq!(Value::U8(0x0A).to_string(), "0x0A");
        assert_eq!(Value::U16(0x1F).to_string(), "0x001F");
        assert_eq!(Value::U32(0xC0_0000).to_string(), "0x00C00000");
        assert_eq!(Value::from("line").to_string(), "line");
        assert_eq!(
            Value::Array(vec![Value::Bool(true), Value::U64(3)]).to_string(),
            "[true, 3]"
        );
    }
}
