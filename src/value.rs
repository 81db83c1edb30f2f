//! Pascal-- runtime values — a tagged union over integer, double and string.
//!
//! A variable's tag is fixed by its declaration. Arithmetic is always carried
//! out in `f64`; the tag only decides how a result is stored.

use std::fmt;

/// Fractional digits used when `Write` formats a number.
pub const WRITE_PRECISION: usize = 14;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Double(f64),
    Str(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Double(_) => "double",
            Self::Str(_) => "string",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Double(_))
    }

    /// Numeric view of the value; `None` for strings.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Double(d) => Some(*d),
            Self::Str(_) => None,
        }
    }

    /// True when both values carry the same tag.
    pub fn same_tag(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Store a computed number under this value's tag: integers truncate
    /// toward zero, doubles keep the number. `None` for string values.
    #[allow(clippy::cast_possible_truncation)]
    pub fn narrow(&self, number: f64) -> Option<Self> {
        match self {
            Self::Int(_) => Some(Self::Int(number as i64)),
            Self::Double(_) => Some(Self::Double(number)),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Double(d) => f.write_str(&format_number(*d)),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

/// Fixed-point formatting with `WRITE_PRECISION` digits, then trailing zeros
/// and a bare trailing decimal point stripped.
pub fn format_number(number: f64) -> String {
    let s = format!("{number:.prec$}", prec = WRITE_PRECISION);
    if s.contains('.') {
        let s = s.trim_end_matches('0');
        let s = s.trim_end_matches('.');
        s.to_string()
    } else {
        s
    }
}
