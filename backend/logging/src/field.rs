//! Key/value fields attached to records.

use serde_json::Value;

/// Key recorded for a value that arrived without a string key.
pub const BAD_KEY: &str = "!BADKEY";

/// A single structured field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> From<(K, V)> for Field {
    fn from((key, value): (K, V)) -> Self {
        Field::new(key, value)
    }
}

/// Pair a flat `key, value, key, value, ...` list into fields.
///
/// A string followed by another item becomes that item's key. A non-string
/// in key position, or a trailing string with nothing after it, is kept
/// under [`BAD_KEY`] instead of being dropped.
pub fn fields_from_args(args: &[Value]) -> Vec<Field> {
    let mut fields = Vec::with_capacity(args.len() / 2 + 1);
    let mut rest = args;
    while let Some((first, tail)) = rest.split_first() {
        match (first, tail.split_first()) {
            (Value::String(key), Some((value, tail))) => {
                fields.push(Field::new(key.clone(), value.clone()));
                rest = tail;
            }
            (other, _) => {
                fields.push(Field::new(BAD_KEY, other.clone()));
                rest = tail;
            }
        }
    }
    fields
}

/// Build a flat key/value argument list for [`Logger`](crate::Logger) calls.
///
/// ```
/// use sentinel::kv;
///
/// let args = kv!["port", 8080, "tls", false];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! kv {
    () => {{
        let empty: [$crate::Value; 0] = [];
        empty
    }};
    ($($item:expr),+ $(,)?) => {
        [$($crate::Value::from($item)),+]
    };
}
