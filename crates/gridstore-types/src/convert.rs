//! Conversions between Rust types and wire values.

use bytes::Bytes;
use gridstore_protocol::{EncodedValue, ValueTag};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ValueError;
use crate::value::Value;

/// A type that can be encoded as a wire value.
///
/// Implemented for the scalar types the wire carries directly, for the
/// dynamic [`Value`] union, for `Option<T>` (where `None` encodes as the
/// null tag) and for [`Json<T>`], the explicit structured fallback.
///
/// The 32-bit variant is the default integer carrier; only `i64` and `i16`
/// select the explicit wide and narrow variants.
pub trait ToValue {
    /// Encode `self` as a wire value.
    fn to_encoded(&self) -> Result<EncodedValue, ValueError>;
}

/// A type that can be decoded from a wire value.
///
/// The implementing type names the expected shape, so no runtime template
/// argument is needed: decode into `i32` for the 32-bit tag, into
/// [`Json<T>`] for structured objects, into `Option<T>` where the null tag
/// means absence, or into [`Value`] for fully dynamic scalar decoding.
pub trait FromValue: Sized {
    /// Decode a wire value into `Self`.
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError>;
}

/// Explicit structured-object fallback.
///
/// Wrapping a serde-serializable type opts it in to the structured text
/// encoding under the json tag. Decoding requires the same wrapper, which
/// names the destination shape.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize)]
/// struct Person { name: String, age: u32 }
///
/// client.put("people", "p1", &Json(person)).await?;
/// let Json(person): Json<Person> = client.get("people", "p1").await?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

pub(crate) fn tag_name(tag: ValueTag) -> &'static str {
    match tag {
        ValueTag::Null => "null",
        ValueTag::Byte => "byte",
        ValueTag::Short => "short",
        ValueTag::Int => "int",
        ValueTag::Long => "long",
        ValueTag::Bool => "bool",
        ValueTag::Float => "float",
        ValueTag::Double => "double",
        ValueTag::Binary => "binary",
        ValueTag::String => "string",
        ValueTag::Json => "json",
    }
}

fn wrong_kind(expected: &'static str, encoded: &EncodedValue) -> ValueError {
    ValueError::WrongKind {
        expected,
        actual: tag_name(encoded.tag()),
    }
}

impl ToValue for Value {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        Ok(match self {
            Self::Null => EncodedValue::Null,
            Self::Byte(v) => EncodedValue::Byte(*v),
            Self::Short(v) => EncodedValue::Short(*v),
            Self::Int(v) => EncodedValue::Int(*v),
            Self::Long(v) => EncodedValue::Long(*v),
            Self::Bool(v) => EncodedValue::Bool(*v),
            Self::Float(v) => EncodedValue::Float(*v),
            Self::Double(v) => EncodedValue::Double(*v),
            Self::Blob(v) => EncodedValue::Binary(Bytes::copy_from_slice(v)),
            Self::Text(v) => EncodedValue::String(v.clone()),
        })
    }
}

impl FromValue for Value {
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
        match encoded {
            EncodedValue::Null => Ok(Self::Null),
            EncodedValue::Byte(v) => Ok(Self::Byte(*v)),
            EncodedValue::Short(v) => Ok(Self::Short(*v)),
            EncodedValue::Int(v) => Ok(Self::Int(*v)),
            EncodedValue::Long(v) => Ok(Self::Long(*v)),
            EncodedValue::Bool(v) => Ok(Self::Bool(*v)),
            EncodedValue::Float(v) => Ok(Self::Float(*v)),
            EncodedValue::Double(v) => Ok(Self::Double(*v)),
            EncodedValue::Binary(v) => Ok(Self::Blob(v.to_vec())),
            EncodedValue::String(v) => Ok(Self::Text(v.clone())),
            EncodedValue::Json(_) => Err(ValueError::UntypedStructured),
        }
    }
}

macro_rules! scalar_conversions {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {
        $(
            impl ToValue for $ty {
                fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
                    Ok(EncodedValue::$variant(*self))
                }
            }

            impl FromValue for $ty {
                fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
                    match encoded {
                        EncodedValue::$variant(v) => Ok(*v),
                        other => Err(wrong_kind($name, other)),
                    }
                }
            }
        )*
    };
}

scalar_conversions! {
    u8 => Byte, "byte";
    i16 => Short, "short";
    i32 => Int, "int";
    i64 => Long, "long";
    bool => Bool, "bool";
    f32 => Float, "float";
    f64 => Double, "double";
}

impl ToValue for str {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        Ok(EncodedValue::String(self.to_string()))
    }
}

impl ToValue for String {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        Ok(EncodedValue::String(self.clone()))
    }
}

impl FromValue for String {
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
        match encoded {
            EncodedValue::String(v) => Ok(v.clone()),
            other => Err(wrong_kind("string", other)),
        }
    }
}

impl ToValue for [u8] {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        Ok(EncodedValue::Binary(Bytes::copy_from_slice(self)))
    }
}

impl ToValue for Vec<u8> {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        Ok(EncodedValue::Binary(Bytes::copy_from_slice(self)))
    }
}

impl FromValue for Vec<u8> {
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
        match encoded {
            EncodedValue::Binary(v) => Ok(v.to_vec()),
            other => Err(wrong_kind("binary", other)),
        }
    }
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        (**self).to_encoded()
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        match self {
            Some(v) => v.to_encoded(),
            None => Ok(EncodedValue::Null),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
        match encoded {
            EncodedValue::Null => Ok(None),
            other => Ok(Some(T::from_encoded(other)?)),
        }
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_encoded(&self) -> Result<EncodedValue, ValueError> {
        let text = serde_json::to_string(&self.0).map_err(ValueError::Serialize)?;
        Ok(EncodedValue::Json(text))
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_encoded(encoded: &EncodedValue) -> Result<Self, ValueError> {
        match encoded {
            EncodedValue::Json(text) => {
                let value = serde_json::from_str(text).map_err(ValueError::Deserialize)?;
                Ok(Self(value))
            }
            other => Err(wrong_kind("json", other)),
        }
    }
}
