//! Entry points for value and sequence conversion.
//!
//! Thin named wrappers over the [`ToValue`]/[`FromValue`] traits, matching
//! the operational surface the rest of the driver is written against.

use gridstore_protocol::{EncodedValue, EncodedValueList};

use crate::convert::{FromValue, ToValue};
use crate::error::ValueError;

/// Encode one value.
pub fn encode_value<T: ToValue + ?Sized>(value: &T) -> Result<EncodedValue, ValueError> {
    value.to_encoded()
}

/// Decode one value into the destination type.
pub fn decode_value<T: FromValue>(encoded: &EncodedValue) -> Result<T, ValueError> {
    T::from_encoded(encoded)
}

/// Encode a homogeneous sequence element-wise.
///
/// The first element failure aborts the encoding.
pub fn encode_list<T: ToValue>(values: &[T]) -> Result<Vec<EncodedValue>, ValueError> {
    values.iter().map(ToValue::to_encoded).collect()
}

/// Encode a homogeneous sequence into the wire list structure.
pub fn encode_value_list<T: ToValue>(values: &[T]) -> Result<EncodedValueList, ValueError> {
    Ok(EncodedValueList {
        elements: encode_list(values)?,
    })
}

/// Decode a wire list element-wise into the destination type.
///
/// The first element failure aborts the decoding; batch operations with
/// per-entry failure capture layer their own semantics above this.
pub fn decode_value_list<T: FromValue>(list: &EncodedValueList) -> Result<Vec<T>, ValueError> {
    list.elements.iter().map(T::from_encoded).collect()
}

#[cfg(test)]
mod tests {
    use crate::value::Value;

    use super::*;

    #[test]
    fn test_encode_list_preserves_order() {
        let encoded = encode_list(&[10i32, 20, 30]).expect("encode");
        assert_eq!(
            encoded,
            vec![
                EncodedValue::Int(10),
                EncodedValue::Int(20),
                EncodedValue::Int(30)
            ]
        );
    }

    #[test]
    fn test_decode_value_list_dynamic() {
        let list = EncodedValueList {
            elements: vec![
                EncodedValue::Int(1),
                EncodedValue::String("two".to_string()),
                EncodedValue::Null,
            ],
        };
        let decoded: Vec<Value> = decode_value_list(&list).expect("decode");
        assert_eq!(
            decoded,
            vec![Value::Int(1), Value::Text("two".to_string()), Value::Null]
        );
    }

    #[test]
    fn test_decode_value_list_propagates_first_failure() {
        let list = EncodedValueList {
            elements: vec![EncodedValue::Int(1), EncodedValue::String("x".to_string())],
        };
        assert!(decode_value_list::<i32>(&list).is_err());
    }
}
