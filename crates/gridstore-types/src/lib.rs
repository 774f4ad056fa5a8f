//! # gridstore-types
//!
//! GridStore to Rust value mappings and conversions.
//!
//! Application values cross the wire as the
//! [`EncodedValue`](gridstore_protocol::EncodedValue) tagged union. This
//! crate maps between that representation and native Rust values:
//!
//! - [`Value`] is the closed dynamic union: every scalar the wire can
//!   carry, plus null.
//! - [`ToValue`] / [`FromValue`] convert concrete Rust types at the API
//!   boundary; the destination type parameter plays the role of the
//!   decode template.
//! - [`Json<T>`] is the explicit opt-in fallback for composite types: any
//!   serde-serializable value travels under the structured-object tag.
//!
//! List and table encodings, and the error taxonomy for conversion
//! failures, live here as well.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod codec;
pub mod convert;
pub mod error;
pub mod table;
pub mod value;

pub use codec::{decode_value, decode_value_list, encode_list, encode_value, encode_value_list};
pub use convert::{FromValue, Json, ToValue};
pub use error::ValueError;
pub use table::{decode_table, encode_table};
pub use value::Value;
