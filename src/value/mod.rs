//! Value codec
//!
//! Converts between the text callers pass in and the fixed-width bytes a
//! record stores, one rule set per field type. Validation happens here, at
//! the point of mutation, never at encode time.

mod codec;

pub use codec::{
    decode_value, encode_value, format_bool, format_date, format_float, parse_bool, parse_date,
    parse_float64, parse_int64, PADDING,
};
