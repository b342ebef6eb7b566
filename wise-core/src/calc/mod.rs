//! Request builders and response parsers for the Builder's calculators.
//!
//! Every calculator is one request/response exchange: a command key, one
//! payload line, and a response that is either one fixed-size chunk or a
//! run of records ended by the `COMPLETE` sentinel. Parsing
//! never fails; a response of the wrong shape is logged and yields a
//! result that is not calculated, or an empty list.

pub mod fbp;
pub mod fuels;
pub mod fwi;
pub mod solar;
pub mod weather;

use log::warn;
use wise_utils::fields::{field_offset, split_fields};

/// Field that ends a multi-record response.
pub const COMPLETE: &str = "COMPLETE";

/// How a caller knows a response has fully arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// One chunk of exactly this many `|` or newline separated fields.
    Fields(usize),
    /// Any number of records followed by [`COMPLETE`].
    Sentinel,
}

/// A calculator request and the parser of its response.
pub trait Calculation {
    type Output;

    /// Command key sent after `STARTUP`.
    const COMMAND: &'static str;
    const SHAPE: ResponseShape;

    /// Lines sent after the command key.
    fn payload(&self) -> Vec<String>;

    fn parse(&self, response: &str) -> Self::Output;
}

/// Text up to, not including, the first `COMPLETE` field.
pub fn before_sentinel(response: &str) -> &str {
    match field_offset(response, COMPLETE) {
        Some(offset) => &response[..offset],
        None => response,
    }
}

/// Split a fixed-arity response, or log and give up on a field count
/// mismatch.
pub(crate) fn exact_fields<'a>(calculator: &str, response: &'a str, expected: usize) -> Option<Vec<&'a str>> {
    let fields = split_fields(response);
    if fields.len() == expected {
        Some(fields)
    } else {
        warn!(
            "{calculator} response has {} fields, expected {expected}",
            fields.len()
        );
        None
    }
}

/// Split a sentinel-terminated response into groups of `width` fields.
pub(crate) fn field_groups<'a>(calculator: &str, response: &'a str, width: usize) -> Vec<Vec<&'a str>> {
    let fields = split_fields(before_sentinel(response));
    if fields.len() % width != 0 {
        warn!(
            "{calculator} response has {} fields, not a multiple of {width}",
            fields.len()
        );
        return Vec::new();
    }
    fields.chunks(width).map(<[&str]>::to_vec).collect()
}

/// Parse a number, logging the field that failed.
pub(crate) fn number(calculator: &str, field: &str) -> Option<f64> {
    match field.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{calculator} response field '{field}' is not a number");
            None
        }
    }
}

/// Parse every field as a number, or none of them.
pub(crate) fn numbers(calculator: &str, fields: &[&str]) -> Option<Vec<f64>> {
    fields.iter().map(|field| number(calculator, field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_before_sentinel() {
        assert_eq!(before_sentinel("a|b\nc|d\nCOMPLETE\nignored\n"), "a|b\nc|d\n");
        assert_eq!(before_sentinel("a|b\r\nCOMPLETE\r\n"), "a|b\r\n");
        assert_eq!(before_sentinel("a|b\nCOMPLETE"), "a|b\n");
        assert_eq!(before_sentinel("no sentinel"), "no sentinel");
    }

    #[test]
    fn test_field_groups() {
        let groups = field_groups("TEST", "1|a\n2|b\nCOMPLETE\n3|c\n", 2);
        assert_eq!(groups, vec![vec!["1", "a"], vec!["2", "b"]]);
        assert!(field_groups("TEST", "1|a|2\nCOMPLETE\n", 2).is_empty());
    }

    #[test]
    fn test_numbers_all_or_nothing() {
        assert_eq!(numbers("TEST", &["1", "2.5"]), Some(vec![1.0, 2.5]));
        assert_eq!(numbers("TEST", &["1", "x"]), None);
    }
}
