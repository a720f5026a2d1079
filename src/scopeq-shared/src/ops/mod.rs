//! Core operations on values
//!
//! This module provides the comparison and arithmetic helpers that the
//! predicate evaluator applies to operands.

pub mod utils;


pub use utils::{add_values, compare_values, div_values, mul_values, negate_value, sub_values};
