#![forbid(unsafe_code)]

pub mod admin;
pub mod common;
mod lenient;
pub mod visitor;

pub use common::{MonotonicTimeNs, Validate, ValidationError};
