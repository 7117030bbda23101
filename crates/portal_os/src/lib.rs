#![forbid(unsafe_code)]

pub mod admin_gate;
pub mod registration;
