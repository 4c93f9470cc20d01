//! Custom serde modules for types that serialize through their text grammar.

pub mod conditions;
