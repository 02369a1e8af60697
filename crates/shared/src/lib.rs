//! Wire and domain types shared between the findability client crates.

pub mod domain;
pub mod error;
pub mod protocol;
pub mod signals;
