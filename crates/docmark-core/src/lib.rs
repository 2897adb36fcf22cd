#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

//! Domain model and pure pipeline stages of docmark: page ordering, date
//! annotation, bookmark aggregation and document assembly.

pub mod assembler;
pub mod bookmarks;
pub mod config;
pub mod dates;
pub mod error;
pub mod ordering;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
