//! Type definitions

pub mod cell;
pub mod export;
pub mod header;
pub mod import;
pub mod record;

pub use cell::*;
pub use export::*;
pub use header::*;
pub use import::*;
pub use record::*;
