//! Type definitions for ghtrends

mod activity;
mod error;
mod metric;

pub use activity::*;
pub use error::*;
pub use metric::*;
