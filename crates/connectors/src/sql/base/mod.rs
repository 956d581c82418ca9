pub mod error;
pub mod query;
pub mod source;
