pub mod row;
pub mod source;
pub mod types;
pub mod utils;
