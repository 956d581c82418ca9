pub mod encoding;
pub mod utils;
pub mod value;
pub mod window;
