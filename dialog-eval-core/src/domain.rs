pub mod config;
pub mod dataset;
pub mod prompt;
pub mod result;

pub use self::config::*;
pub use dataset::*;
pub use prompt::*;
pub use result::*;
