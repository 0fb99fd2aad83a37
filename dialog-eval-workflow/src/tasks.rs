pub mod data_loading;
pub mod evaluation;
pub mod inference;
pub mod prompting;
pub mod reporting;

pub use data_loading::*;
pub use evaluation::*;
pub use inference::*;
pub use prompting::*;
pub use reporting::*;
