pub mod loading;
pub mod row_store;
pub mod session_file;

pub use loading::*;
pub use row_store::*;
pub use session_file::*;
