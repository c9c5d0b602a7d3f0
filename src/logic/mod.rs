pub mod dispatcher;
pub mod notifications;
pub mod row_filter;
pub mod table;

pub use dispatcher::*;
pub use notifications::*;
pub use row_filter::*;
pub use table::*;
