pub mod admin;
pub mod common;
pub mod enrollment;
pub mod envelope;
pub mod filter;
pub mod location;
pub mod record;
pub mod session;

pub use admin::*;
pub use common::*;
pub use enrollment::*;
pub use envelope::*;
pub use filter::*;
pub use location::*;
pub use record::*;
pub use session::*;
