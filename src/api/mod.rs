pub mod client;
pub mod error;
pub mod traits;

pub use client::*;
pub use error::*;
pub use traits::*;
