pub mod address;
pub mod error;
pub mod table;

pub use address::*;
pub use error::*;
pub use table::*;
