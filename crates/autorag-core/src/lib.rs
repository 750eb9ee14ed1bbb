pub mod error;
pub mod frame;
pub mod projection;
pub mod table;

pub use error::ShapeMismatchError;
pub use frame::*;
pub use projection::*;
pub use table::*;
