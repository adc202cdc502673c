pub mod attributes;
pub mod errors;
pub mod key;

pub use attributes::*;
pub use errors::*;
pub use key::*;
