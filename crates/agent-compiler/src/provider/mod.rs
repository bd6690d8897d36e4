//! Provider registry and mapping: a declarative table of provider front-matter
//! conventions, plus the pure mapper that shapes a universal record for one
//! provider.

pub mod apply;
pub mod default;
pub mod load;
pub mod types;

pub use apply::*;
pub use load::*;
pub use types::*;
