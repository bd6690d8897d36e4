//! Record domain types: kinds, universal records, naming, compiled artifacts.

pub mod artifact;
pub mod naming;
pub mod record;

pub use artifact::*;
pub use naming::*;
pub use record::*;
