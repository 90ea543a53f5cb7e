//! Plain data types the sample facades return. None of them know about the registry.

pub mod block;
pub mod migration;

pub use block::*;
pub use migration::*;
