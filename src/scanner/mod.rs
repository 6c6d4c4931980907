//! Cache scanner: directory walker, artifact patterns, path safety filter, sweeper.

pub mod patterns;
pub mod protection;
pub mod sweeper;
pub mod walker;
