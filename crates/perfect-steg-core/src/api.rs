//! File based entry points, builder style.

pub mod extract;
pub mod hide;
