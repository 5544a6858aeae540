pub mod check;
pub mod extract;
pub mod hide;
