pub mod grid;
pub mod meta;
pub mod tile;

pub use grid::GridRange;
pub use meta::*;
pub use tile::*;
