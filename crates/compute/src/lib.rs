pub mod analysis;
pub mod controller;
pub mod grid;
pub mod points;

pub use controller::*;
pub use grid::*;
pub use points::*;
