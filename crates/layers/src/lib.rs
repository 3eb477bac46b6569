pub mod grid_layer;
pub mod layer;
pub mod symbology;

pub use grid_layer::*;
pub use layer::*;
