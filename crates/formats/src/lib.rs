pub mod cell_export;
pub mod point_source;

pub use cell_export::*;
pub use point_source::*;
