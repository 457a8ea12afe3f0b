pub mod info;
pub mod ir;
pub mod model;

pub use info::*;
pub use ir::*;
pub use model::*;
