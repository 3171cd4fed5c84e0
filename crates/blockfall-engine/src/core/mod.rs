pub use self::{board::*, color::*, shape::*};

pub(crate) mod board;
pub(crate) mod color;
pub(crate) mod shape;
