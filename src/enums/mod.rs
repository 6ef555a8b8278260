pub mod direction;
pub mod side;

pub use direction::Direction;
pub use side::Side;
