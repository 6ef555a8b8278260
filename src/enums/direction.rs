use serde::Serialize;
use strum_macros::Display;

/// Direction of a triangular cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
pub enum Direction {
    /// A -> B -> C -> A
    Forward,
    /// A -> C -> B -> A
    Reverse,
}
