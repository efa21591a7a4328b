pub mod point;
pub mod ticket;
