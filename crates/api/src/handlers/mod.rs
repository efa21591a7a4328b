pub mod admin;
pub mod points;
pub mod queue;
pub mod settings;
pub mod stream;
pub mod tickets;
