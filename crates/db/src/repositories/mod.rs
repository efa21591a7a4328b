//! Repository layer: one unit struct per table, static async methods.

pub mod point_repo;
pub mod settings_repo;
pub mod ticket_repo;

pub use point_repo::PointRepo;
pub use settings_repo::SettingsRepo;
pub use ticket_repo::{Admission, Finished, TicketRepo};
