//! Domain model and pure logic for the boothline queue-ticketing engine.
//!
//! Nothing in this crate touches I/O. Storage backends implement the
//! traits in [`store`]; the admission logic lives in `boothline-engine`.

pub mod error;
pub mod eta;
pub mod point;
pub mod settings;
pub mod store;
pub mod ticket;
pub mod types;
