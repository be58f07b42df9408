//! Core data models for league standings.

mod game;
mod roster;
mod snapshot;
mod standing;
mod team;

pub use game::*;
pub use roster::*;
pub use snapshot::*;
pub use standing::*;
pub use team::*;
