pub mod health;
pub mod standings;
