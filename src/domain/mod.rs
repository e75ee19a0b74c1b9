//! Domain layer - core business logic and entities

pub mod chain;
pub mod strategy;
pub mod trading;
pub mod wallet;
