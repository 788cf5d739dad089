//! Homestead - Automated Settler Decision Engine

pub mod core;
pub mod engine;
pub mod game;
pub mod map;
