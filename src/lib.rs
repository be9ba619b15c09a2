// Library exports for the tournament Battlesnake
// The server binary, the replay tool and the integration tests all use the core logic from here

pub mod bot;
pub mod config;
pub mod debug_logger;
pub mod engine;
pub mod flood_fill;
pub mod grid;
pub mod pathfinding;
pub mod prediction;
pub mod replay;
pub mod scoring;
pub mod session;
pub mod simple_profiler;
pub mod strategy;
pub mod types;
