pub mod behavior;
pub mod constants;
pub mod defs;
pub mod engine;
pub mod entity;
pub mod map;
pub mod pathfind;
pub mod rng;
pub mod types;
