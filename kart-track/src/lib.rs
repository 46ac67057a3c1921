//! Items and track objects of a kart racing game, with their per-frame logic.

pub mod geom;
pub mod config;
pub mod kart;
pub mod render;

pub mod item;
pub mod object;
pub mod manager;
