pub mod event;
pub mod mapgen;
pub mod step;
pub mod world;
