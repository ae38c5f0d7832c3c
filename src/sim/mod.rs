pub mod event;
pub mod level;
pub mod save;
pub mod scores;
pub mod step;
pub mod world;
