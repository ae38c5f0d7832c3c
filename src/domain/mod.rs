pub mod animation;
pub mod body;
pub mod clock;
pub mod entity;
pub mod geom;
pub mod player;
pub mod tile;
pub mod tilemap;
