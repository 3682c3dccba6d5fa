pub mod avatar;
pub mod entity;
pub mod geometry;
pub mod selection;
pub mod tile;
