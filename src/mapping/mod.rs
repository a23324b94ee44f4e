// Mapping: road centerline and Frenet coordinates

pub mod waypoint_map;

pub use waypoint_map::*;
