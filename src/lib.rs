use shadow_rs::shadow;

shadow!(build);

// Internals
// ---------
pub mod data_structures;

// Grids
// -----
pub mod cost;
pub mod grid;
pub mod path;
pub mod problem;

// Algorithms
// ----------
pub mod algorithms;
pub mod config;
pub mod visual;
