//! Implementation of search algorithms.
//!
//! These run path-finding over the nodes of a [`crate::grid::Grid`].

pub mod astar;
