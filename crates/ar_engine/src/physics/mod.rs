//! Ray queries used by placement and the simulated tracker

pub mod ray;

pub use ray::Ray;
