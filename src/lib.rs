pub mod errors;
pub mod floyd_warshall;
pub mod graph;
pub mod loader;
pub mod matrix;
pub mod objects;
pub mod report;
pub mod traits;
