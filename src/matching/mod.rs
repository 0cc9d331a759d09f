pub mod engine;
pub mod name;
pub mod resolution;
pub mod scorer;
