pub mod models;
pub mod projector;
pub mod testing;
