pub mod manager;
pub mod models;
pub mod repositories;

pub use manager::{Database, StoreError};
