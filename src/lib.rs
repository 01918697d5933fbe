pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub use error::{Error, Result};
