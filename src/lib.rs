pub mod config;
pub mod damping;
pub mod error;
pub mod load;
pub mod prelude;
pub mod solver;
pub mod system;

pub use error::{Error, Result};
