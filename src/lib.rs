pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod deal;
pub mod error;
pub mod filter;
pub mod geo;
pub mod input;
pub mod output;
pub mod table;

pub use deal::Deal;
pub use error::{DealError, DealResult};
pub use table::{Table, Value};
