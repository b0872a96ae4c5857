pub mod error;
pub mod filter;
pub mod filter_match;
pub mod filter_order;
pub mod filter_where;
pub mod types;

pub use error::FilterError;
pub use filter::Filter;
pub use filter_where::Condition;
pub use types::*;
