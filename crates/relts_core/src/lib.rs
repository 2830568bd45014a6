pub mod api;
pub mod dictionary;
pub mod error;
pub mod filter;
pub mod ids;
pub mod reshape;
pub mod value;

pub use api::*;
pub use dictionary::*;
pub use error::{TsError, TsResult};
pub use filter::{resolve_filter, NameFilter, ResolvedSet};
pub use ids::*;
pub use value::*;
