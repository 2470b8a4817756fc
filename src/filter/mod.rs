pub mod error;
pub mod query;
pub mod types;

pub use error::FilterError;
pub use query::{Pagination, QuerySpec, MAX_PAGE_LIMIT};
pub use types::{Filters, SearchSpec, SortDirection};
