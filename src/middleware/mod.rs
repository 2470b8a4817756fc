pub mod auth;
pub mod request_id;
pub mod response;

pub use auth::{listener_id, require_admin, requires_admin, LISTENER_ID_HEADER};
pub use request_id::{request_id_middleware, REQUEST_ID_HEADER};
pub use response::{failure_body, ApiResponse, ApiResult};
