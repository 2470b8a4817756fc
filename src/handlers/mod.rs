// handlers/mod.rs - HTTP handlers
//
// public:   service banner, health and 404/405 fallbacks, no authorization
// resource: generic CRUD handlers shared by every resource kind; each call
//           checks the resource's access policy before touching the store

pub mod public;
pub mod resource;

pub use public::{health, method_not_allowed, not_found, root};
pub use resource::{resource_routes, ResourceState};
