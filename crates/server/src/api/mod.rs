pub mod artifacts;
pub mod batch;
pub mod convert;
pub mod detect;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod routes;

pub use routes::create_router;
