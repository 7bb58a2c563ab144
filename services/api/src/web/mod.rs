pub mod avatar;
pub mod download;
pub mod modify;
pub mod query;
pub mod rest;
pub mod state;
pub mod status;

// Re-export the handlers and router so the binary can assemble the server.
pub use avatar::avatar_handler;
pub use download::download_handler;
pub use modify::modify_handler;
pub use query::query_handler;
pub use rest::{api_router, ApiDoc};
pub use status::Status;
