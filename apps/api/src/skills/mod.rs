pub mod handlers;
pub mod queries;
