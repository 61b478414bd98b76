pub mod fanout;
pub mod handlers;
