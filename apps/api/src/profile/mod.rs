pub mod handlers;
pub mod sanitize;
