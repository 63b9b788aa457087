pub mod dispatcher;
pub mod messages;
pub mod models;
