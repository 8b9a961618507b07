pub mod actor;
pub mod host;
pub mod position;
pub mod sim;
