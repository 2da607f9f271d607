pub mod chat;
pub mod conversations;
pub mod health;
pub mod memory;
pub mod openapi;
pub mod scenario;
