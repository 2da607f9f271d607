pub mod logging;
pub mod session;

pub use session::{Session, SessionData};
