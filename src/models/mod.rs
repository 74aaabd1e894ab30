pub mod health;
pub mod messages;
pub mod session;
pub mod stats;

pub use health::*;
pub use messages::*;
pub use session::*;
pub use stats::*;
