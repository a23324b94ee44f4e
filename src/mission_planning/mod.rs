// Mission planning: lane and speed decisions

pub mod behavior;
pub mod session;

pub use behavior::*;
pub use session::*;
