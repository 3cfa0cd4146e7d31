//! External processes with drained, merged output.

mod error;
mod pump;

pub use error::LaunchError;
pub use pump::{launch, try_launch, ProcessPump, PumpedProcess};
