mod error;
mod timestamp;

pub use error::{err, Error, Result};
pub use timestamp::Timestamp;
