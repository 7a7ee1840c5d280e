pub mod error;
pub mod models;
pub mod poll;
pub mod validation;

pub use error::ErrorResponse;
pub use models::*;
pub use poll::{Poll, PollOption, VoteError};
pub use validation::*;

#[cfg(test)]
mod tests;
