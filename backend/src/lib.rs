pub mod auth;
pub mod catchers;
pub mod cors;
pub mod error;
pub mod queries;
pub mod routes;
pub mod store;
pub mod utils;

pub use shared::{models::*, ErrorResponse};
pub use shared::poll::{Poll, PollOption, VoteError};
