use uuid::Uuid;

use crate::error::ApiError;

pub fn parse_poll_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::InvalidId)
}
