//! Conversions between proto messages and explore types
//!
//! Identifiers and tokens are validated here, before any store access.

use crate::proto;
use cupid_domain::{Cursor, InvalidUserId, Page, UserId};
use cupid_explore::{ErrorKind, ExploreError};
use tonic::Status;

/// Error type for conversion failures
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Field is not a valid user id
    #[error("Invalid {field}: {source}")]
    InvalidUserId {
        /// Offending field
        field: &'static str,
        /// Parse failure
        source: InvalidUserId,
    },

    /// Pagination token is not one this service hands out
    #[error("Invalid pagination token: {0}")]
    InvalidToken(InvalidUserId),
}

impl From<ConversionError> for Status {
    fn from(e: ConversionError) -> Self {
        Status::invalid_argument(e.to_string())
    }
}

/// Parse a required user id field
pub fn user_id_from_proto(field: &'static str, raw: &str) -> Result<UserId, ConversionError> {
    if raw.trim().is_empty() {
        return Err(ConversionError::MissingField(field));
    }
    UserId::parse(raw).map_err(|source| ConversionError::InvalidUserId { field, source })
}

/// Resolve an optional pagination token; an empty token starts a walk
pub fn cursor_from_proto(token: Option<&str>) -> Result<Cursor, ConversionError> {
    let token = token.filter(|t| !t.trim().is_empty());
    Cursor::from_token(token).map_err(ConversionError::InvalidToken)
}

/// Convert a listing page into its response message
pub fn page_to_proto(page: Page) -> proto::ListLikedYouResponse {
    proto::ListLikedYouResponse {
        likers: page
            .actors
            .iter()
            .map(|actor| proto::list_liked_you_response::Liker {
                actor_id: actor.to_string(),
            })
            .collect(),
        next_pagination_token: page.next.map(|last| last.to_string()),
    }
}

/// Map an explore error onto a gRPC status
///
/// The message carries operation context only; store error text never
/// reaches the caller.
pub fn status_from_error(error: &ExploreError) -> Status {
    let message = error.to_string();
    match error.kind() {
        ErrorKind::InvalidInput => Status::invalid_argument(message),
        ErrorKind::NotFound => Status::not_found(message),
        ErrorKind::Conflict => Status::aborted(message),
        ErrorKind::Unavailable => Status::unavailable(message),
        ErrorKind::Timeout => Status::deadline_exceeded(message),
        ErrorKind::Internal => Status::internal(message),
    }
}
