pub mod refresh_token;
pub mod todo;
pub mod user;

pub use refresh_token::RefreshTokenRecord;
pub use todo::TodoRecord;
pub use user::UserRecord;

use crate::error::{AppError, Result};
use time::OffsetDateTime;

/// Timestamps are stored as Unix seconds so expiry can be compared in SQL.
pub(crate) fn from_unix(secs: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(secs).map_err(|e| {
        tracing::error!(error = %e, secs, "Stored timestamp out of range");
        AppError::Internal
    })
}
