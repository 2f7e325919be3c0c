use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One persisted session: an opaque payload keyed by its id, plus the instant
/// after which it may be collected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub data: String,
    #[serde(with = "time::serde::timestamp")]
    pub expires_at: OffsetDateTime,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, data: impl Into<String>, expires_at: OffsetDateTime) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
            expires_at,
        }
    }

    /// A record is expired once `now` has reached its expiry.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_expiry_boundary() {
        let now = OffsetDateTime::UNIX_EPOCH + Duration::hours(1);
        let record = SessionRecord::new("abc123", "uid=42", now);

        assert!(!record.is_expired(now - Duration::seconds(1)));
        assert!(record.is_expired(now));
        assert!(record.is_expired(now + Duration::seconds(1)));
    }
}
