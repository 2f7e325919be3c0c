use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configuration for a [`SessionStore`](crate::SessionStore) and the driver
/// that calls it.
///
/// # Example
///
/// ```rust
/// use sesh::SessionConfig;
///
/// let config = SessionConfig::build()
///     .session_name("SSOSESSID")
///     .ttl_seconds(30 * 60)
///     .gc_divisor(1000);
/// assert_eq!(config.ttl_seconds, 1800);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the session; the driver uses it as the default cookie name.
    pub session_name: String,
    /// Lifetime of a record, counted from its latest write.
    pub ttl_seconds: u64,
    /// Numerator of the per-request GC chance.
    pub gc_probability: u32,
    /// Denominator of the per-request GC chance. `0` disables driver-triggered GC.
    pub gc_divisor: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_name: "PHPSESSID".to_string(),
            ttl_seconds: 3600,
            gc_probability: 1,
            gc_divisor: 100,
        }
    }
}

impl SessionConfig {
    /// Creates a new `SessionConfig` with default values.
    pub fn build() -> Self {
        Self::default()
    }

    pub fn session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = session_name.into();
        self
    }

    pub fn ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = seconds;
        self
    }

    pub fn gc_probability(mut self, gc_probability: u32) -> Self {
        self.gc_probability = gc_probability;
        self
    }

    pub fn gc_divisor(mut self, gc_divisor: u32) -> Self {
        self.gc_divisor = gc_divisor;
        self
    }

    /// Rolls the per-request GC chance of `gc_probability / gc_divisor`.
    ///
    /// The store never calls this itself; it is here for drivers deciding
    /// whether to run [`SessionStore::gc`](crate::SessionStore::gc).
    pub fn should_collect<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if self.gc_divisor == 0 || self.gc_probability == 0 {
            return false;
        }
        if self.gc_probability >= self.gc_divisor {
            return true;
        }

        rng.random_ratio(self.gc_probability, self.gc_divisor)
    }
}
