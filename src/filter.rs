//! Truncating change detection.
//!
//! Readings are compared by their Celsius value truncated toward zero. A
//! reading is published only when that whole-degree value differs from the
//! last one that was successfully published, or when nothing has been
//! published yet. Drift within a degree (20.9 to 20.1) is suppressed.

use thermowatch_types::Reading;

/// Decides whether a reading is worth publishing.
///
/// The filter never assumes a publish succeeded. Callers check
/// [`should_publish`](Self::should_publish), attempt the publish, and call
/// [`record_published`](Self::record_published) only once it is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeFilter {
    last_published: Option<i64>,
}

impl ChangeFilter {
    /// Create a filter with no published history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `reading` differs from the last published whole-degree value.
    pub fn should_publish(&self, reading: &Reading) -> bool {
        self.last_published != Some(reading.whole_degrees())
    }

    /// Record that `reading` was published successfully.
    pub fn record_published(&mut self, reading: &Reading) {
        self.last_published = Some(reading.whole_degrees());
    }

    /// The last successfully published whole-degree value.
    pub fn last_published(&self) -> Option<i64> {
        self.last_published
    }
}
