//! Path filter.
//!
//! Drops any record whose `url` field contains `-` anywhere. This catches
//! the `"-"` placeholder written when no referrer was sent, and also any
//! real URL with a hyphen in it. The check looks at `url`, not at the
//! request path that becomes the aggregation key.

/// Whether a record with this `url` field should be counted.
pub fn admits(url: &str) -> bool {
    !url.contains('-')
}
