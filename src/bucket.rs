//! Date buckets derived from a file's modification time.
//!
//! A bucket is the directory `destination_root/<fragment>`, where the fragment
//! joins the enabled calendar components with single spaces:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use flatmove::bucket::DateParts;
//!
//! let modified = Utc.with_ymd_and_hms(2021, 3, 5, 12, 0, 0).unwrap();
//! let parts = DateParts { year: true, month: true, day: false };
//! assert_eq!(parts.fragment(modified), "2021 3");
//! ```

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which calendar components of the modification time name the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateParts {
    #[serde(default)]
    pub year: bool,
    #[serde(default)]
    pub month: bool,
    #[serde(default)]
    pub day: bool,
}

impl DateParts {
    /// Returns true when no component is enabled, i.e. the bucket is the destination root.
    pub fn is_empty(&self) -> bool {
        !(self.year || self.month || self.day)
    }

    /// Builds the bucket fragment for a timestamp.
    ///
    /// Disabled components leave no trace: no empty segment, no stray space.
    /// Returns an empty string when every component is disabled.
    pub fn fragment(&self, modified: DateTime<Utc>) -> String {
        let components = [
            (self.year, modified.year().to_string()),
            (self.month, modified.month().to_string()),
            (self.day, modified.day().to_string()),
        ];

        components
            .into_iter()
            .filter_map(|(enabled, value)| enabled.then_some(value))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns the bucket directory for a timestamp under `destination_root`.
    pub fn bucket_dir(&self, destination_root: &Path, modified: DateTime<Utc>) -> PathBuf {
        let fragment = self.fragment(modified);
        if fragment.is_empty() {
            destination_root.to_path_buf()
        } else {
            destination_root.join(fragment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parts(year: bool, month: bool, day: bool) -> DateParts {
        DateParts { year, month, day }
    }

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 9, 23, 59, 59).unwrap()
    }

    #[test]
    fn test_every_combination_contains_exactly_the_enabled_parts() {
        let cases = [
            (parts(false, false, false), ""),
            (parts(true, false, false), "2021"),
            (parts(false, true, false), "3"),
            (parts(false, false, true), "9"),
            (parts(true, true, false), "2021 3"),
            (parts(true, false, true), "2021 9"),
            (parts(false, true, true), "3 9"),
            (parts(true, true, true), "2021 3 9"),
        ];

        for (parts, expected) in cases {
            assert_eq!(parts.fragment(sample()), expected, "{:?}", parts);
        }
    }

    #[test]
    fn test_no_parts_means_destination_root() {
        let root = Path::new("/photos");
        let dir = parts(false, false, false).bucket_dir(root, sample());
        assert_eq!(dir, PathBuf::from("/photos"));
        assert!(parts(false, false, false).is_empty());
    }

    #[test]
    fn test_bucket_dir_is_single_segment() {
        let root = Path::new("/photos");
        let dir = parts(true, true, true).bucket_dir(root, sample());
        assert_eq!(dir, PathBuf::from("/photos/2021 3 9"));
        assert_eq!(dir.components().count(), root.components().count() + 1);
    }

    #[test]
    fn test_components_are_not_zero_padded() {
        let modified = Utc.with_ymd_and_hms(2009, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parts(true, true, true).fragment(modified), "2009 1 2");
    }
}
