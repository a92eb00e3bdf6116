//! Blob naming and upload progress reporting.

use std::fmt;
use std::sync::atomic::{AtomicI16, Ordering};

use chrono::{DateTime, Utc};

use super::UserId;

/// Directory every listing image is written under.
pub const LISTING_IMAGE_PREFIX: &str = "products";

/// Relative path of a stored blob.
///
/// ## Invariants
/// - Never empty, never absolute, and contains no `..` segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath(String);

impl BlobPath {
    /// Path for a freshly uploaded listing image:
    /// `products/{owner}_{unix_millis}_{file name}`.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use marketplace::domain::{BlobPath, UserId};
    ///
    /// let owner = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").unwrap();
    /// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
    /// let path = BlobPath::for_listing_image(&owner, at, "my cat.png");
    /// assert_eq!(
    ///     path.as_str(),
    ///     "products/3fa85f64-5717-4562-b3fc-2c963f66afa6_1700000000123_my_cat.png"
    /// );
    /// ```
    pub fn for_listing_image(owner: &UserId, submitted_at: DateTime<Utc>, file_name: &str) -> Self {
        Self(format!(
            "{LISTING_IMAGE_PREFIX}/{owner}_{}_{}",
            submitted_at.timestamp_millis(),
            sanitise_file_name(file_name)
        ))
    }

    /// Validate a path received from a request.
    pub fn parse(raw: &str) -> Option<Self> {
        let safe = !raw.is_empty()
            && !raw.starts_with('/')
            && !raw.contains('\\')
            && raw
                .split('/')
                .all(|segment| !segment.is_empty() && segment != "." && segment != "..");
        safe.then(|| Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitise_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_owned()
    } else {
        cleaned.to_owned()
    }
}

/// Bytes sent so far out of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub transferred: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Whole percentage in `0..=100`. An empty transfer counts as complete.
    #[must_use]
    pub fn percent(self) -> u8 {
        let scaled = (u128::from(self.transferred) * 100)
            .checked_div(u128::from(self.total))
            .unwrap_or(100);
        u8::try_from(scaled.min(100)).unwrap_or(100)
    }
}

/// Receives upload percentages as they change.
pub trait UploadObserver: Send + Sync {
    fn on_percent(&self, percent: u8);
}

/// Observer that discards every report.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreProgress;

impl UploadObserver for IgnoreProgress {
    fn on_percent(&self, _percent: u8) {}
}

/// Forwards only strictly increasing percentages to an observer.
///
/// Blob stores report raw byte counts through [`MonotonicProgress::record`];
/// the observer sees 0 first, never a smaller value than before, and 100
/// once [`MonotonicProgress::finish`] runs.
pub struct MonotonicProgress<'a> {
    observer: &'a dyn UploadObserver,
    last: AtomicI16,
}

impl<'a> MonotonicProgress<'a> {
    pub fn new(observer: &'a dyn UploadObserver) -> Self {
        Self {
            observer,
            last: AtomicI16::new(-1),
        }
    }

    /// Report the start of a transfer.
    pub fn start(&self) {
        self.report(0);
    }

    /// Report raw transfer progress.
    pub fn record(&self, progress: UploadProgress) {
        self.report(progress.percent());
    }

    /// Report completion.
    pub fn finish(&self) {
        self.report(100);
    }

    /// Highest percentage forwarded so far.
    pub fn last_percent(&self) -> Option<u8> {
        u8::try_from(self.last.load(Ordering::Acquire)).ok()
    }

    fn report(&self, percent: u8) {
        let value = i16::from(percent);
        let previous = self.last.fetch_max(value, Ordering::AcqRel);
        if value > previous {
            self.observer.on_percent(percent);
        }
    }
}

impl fmt::Debug for MonotonicProgress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonotonicProgress")
            .field("last", &self.last_percent())
            .finish_non_exhaustive()
    }
}
