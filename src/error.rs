use alloc::collections::TryReserveError;
use core::fmt;

/// Shorthand for results carrying a table [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The ways a table operation can fail.
///
/// A missing key is never an error: lookups and removals report absence with
/// `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Storage for the bucket array or a new entry could not be obtained.
    /// The table is left exactly as it was before the call.
    AllocationFailed(TryReserveError),
    /// A table was requested with zero buckets.
    ZeroCapacity,
    /// The hash strategy returned an index that does not name a bucket.
    BucketOutOfRange {
        /// Index produced by the strategy.
        index: usize,
        /// Number of buckets in the table.
        capacity: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AllocationFailed(_) => f.write_str("failed to allocate table storage"),
            Error::ZeroCapacity => f.write_str("hash table capacity must be at least one bucket"),
            Error::BucketOutOfRange { index, capacity } => write!(
                f,
                "hash strategy returned bucket {index}, but the table only has {capacity} buckets"
            ),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::AllocationFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::AllocationFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::error::Error as _;

    use super::*;

    fn reserve_error() -> TryReserveError {
        Vec::<u64>::new().try_reserve(usize::MAX).unwrap_err()
    }

    #[test]
    fn display_names_the_failure() {
        assert_eq!(
            Error::ZeroCapacity.to_string(),
            "hash table capacity must be at least one bucket"
        );
        assert_eq!(
            Error::BucketOutOfRange {
                index: 7,
                capacity: 5
            }
            .to_string(),
            "hash strategy returned bucket 7, but the table only has 5 buckets"
        );
        assert_eq!(
            Error::from(reserve_error()).to_string(),
            "failed to allocate table storage"
        );
    }

    #[test]
    fn allocation_failure_exposes_source() {
        let err = Error::from(reserve_error());
        assert!(matches!(err, Error::AllocationFailed(_)));
        assert!(err.source().is_some());
        assert!(Error::ZeroCapacity.source().is_none());
    }
}
