#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

cfg_if::cfg_if! {
    if #[cfg(feature = "tracing")] {
        macro_rules! debug_event {
            ($($arg:tt)*) => { tracing::debug!($($arg)*) };
        }

        macro_rules! warn_event {
            ($($arg:tt)*) => { tracing::warn!($($arg)*) };
        }
    } else {
        macro_rules! debug_event {
            ($($arg:tt)*) => {};
        }

        macro_rules! warn_event {
            ($($arg:tt)*) => {};
        }
    }
}

/// Errors reported by fallible table operations.
pub mod error;

pub mod hash_table;

/// Hash strategies mapping a key's identity to a bucket index.
///
/// The table never hashes keys itself; every keyed operation asks the
/// strategy supplied at construction which bucket to look in.
pub mod strategy;

pub use error::Error;
pub use error::Result;
pub use hash_table::HashTable;
pub use strategy::AddressModulo;
pub use strategy::BuildHasherStrategy;
#[cfg(feature = "foldhash")]
pub use strategy::FoldHashStrategy;
pub use strategy::HashStrategy;
