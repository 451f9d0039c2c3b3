//! # certchain-cli: CLI Tool for CertChain
//!
//! Provides the `certchain` command-line interface over the same snapshot
//! file the HTTP service uses.
//!
//! ## Subcommands
//!
//! - `certchain submit`: Validate, hash, and store a record.
//! - `certchain resolve`: Print the record behind a hash.
//! - `certchain verify`: Re-hash one stored record.
//! - `certchain audit`: Re-hash every stored record.
//! - `certchain list`: Hashes in insertion order.
//! - `certchain hash`: Compute a hash without touching any store.
//!
//! ```bash
//! certchain --db data/database.json submit --name "Alice Tan" \
//!     --course "Data Structures" --institute "Tech U" \
//!     --pdf-ref pdf-1.pdf --photo-ref photo-1.png
//! certchain resolve 3f5a...
//! ```
//!
//! Every `run_*` function returns the process exit code: 0 on success,
//! 1 when the answer is negative (not found, mismatch). Hard failures are
//! returned as errors.

pub mod hash;
pub mod records;
