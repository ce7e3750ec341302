//! Privacy guarantees for everything sent to the conversion service.
//!
//! Two concerns live here:
//! - Options that are always attached to a submission and cannot be
//!   overridden by defaults or by the caller (no training use, no indefinite
//!   retention of uploaded documents).
//! - Credential handling: secrets are only ever logged or snapshotted as a
//!   fixed-length suffix.
//!
//! The enforced settings are written into the `metadata` object of the
//! submission options after every other layer has been merged:
//! ```json
//! {
//!   "metadata": {
//!     "allow_training": false,
//!     "retain_indefinitely": false
//!   }
//! }
//! ```

mod config;
mod credentials;

pub use config::{EnforcedPrivacy, METADATA_KEY};
pub use credentials::{redact_secret, Credentials, REDACTED_SUFFIX_LEN};
