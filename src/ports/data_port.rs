//! Bar source port trait.

use crate::domain::error::CrosstraderError;
use crate::domain::normalize::CanonicalTable;

/// A source of canonical bars. Implementations own the raw input format and
/// perform all ingestion fallbacks before returning.
pub trait DataPort {
    fn fetch_bars(&self) -> Result<CanonicalTable, CrosstraderError>;

    /// Human-readable name of the source, used in logs and error messages.
    fn describe(&self) -> String;
}
