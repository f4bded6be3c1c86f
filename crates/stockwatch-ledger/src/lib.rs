pub mod entry;
pub mod ledger;

use std::path::PathBuf;

use thiserror::Error;

pub use entry::{format_timestamp, LedgerEntry};
pub use ledger::DedupLedger;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed ledger line {line:?}: {reason}")]
    Malformed { line: String, reason: String },
}
