pub mod ofx;

pub use ofx::{
    BalanceSource, OfxAccount, OfxBalance, OfxDocument, OfxError, OfxStatement, OfxTransaction,
};

use ledgersync_core::ParsedBatch;
use std::path::Path;

/// Reads and parses an OFX/QFX export into the batch the reconciliation
/// core consumes.
pub fn load_batch(path: &Path, balance_source: BalanceSource) -> Result<ParsedBatch, OfxError> {
    let data = std::fs::read(path)?;
    let document = ofx::parse(&data)?;
    Ok(document.into_batch(balance_source))
}
