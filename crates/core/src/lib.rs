pub mod account;
pub mod money;
pub mod period;
pub mod transaction;

pub use account::{AccountId, LedgerAccount, SourceAccountId};
pub use money::{Money, ParseMoneyError};
pub use period::{parse_date, DateBounds, DateRange};
pub use transaction::{
    ExternalId, NormalizedTransaction, ParsedBatch, RawTransaction, RemoteTransaction,
    StatedBalance,
};
