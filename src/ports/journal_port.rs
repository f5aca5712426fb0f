//! Trade journal port trait.

use crate::domain::error::CrosstraderError;
use crate::domain::position::Trade;

/// Append-only sink for closed trades, written once per close in the order
/// trades close.
pub trait TradeJournal {
    fn append(&mut self, trade: &Trade) -> Result<(), CrosstraderError>;
}

/// In-memory journal.
impl TradeJournal for Vec<Trade> {
    fn append(&mut self, trade: &Trade) -> Result<(), CrosstraderError> {
        self.push(trade.clone());
        Ok(())
    }
}
