use serde::{Deserialize, Serialize};

use crate::models::{TradeKind, Transaction};

/// Append-only record of executed trades, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only `Position` appends.
    pub(crate) fn record(&mut self, tx: Transaction) -> &Transaction {
        self.transactions.push(tx);
        &self.transactions[self.transactions.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn last(&self) -> Option<&Transaction> {
        self.transactions.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn of_kind(&self, kind: TradeKind) -> impl Iterator<Item = &Transaction> + '_ {
        self.transactions.iter().filter(move |t| t.kind() == kind)
    }

    pub fn buys(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.of_kind(TradeKind::Buy)
    }

    pub fn sells(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.of_kind(TradeKind::Sell)
    }
}

impl std::ops::Index<usize> for Ledger {
    type Output = Transaction;
    fn index(&self, index: usize) -> &Self::Output {
        &self.transactions[index]
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;
    fn into_iter(self) -> Self::IntoIter {
        self.transactions.iter()
    }
}
