use serde::Serialize;
use tracing::debug;

use super::{ChainService, HotspotService, ValidatorService, WalletService};
use crate::models::{BlockData, HotspotDetails, HotspotSearch, Transaction, Validator, Wallet};

/// Shortest query that is looked up at all
pub const MIN_QUERY_LEN: usize = 4;

/// Whichever entity a search query resolved to; always a JSON array.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchResult {
    Blocks(Vec<BlockData>),
    HotspotNames(Vec<HotspotSearch>),
    Hotspot(Vec<HotspotDetails>),
    Wallet(Vec<Wallet>),
    Validators(Vec<Validator>),
    Transactions(Vec<Transaction>),
    Nothing(Vec<serde_json::Value>),
}

impl SearchResult {
    pub fn nothing() -> Self {
        Self::Nothing(Vec::new())
    }
}

#[derive(Clone)]
pub struct SearchService {
    hotspots: HotspotService,
    wallets: WalletService,
    validators: ValidatorService,
    chain: ChainService,
}

impl SearchService {
    pub fn new(
        hotspots: HotspotService,
        wallets: WalletService,
        validators: ValidatorService,
        chain: ChainService,
    ) -> Self {
        Self {
            hotspots,
            wallets,
            validators,
            chain,
        }
    }

    /// A numeric query is a block height. Anything else is tried as a hotspot
    /// name, hotspot address, wallet, validator name, validator address and
    /// transaction hash, in that order; the first match wins.
    pub async fn search(&self, query: &str) -> SearchResult {
        if query.len() < MIN_QUERY_LEN {
            return SearchResult::nothing();
        }

        if let Ok(height) = query.parse::<i64>() {
            return SearchResult::Blocks(self.chain.block(height).await);
        }

        let names = self.hotspots.search_by_name(query).await;
        if !names.is_empty() {
            return SearchResult::HotspotNames(names);
        }

        if let Some(details) = self.hotspots.details(query).await {
            if !details.address.is_empty() {
                return SearchResult::Hotspot(vec![details]);
            }
        }

        let balance = self.wallets.balance(query).await;
        if balance.is_known() {
            return SearchResult::Wallet(vec![self.wallets.single(query).await]);
        }

        let validators = self.validators.search_by_name(query).await;
        if validators.first().is_some_and(|v| !v.name.is_empty()) {
            return SearchResult::Validators(validators);
        }

        let validator = Validator::from(self.validators.single(query).await);
        if !validator.name.is_empty() {
            return SearchResult::Validators(vec![validator]);
        }

        let transactions = self.chain.transaction(query).await;
        if transactions.first().is_some_and(|tx| !tx.hash.is_empty()) {
            return SearchResult::Transactions(transactions);
        }

        debug!(query, "search found nothing");
        SearchResult::nothing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_serializes_as_empty_array() {
        assert_eq!(serde_json::to_string(&SearchResult::nothing()).unwrap(), "[]");
    }
}
