//! Cache key namespaces
//!
//! A parameterized key is one of these prefixes followed by its parameters.
//! No key starts with another key's prefix, so two different queries can never
//! read each other's entries whatever their parameters contain.

pub const HOTSPOTS: &str = "hotspots-";
pub const HOTSPOT: &str = "hotspot-single-";
pub const HOTSPOT_DETAILS: &str = "get-hotspot-data-";
pub const HOTSPOT_ACTIVITY: &str = "hotspot-activity-";
pub const HOTSPOT_BEACONS: &str = "hotspot-beacons-7days-";
pub const HOTSPOT_STATUS: &str = "hotspot-status-";
pub const HOTSPOT_REWARDS: &str = "hotspot-rewards-";
pub const HOTSPOT_REWARDS_24H: &str = "hotspot-reward-24h-";
pub const HOTSPOT_WITNESS_COUNT: &str = "hotspot-witness-count-";
pub const HOTSPOT_MAKER: &str = "hotspot-maker-";
pub const PAYER_MAKER: &str = "payer-maker-";
pub const GEOLOCATION: &str = "geolocation-data-";
pub const SEARCH_HOTSPOTS: &str = "search-hotspots-";
pub const SEARCH_VALIDATORS: &str = "search-validators-";

pub const WALLETS: &str = "wallets-";
pub const WALLET_HOTSPOTS: &str = "wallet-hotspots-";
pub const WALLET_VALIDATORS: &str = "wallet-validators-";
pub const WALLET_HOTSPOT_COUNT: &str = "wallet-hotspot-count-";
pub const WALLET_VALIDATOR_COUNT: &str = "wallet-validator-count-";
pub const WALLET_BALANCE: &str = "wallet-balance-";
pub const WALLET_BLOCK: &str = "wallet-block-";
pub const WALLET_REWARDS: &str = "wallet-rewards-";
pub const WALLET_REWARDS_24H: &str = "wallet-reward-24h-";

pub const VALIDATORS: &str = "validators-";
pub const VALIDATOR: &str = "validator-";

pub const BLOCKS: &str = "blocks-";
pub const BLOCK: &str = "block-";
pub const TRANSACTIONS: &str = "transaction-";
pub const TRANSACTION: &str = "single-tx-";
pub const TRANSACTION_REWARDS: &str = "tx-rewards-";

// Keys without parameters
pub const HOMEPAGE_STATS: &str = "homepage-stats";
pub const STATS_INVENTORY: &str = "stats-inventory";
pub const VARS_INVENTORY: &str = "vars-inventory";
pub const HOTSPOT_TREND: &str = "hotspot-30-day-trend";
pub const DC_SPENT: &str = "dc-spent";
pub const MAKERS_DATA: &str = "makers-data";
pub const ORACLE_PRICE: &str = "oracle-price";
pub const ORACLE_PRICES: &str = "oracle-prices";
pub const LAST_HOTSPOT: &str = "last-hotspot";
pub const PRICE_FEED: &str = "price-feed";

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXES: &[&str] = &[
        HOTSPOTS,
        HOTSPOT,
        HOTSPOT_DETAILS,
        HOTSPOT_ACTIVITY,
        HOTSPOT_BEACONS,
        HOTSPOT_STATUS,
        HOTSPOT_REWARDS,
        HOTSPOT_REWARDS_24H,
        HOTSPOT_WITNESS_COUNT,
        HOTSPOT_MAKER,
        PAYER_MAKER,
        GEOLOCATION,
        SEARCH_HOTSPOTS,
        SEARCH_VALIDATORS,
        WALLETS,
        WALLET_HOTSPOTS,
        WALLET_VALIDATORS,
        WALLET_HOTSPOT_COUNT,
        WALLET_VALIDATOR_COUNT,
        WALLET_BALANCE,
        WALLET_BLOCK,
        WALLET_REWARDS,
        WALLET_REWARDS_24H,
        VALIDATORS,
        VALIDATOR,
        BLOCKS,
        BLOCK,
        TRANSACTIONS,
        TRANSACTION,
        TRANSACTION_REWARDS,
    ];

    const FIXED: &[&str] = &[
        HOMEPAGE_STATS,
        STATS_INVENTORY,
        VARS_INVENTORY,
        HOTSPOT_TREND,
        DC_SPENT,
        MAKERS_DATA,
        ORACLE_PRICE,
        ORACLE_PRICES,
        LAST_HOTSPOT,
        PRICE_FEED,
    ];

    #[test]
    fn no_key_starts_with_another_prefix() {
        for prefix in PREFIXES {
            for other in PREFIXES.iter().chain(FIXED) {
                if other != prefix {
                    assert!(
                        !other.starts_with(prefix),
                        "{other:?} falls inside the {prefix:?} namespace"
                    );
                }
            }
        }
    }

    #[test]
    fn fixed_keys_are_distinct() {
        for (i, key) in FIXED.iter().enumerate() {
            assert!(!FIXED[i + 1..].contains(key), "{key:?} is used twice");
        }
    }

    #[test]
    fn dashed_hashes_stay_in_their_namespace() {
        // Transaction hashes are base64url and may end in something that
        // looks like a page and limit.
        let lookup = format!("{TRANSACTION}H-0-25");
        let reward_page = format!("{TRANSACTION_REWARDS}H-0-25");
        assert_ne!(lookup, reward_page);

        let single = format!("{HOTSPOT}status-abc");
        assert_ne!(single, format!("{HOTSPOT_STATUS}abc"));

        let payer = format!("{PAYER_MAKER}abc");
        assert!(!payer.starts_with(HOTSPOT_MAKER));
    }
}
