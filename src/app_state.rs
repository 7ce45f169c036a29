//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::services::{
    ChainService, HotspotService, LedgerContext, PriceFeed, SearchService, StatsService,
    ValidatorService, WalletService,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub hotspots: Arc<HotspotService>,
    pub wallets: Arc<WalletService>,
    pub validators: Arc<ValidatorService>,
    pub chain: Arc<ChainService>,
    pub stats: Arc<StatsService>,
    pub search: Arc<SearchService>,
}

impl AppState {
    /// Wire every service over one database pool and cache.
    pub fn new(ctx: LedgerContext, price_feed: PriceFeed) -> Self {
        let hotspots = HotspotService::new(ctx.clone());
        let validators = ValidatorService::new(ctx.clone());
        let chain = ChainService::new(ctx.clone());
        let wallets = WalletService::new(ctx.clone(), hotspots.clone(), validators.clone());
        let stats = StatsService::new(ctx, validators.clone(), price_feed);
        let search = SearchService::new(
            hotspots.clone(),
            wallets.clone(),
            validators.clone(),
            chain.clone(),
        );

        Self {
            hotspots: Arc::new(hotspots),
            wallets: Arc::new(wallets),
            validators: Arc::new(validators),
            chain: Arc::new(chain),
            stats: Arc::new(stats),
            search: Arc::new(search),
        }
    }
}

impl FromRef<AppState> for Arc<HotspotService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hotspots.clone()
    }
}

impl FromRef<AppState> for Arc<WalletService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.wallets.clone()
    }
}

impl FromRef<AppState> for Arc<ValidatorService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.validators.clone()
    }
}

impl FromRef<AppState> for Arc<ChainService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chain.clone()
    }
}

impl FromRef<AppState> for Arc<StatsService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.stats.clone()
    }
}

impl FromRef<AppState> for Arc<SearchService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.search.clone()
    }
}
