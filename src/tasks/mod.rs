//! Recurring background jobs.
//!
//! Call `spawn_all` once during startup. Tasks are detached with
//! `tokio::spawn` and never block the caller.

use crate::services::{CashLendingService, MembershipService};
use std::time::Duration;

const EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Spawn all background tasks.
///
/// The expiry sweep only tidies stored statuses. Eligibility and
/// subscription checks compare expiry dates themselves, so a missed
/// sweep never grants access.
pub fn spawn_all(membership_service: MembershipService, cash_lending_service: CashLendingService) {
    tokio::spawn(async move {
        loop {
            log::debug!("Running expiry sweep");
            match membership_service.expire_stale_cards().await {
                Ok(n) if n > 0 => log::info!("Expired membership cards: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to expire membership cards: {e:?}"),
            }
            match cash_lending_service.expire_stale_subscriptions().await {
                Ok(n) if n > 0 => log::info!("Expired cash-lending subscriptions: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to expire cash-lending subscriptions: {e:?}"),
            }
            tokio::time::sleep(EXPIRY_SWEEP_INTERVAL).await;
        }
    });
}
