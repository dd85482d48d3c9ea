use anyhow::{Context, Result};
use tracing::{error, info};

use crate::checker::ReachabilityCheck;
use crate::store::PolicyStore;

/// Counts from a single reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ReconcileSummary {
    pub(crate) checked: usize,
    pub(crate) changed: usize,
    pub(crate) written: usize,
    pub(crate) failed_writes: usize,
}

/// Re-checks every stored URL and records the ones whose reachability flipped.
pub(crate) struct Reconciler<S, C> {
    store: S,
    checker: C,
}

impl<S, C> Reconciler<S, C>
where
    S: PolicyStore,
    C: ReachabilityCheck,
{
    pub(crate) fn new(store: S, checker: C) -> Self {
        Self { store, checker }
    }

    #[cfg(test)]
    pub(crate) fn checker(&self) -> &C {
        &self.checker
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Walks the stored URLs in order, one check at a time. Nothing read from the store is
    /// modified locally; changes are only proposed back through `insert_policy`.
    ///
    /// A failed write is logged and counted and the pass moves on to the next URL.
    /// Only failing to load the URLs aborts the pass.
    #[tracing::instrument(level = "info", skip(self))]
    pub(crate) async fn reconcile(&self, persist_updates: bool) -> Result<ReconcileSummary> {
        let policies = self
            .store
            .policy_urls_and_active()
            .await
            .context("Failed to load policy URLs from the database")?;
        info!("Checking {} policy URLs", policies.len());

        let mut summary = ReconcileSummary::default();
        for policy in &policies {
            let is_active = self.checker.check(&policy.url).await;
            summary.checked += 1;

            // A flag that was never recorded always gets written
            if policy.previously_active == Some(is_active) {
                continue;
            }
            summary.changed += 1;

            if persist_updates {
                match self.store.insert_policy(&policy.url, is_active).await {
                    Ok(()) => summary.written += 1,
                    Err(err) => {
                        summary.failed_writes += 1;
                        error!(
                            "Failed to record url={} as active={}: {:#}",
                            policy.url, is_active, err
                        );
                    }
                }
            }
            info!(
                "Updated url={} | previous={} | current={}",
                policy.url,
                policy
                    .previously_active
                    .map_or("unknown".to_string(), |active| active.to_string()),
                is_active
            );
        }

        info!(
            checked = summary.checked,
            changed = summary.changed,
            written = summary.written,
            failed_writes = summary.failed_writes,
            "Reconciliation finished"
        );
        Ok(summary)
    }
}
