//! One poll cycle: fetch every query, filter, dedup, score, deliver.
//!
//! Cycles are serialized. A tick or `/jobs` that arrives while a cycle is
//! running gets [`PollOutcome::AlreadyRunning`] and does nothing.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use jobwatch_core::{BotConfig, Listing, SeenStatus};
use jobwatch_llm::ListingScorer;
use jobwatch_notify::{AiSummary, Notifier, NotifyError, OutgoingListing};
use jobwatch_source::ListingSource;
use jobwatch_storage::{SeenStore, StoreError};

use crate::filter;

/// Upper bound on how long a 429 may pause the remaining deliveries.
const MAX_RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Per-cycle counters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub delivered: usize,
    pub filtered: usize,
    pub already_seen: usize,
    pub ai_rejected: usize,
    pub failed_sends: usize,
    pub failed_queries: usize,
}

impl fmt::Display for PollReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delivered {}, filtered out {}, already seen {}",
            self.delivered, self.filtered, self.already_seen
        )?;
        if self.ai_rejected > 0 {
            write!(f, ", rejected by AI {}", self.ai_rejected)?;
        }
        if self.failed_sends > 0 {
            write!(f, ", failed sends {}", self.failed_sends)?;
        }
        if self.failed_queries > 0 {
            write!(f, ", failed queries {}", self.failed_queries)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(PollReport),
    AlreadyRunning,
    NoTargetChat,
}

pub struct Poller {
    config: Arc<BotConfig>,
    source: Arc<dyn ListingSource>,
    store: SeenStore,
    notifier: Arc<dyn Notifier>,
    scorer: Option<Arc<dyn ListingScorer>>,
    running: Mutex<()>,
}

impl Poller {
    pub fn new(
        config: Arc<BotConfig>,
        source: Arc<dyn ListingSource>,
        store: SeenStore,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            notifier,
            scorer: None,
            running: Mutex::new(()),
        }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn ListingScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn store(&self) -> &SeenStore {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// `CHAT_ID` wins over the chat bound by `/start`.
    pub async fn target_chat(&self) -> Result<Option<i64>, StoreError> {
        match self.config.chat_id {
            Some(id) => Ok(Some(id)),
            None => self.store.target_chat().await,
        }
    }

    pub async fn run_cycle(&self) -> Result<PollOutcome, PollError> {
        let Ok(_guard) = self.running.try_lock() else {
            debug!("poll cycle already running, skipping");
            return Ok(PollOutcome::AlreadyRunning);
        };

        let Some(chat_id) = self.target_chat().await? else {
            warn!("no target chat yet; waiting for /start");
            return Ok(PollOutcome::NoTargetChat);
        };

        info!(chat_id, source = self.source.source_name(), "checking for new listings");

        let mut report = PollReport::default();
        let mut handled: HashSet<String> = HashSet::new();
        let mut pause: Option<Duration> = None;

        for query in &self.config.search.queries {
            let listings = match self.source.search(query, &self.config.search).await {
                Ok(listings) => listings,
                Err(e) => {
                    warn!(query = %query, error = %e, "search failed, skipping query");
                    report.failed_queries += 1;
                    continue;
                }
            };
            debug!(query = %query, count = listings.len(), "search returned listings");

            // Sources return newest-first; deliver in chronological order.
            for listing in listings.into_iter().rev() {
                if !handled.insert(listing.id.clone()) {
                    continue;
                }
                if !filter::matches(&listing, &self.config.search) {
                    report.filtered += 1;
                    continue;
                }
                if self.store.has_seen(&listing.id).await? {
                    report.already_seen += 1;
                    continue;
                }

                let Some(item) = self.evaluate(listing).await? else {
                    report.ai_rejected += 1;
                    continue;
                };

                if let Some(wait) = pause.take() {
                    tokio::time::sleep(wait).await;
                }

                match self.notifier.send(chat_id, &item).await {
                    Ok(_) => {
                        self.store.mark_seen(&item.listing, SeenStatus::Delivered).await?;
                        report.delivered += 1;
                        pause = Some(self.config.send_delay).filter(|d| !d.is_zero());
                    }
                    Err(NotifyError::RateLimited { retry_after_secs }) => {
                        warn!(listing_id = %item.listing.id, retry_after_secs, "rate limited by chat API");
                        report.failed_sends += 1;
                        pause = Some(Duration::from_secs(retry_after_secs).min(MAX_RATE_LIMIT_PAUSE));
                    }
                    Err(e) => {
                        warn!(listing_id = %item.listing.id, chat_id, error = %e, "failed to deliver listing");
                        report.failed_sends += 1;
                    }
                }
            }
        }

        if report.delivered > 0 {
            info!(%report, "poll cycle finished");
        } else {
            info!(%report, "no new listings");
        }
        Ok(PollOutcome::Completed(report))
    }

    /// Attach the AI verdict, or return `None` when the scorer rejects the
    /// listing. Rejected listings are stored as hidden so they are not
    /// scored again. A scorer failure lets the listing through unscored.
    async fn evaluate(&self, listing: Listing) -> Result<Option<OutgoingListing>, StoreError> {
        let Some(scorer) = &self.scorer else {
            return Ok(Some(OutgoingListing::plain(listing)));
        };

        match scorer.score(&listing, &self.config.search.queries).await {
            Ok(score) if scorer.accepts(&score) => Ok(Some(OutgoingListing {
                listing,
                ai: Some(AiSummary {
                    score: score.score,
                    stack: score.stack,
                    pros: score.pros,
                    cons: score.cons,
                    verdict: score.verdict,
                }),
            })),
            Ok(score) => {
                info!(listing_id = %listing.id, score = score.score, min = scorer.min_score(), "rejected by AI filter");
                self.store.mark_seen(&listing, SeenStatus::Hidden).await?;
                Ok(None)
            }
            Err(e) => {
                warn!(listing_id = %listing.id, error = %e, "AI scoring failed, sending unscored");
                Ok(Some(OutgoingListing::plain(listing)))
            }
        }
    }
}
