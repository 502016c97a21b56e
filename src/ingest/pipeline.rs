//! One full retrieve run: scrape both games, ingest, relay the report

use std::sync::Arc;

use crate::crawler::Scraper;
use crate::error::{Error, Result};
use crate::ingest::IngestionCoordinator;
use crate::models::{DrawRecord, Game, IngestStats, RunReport, RunSummary};
use crate::notifications::Notifier;

/// Scrape, ingest and notify
pub struct RetrievalPipeline {
    scraper: Arc<Scraper>,
    coordinator: IngestionCoordinator,
    notifier: Notifier,
}

impl RetrievalPipeline {
    pub fn new(
        scraper: Arc<Scraper>,
        coordinator: IngestionCoordinator,
        notifier: Notifier,
    ) -> Self {
        Self {
            scraper,
            coordinator,
            notifier,
        }
    }

    pub fn scraper(&self) -> &Arc<Scraper> {
        &self.scraper
    }

    /// Run once
    ///
    /// Both games render concurrently and each finishes even if the other
    /// fails. A render failure fails the run before anything is written.
    /// Otherwise PICK3 records are ingested, then PICK4, and the report is
    /// relayed; relay failures never change the result.
    pub async fn run(&self) -> Result<RunReport> {
        let (pick3, pick4) = tokio::join!(
            self.scraper.scrape(Game::Pick3),
            self.scraper.scrape(Game::Pick4)
        );

        let (pick3, pick4) = match (pick3, pick4) {
            (Ok(pick3), Ok(pick4)) => (pick3, pick4),
            (Err(e), other) => {
                if let Err(second) = other {
                    tracing::error!(game = %Game::Pick4, error = %second, "Render failed as well");
                }
                return Err(Error::render(Game::Pick3, e));
            }
            (Ok(_), Err(e)) => return Err(Error::render(Game::Pick4, e)),
        };

        let pick3_stats = self.coordinator.ingest(&pick3).await;
        let pick4_stats = self.coordinator.ingest(&pick4).await;

        let report = build_report(pick3, pick4, pick3_stats, pick4_stats);
        tracing::info!(
            pick3 = report.summary.pick3,
            pick4 = report.summary.pick4,
            stored = report.summary.stored,
            skipped = report.summary.skipped,
            failed = pick3_stats.failed + pick4_stats.failed,
            "Retrieve run complete"
        );

        self.notifier.notify(&report).await;
        Ok(report)
    }
}

fn build_report(
    pick3: Vec<DrawRecord>,
    pick4: Vec<DrawRecord>,
    pick3_stats: IngestStats,
    pick4_stats: IngestStats,
) -> RunReport {
    let summary = RunSummary {
        pick3: pick3.len(),
        pick4: pick4.len(),
        total: pick3.len() + pick4.len(),
        stored: pick3_stats.stored + pick4_stats.stored,
        skipped: pick3_stats.skipped + pick4_stats.skipped,
    };

    let mut results = pick3;
    results.extend(pick4);

    RunReport {
        ok: true,
        summary,
        results,
    }
}
