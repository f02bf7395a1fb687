use tracing::{error, info, info_span, warn, Instrument};

use crate::db::history_repo::{self, OperationKind, OperationStatus};
use crate::db::link_repo::{self, LinkRow, VisitRecord};
use crate::error::Result;
use crate::visitor::{validate_link, ClickOutcome};

use super::progress::{Progress, ProgressReporter, Stage};
use super::report::{UnsubscribeDetail, UnsubscribeReport};
use super::{LinkSelection, Orchestrator};

impl Orchestrator {
    /// Visits the selected links that were never clicked, one at a time,
    /// pausing the configured delay between two visits.
    pub async fn unsubscribe(
        &self,
        selection: LinkSelection,
        progress: &dyn ProgressReporter,
    ) -> Result<UnsubscribeReport> {
        let ids = match &selection {
            LinkSelection::Ids(ids) => Some(ids.as_slice()),
            LinkSelection::AllUnclicked => None,
        };
        let links = link_repo::list_unclicked(&self.db, ids)?;

        let span = info_span!("unsubscribe", links = links.len());
        self.run_unsubscribe(links, progress).instrument(span).await
    }

    async fn run_unsubscribe(
        &self,
        links: Vec<LinkRow>,
        progress: &dyn ProgressReporter,
    ) -> Result<UnsubscribeReport> {
        let total = links.len();
        let mut report = UnsubscribeReport::default();
        info!("Visiting {} unsubscribe links", total);

        for (index, link) in links.into_iter().enumerate() {
            if index > 0 && !self.config.link_click_delay.is_zero() {
                tokio::time::sleep(self.config.link_click_delay).await;
            }

            let outcome = if validate_link(&link.url) {
                self.visitor.click(&link.url).await
            } else {
                warn!("Link {} has an invalid format: {}", link.id, link.url);
                ClickOutcome::invalid()
            };

            let (success, error_message) = match self.record_outcome(&link, &outcome) {
                Ok(()) => (outcome.success, outcome.error_message),
                Err(e) => {
                    error!("Failed to record visit of link {}: {}", link.id, e);
                    self.log_operation(
                        OperationKind::Unsubscribe,
                        Some(link.email_id),
                        OperationStatus::Error,
                        &format!("Failed to record visit of {}: {}", link.url, e),
                    );
                    (false, Some(e.to_string()))
                }
            };

            report.total_attempted += 1;
            if success {
                report.successful += 1;
            } else {
                report.failed += 1;
            }

            progress.report(Progress {
                stage: Stage::Unsubscribe,
                current: index + 1,
                total,
                message: format!(
                    "{} {}",
                    if success { "unsubscribed" } else { "failed" },
                    link.url
                ),
            });

            report.details.push(UnsubscribeDetail {
                link_id: link.id,
                url: link.url,
                success,
                status_code: outcome.status_code,
                error_message,
            });
        }

        info!(
            attempted = report.total_attempted,
            successful = report.successful,
            failed = report.failed,
            "Unsubscribe run finished"
        );
        Ok(report)
    }

    fn record_outcome(&self, link: &LinkRow, outcome: &ClickOutcome) -> Result<()> {
        link_repo::record_visit(
            &self.db,
            link.id,
            &VisitRecord {
                status_code: outcome.status_code,
                error_message: outcome.error_message.clone(),
                response_time: (outcome.attempts > 0).then_some(outcome.response_time),
            },
        )?;

        let (status, details) = if outcome.success {
            let code = outcome
                .status_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            (
                OperationStatus::Success,
                format!("Unsubscribed via {} (HTTP {})", link.url, code),
            )
        } else {
            let reason = outcome.error_message.as_deref().unwrap_or("unknown error");
            error!("Unsubscribe failed for {}: {}", link.url, reason);
            (
                OperationStatus::Failed,
                format!("Failed to unsubscribe via {}: {}", link.url, reason),
            )
        };

        history_repo::log(
            &self.db,
            OperationKind::Unsubscribe,
            Some(link.email_id),
            status,
            &details,
        )?;
        Ok(())
    }
}
