use chrono::{Local, NaiveDate};
use shared::{Report, ReportPeriod};
use tracing::info;

use crate::db::Database;
use crate::error::AppError;

/// Period-filtered reporting over the stored transactions.
#[derive(Clone)]
pub struct ReportService {
    db: Database,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Build a report for the requested period, defaulting to the 30-day
    /// month window; unrecognized periods fall back to all-time.
    pub async fn report(&self, period: Option<&str>) -> Result<Report, AppError> {
        let period = period.map(ReportPeriod::parse).unwrap_or(ReportPeriod::Month);
        self.report_as_of(period, Local::now().date_naive()).await
    }

    /// `today` is injected so the window arithmetic is testable.
    pub async fn report_as_of(
        &self,
        period: ReportPeriod,
        today: NaiveDate,
    ) -> Result<Report, AppError> {
        let transactions = self.db.list_transactions().await?;
        let report = Report::build(&transactions, period, today);
        info!(
            "Built {:?} report: {} transactions between {} and {}",
            period, report.transaction_count, report.start_date, report.end_date
        );
        Ok(report)
    }
}
