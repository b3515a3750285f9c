//! PatternReportRepository trait definition.

use sora_types::chat::PatternReport;
use sora_types::error::RepositoryError;
use uuid::Uuid;

/// Repository trait for persisted pattern-mining output.
pub trait PatternReportRepository: Send + Sync {
    /// Save a new report.
    fn save_report(
        &self,
        report: &PatternReport,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// All reports for a user, oldest first.
    fn list_reports(
        &self,
        user_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<PatternReport>, RepositoryError>> + Send;
}
