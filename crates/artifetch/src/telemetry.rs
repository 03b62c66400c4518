use artifetch_fetch::StatisticsSnapshot;
use tracing::info;

/// Target of the statistics event, for subscribers that route telemetry apart.
pub const TELEMETRY_TARGET: &str = "artifetch::telemetry";

/// Emit the statistics of one provider call.
pub(crate) fn emit(operation: &'static str, artifacts: usize, stats: &StatisticsSnapshot) {
    info!(
        target: TELEMETRY_TARGET,
        operation,
        artifacts,
        files_via_dedup = stats.files_via_dedup,
        files_via_stream = stats.files_via_stream,
        bytes_written = stats.bytes_written,
        failed_files = stats.failed_files,
        retries = stats.retries,
        folders_created = stats.folders_created,
        "artifact download statistics"
    );
}
