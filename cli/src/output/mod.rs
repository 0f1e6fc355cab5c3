//! Output renderers for scan results. Everything here is presentation
//! only; all numbers come from the core.

mod aggregated;
mod console;
mod csv;
mod json;
mod markdown;
mod table;

use common::hardware::HostRecord;
use common::stats::BatchStats;
use inventory::aggregate::group_by_configuration;
use log::warn;
use std::io;
use std::time::Duration;

/// Render records to stdout in the requested format.
pub fn render(
    format: &str,
    records: &[HostRecord],
    stats: &BatchStats,
    verbose: bool,
    no_color: bool,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();

    match format {
        "console" => console::format(&mut writer, records, stats, verbose, no_color),
        "table" => table::format(&mut writer, records, stats),
        "json" => json::format(&mut writer, records, stats),
        "csv" => csv::format(&mut writer, records, stats),
        "markdown" => {
            let inventory = group_by_configuration(records.to_vec(), stats.clone());
            markdown::format(&mut writer, &inventory)
        }
        "aggregated" => {
            let inventory = group_by_configuration(records.to_vec(), stats.clone());
            aggregated::format(&mut writer, &inventory, no_color)
        }
        other => {
            warn!("[output] Unknown format {other:?}, using aggregated");
            let inventory = group_by_configuration(records.to_vec(), stats.clone());
            aggregated::format(&mut writer, &inventory, no_color)
        }
    }
}

/// Truncate a duration to whole milliseconds for display.
fn round_ms(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
