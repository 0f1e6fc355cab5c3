//! Compact one-row-per-host table.

use super::round_ms;
use common::hardware::HostRecord;
use common::stats::BatchStats;
use std::io::{self, Write};

pub fn format(
    writer: &mut impl Write,
    records: &[HostRecord],
    stats: &BatchStats,
) -> io::Result<()> {
    let header = [
        "HOST",
        "MODEL",
        "SERVICE TAG",
        "CPUS",
        "RAM (GB)",
        "RAM SLOTS",
        "DRIVES",
        "STATUS",
    ];

    let mut rows: Vec<[String; 8]> = Vec::with_capacity(records.len());
    for record in records {
        let status = if record.is_valid() { "OK" } else { "ERROR" };
        rows.push([
            record.host.clone(),
            record.model.clone(),
            record.service_tag.clone(),
            record.cpu_count.to_string(),
            format!("{:.0}", record.memory_total_gib),
            format!("{}/{}", record.memory_slots_used, record.memory_slots_total),
            record.drive_count.to_string(),
            status.to_string(),
        ]);
    }

    // Column widths sized to content, tabwriter-style
    let mut widths: Vec<usize> = header.iter().map(|cell| cell.len()).collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    write_row(writer, &header.map(String::from), &widths)?;
    let separators: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    write_row(writer, &separators, &widths)?;
    for row in &rows {
        write_row(writer, row, &widths)?;
    }

    writeln!(
        writer,
        "\nTotal: {} hosts ({} successful, {} failed) in {:?}",
        stats.total_hosts,
        stats.successful_count,
        stats.failed_count,
        round_ms(stats.total_duration)
    )?;

    Ok(())
}

fn write_row(writer: &mut impl Write, row: &[String], widths: &[usize]) -> io::Result<()> {
    let mut line = String::new();
    for (index, cell) in row.iter().enumerate() {
        if index > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        if index < row.len() - 1 {
            for _ in cell.chars().count()..widths[index] {
                line.push(' ');
            }
        }
    }
    writeln!(writer, "{}", line.trim_end())
}
