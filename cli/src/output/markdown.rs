//! Markdown inventory report. Renders well in GitLab/GitHub web UIs:
//! a linked summary table up top, then a collapsible section per
//! configuration group.

use super::round_ms;
use common::aggregate::{AggregatedInventory, ConfigGroup, ModelGroup};
use std::io::{self, Write};

pub fn format(writer: &mut impl Write, inventory: &AggregatedInventory) -> io::Result<()> {
    writeln!(writer, "# Hardware Inventory Report\n")?;
    writeln!(
        writer,
        "> **Generated:** {}  ",
        inventory.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        writer,
        "> **Scanned:** {} hosts &nbsp;|&nbsp; **Success:** {} &nbsp;|&nbsp; **Failed:** {}\n",
        inventory.total_hosts, inventory.successful_count, inventory.failed_count
    )?;
    writeln!(writer, "---\n")?;

    write_summary_table(writer, inventory)?;

    if !inventory.stats.total_duration.is_zero() {
        writeln!(writer, "### Scan Timing\n")?;
        writeln!(writer, "| Metric | Value |")?;
        writeln!(writer, "|--------|-------|")?;
        writeln!(
            writer,
            "| Total duration | `{:?}` |",
            round_ms(inventory.stats.total_duration)
        )?;
        writeln!(
            writer,
            "| Average per host | `{:?}` |",
            round_ms(inventory.stats.average_duration)
        )?;
        writeln!(
            writer,
            "| Fastest | `{:?}` |",
            round_ms(inventory.stats.fastest_duration)
        )?;
        writeln!(
            writer,
            "| Slowest | `{:?}` |\n",
            round_ms(inventory.stats.slowest_duration)
        )?;
    }

    writeln!(writer, "---\n")?;
    writeln!(writer, "## Hardware Configuration Groups\n")?;

    let mut group_index = 0;
    for model_group in &inventory.model_groups {
        for config_group in &model_group.config_groups {
            group_index += 1;
            write_group(writer, group_index, model_group, config_group)?;
        }
    }

    if !inventory.failed_hosts.is_empty() {
        write_failed_hosts(writer, inventory)?;
    }

    Ok(())
}

fn write_summary_table(writer: &mut impl Write, inventory: &AggregatedInventory) -> io::Result<()> {
    writeln!(writer, "## Summary\n")?;
    writeln!(
        writer,
        "| # | Count | Model | CPUs | CPU Speed | RAM | RAM Slots | Storage |"
    )?;
    writeln!(
        writer,
        "|---|-------|-------|------|-----------|-----|-----------|--------|"
    )?;

    let mut group_index = 0;
    for model_group in &inventory.model_groups {
        for config_group in &model_group.config_groups {
            group_index += 1;
            let fp = &config_group.fingerprint;

            let mut cpu_column = format!("{}×", fp.cpu_count);
            if !fp.cpu_model.is_empty() {
                cpu_column.push(' ');
                cpu_column.push_str(&shorten_cpu_model(&fp.cpu_model));
            }

            let speed_column = if fp.cpu_speed_mhz > 0 {
                format!("{:.2} GHz", fp.cpu_speed_mhz as f64 / 1000.0)
            } else {
                String::new()
            };

            let mut ram_column = format!("{} GiB", fp.ram_total_gib);
            if !fp.ram_type.is_empty() {
                ram_column.push(' ');
                ram_column.push_str(&fp.ram_type);
            }

            let slots_column = match config_group.hosts.first() {
                Some(host) if fp.ram_slots_total > 0 => {
                    format!("{}/{} used", host.memory_slots_used, fp.ram_slots_total)
                }
                _ => String::new(),
            };

            writeln!(
                writer,
                "| [{group_index}](#group-{group_index}) | **{}** | {} | {} | {} | {} | {} | {} |",
                config_group.count,
                md_escape(&model_group.display_model()),
                cpu_column,
                speed_column,
                ram_column,
                slots_column,
                md_escape(&fp.storage_summary),
            )?;
        }
    }

    if !inventory.failed_hosts.is_empty() {
        writeln!(
            writer,
            "| — | **{}** | ❌ Failed | — | — | — | — | — |",
            inventory.failed_count
        )?;
    }

    writeln!(writer)
}

fn write_group(
    writer: &mut impl Write,
    index: usize,
    model_group: &ModelGroup,
    config_group: &ConfigGroup,
) -> io::Result<()> {
    let fp = &config_group.fingerprint;

    // Anchor target for the summary table links
    writeln!(writer, "<a id=\"group-{index}\"></a>\n")?;
    writeln!(
        writer,
        "### Group {index} — {}× {}\n",
        config_group.count,
        model_group.display_model()
    )?;

    writeln!(writer, "| Property | Value |")?;
    writeln!(writer, "|----------|-------|")?;
    writeln!(
        writer,
        "| **Model** | {} |",
        md_escape(&model_group.display_model())
    )?;

    if fp.cpu_model.is_empty() {
        writeln!(writer, "| **CPUs** | {} sockets |", fp.cpu_count)?;
    } else {
        writeln!(
            writer,
            "| **CPUs** | {}× {} |",
            fp.cpu_count,
            md_escape(&fp.cpu_model)
        )?;
    }
    if fp.cpu_cores_per_socket > 0 {
        let total_cores = fp.cpu_cores_per_socket as usize * fp.cpu_count;
        writeln!(
            writer,
            "| **CPU Cores** | {} cores/CPU · {total_cores} total |",
            fp.cpu_cores_per_socket
        )?;
    }
    if fp.cpu_speed_mhz > 0 {
        writeln!(
            writer,
            "| **CPU Speed** | {} MHz ({:.2} GHz) |",
            format_with_commas(fp.cpu_speed_mhz),
            fp.cpu_speed_mhz as f64 / 1000.0
        )?;
    }

    let mut ram_line = format!("{} GiB", fp.ram_total_gib);
    if !fp.ram_type.is_empty() {
        ram_line.push(' ');
        ram_line.push_str(&fp.ram_type);
        if fp.ram_speed_mhz > 0 {
            ram_line.push_str(&format!(" @ {} MHz", format_with_commas(fp.ram_speed_mhz)));
        }
    }
    writeln!(writer, "| **RAM** | {ram_line} |")?;
    if fp.ram_slots_total > 0 {
        if let Some(host) = config_group.hosts.first() {
            writeln!(
                writer,
                "| **RAM Slots** | {} total · {} used · {} free |",
                fp.ram_slots_total, host.memory_slots_used, host.memory_slots_free
            )?;
        }
    }

    if fp.gpu_count > 0 {
        let mut gpu_line = format!("{}× {}", fp.gpu_count, md_escape(&fp.gpu_model));
        if fp.gpu_memory_gib > 0 {
            gpu_line.push_str(&format!(" ({} GB VRAM each)", fp.gpu_memory_gib));
        }
        writeln!(writer, "| **GPUs** | {gpu_line} |")?;
    }

    writeln!(writer, "| **Storage** | {} |", md_escape(&fp.storage_summary))?;
    if config_group.total_storage_tb > 0.0 {
        writeln!(
            writer,
            "| **Total Storage** | {:.2} TB |",
            config_group.total_storage_tb
        )?;
    }
    writeln!(writer)?;

    // Collapsible host list; GitLab renders <details> natively
    writeln!(writer, "<details>")?;
    writeln!(
        writer,
        "<summary>Hosts in this group ({}) — click to expand</summary>\n",
        config_group.count
    )?;
    writeln!(
        writer,
        "| # | IP Address | Hostname | Service Tag | Power | Scanned At |"
    )?;
    writeln!(
        writer,
        "|---|-----------|---------|-------------|-------|------------|"
    )?;
    for (host_index, host) in config_group.hosts.iter().enumerate() {
        let hostname = if host.hostname.is_empty() {
            host.display_name.as_deref().unwrap_or("-")
        } else {
            &host.hostname
        };
        writeln!(
            writer,
            "| {} | `{}` | {} | {} | {} | {} |",
            host_index + 1,
            host.host,
            md_escape(hostname),
            dash_if_empty(&host.service_tag),
            dash_if_empty(host.power_state.as_str()),
            host.collected_at.format("%Y-%m-%d %H:%M:%S"),
        )?;
    }
    writeln!(writer, "\n</details>\n")?;
    writeln!(writer, "---\n")?;

    Ok(())
}

fn write_failed_hosts(writer: &mut impl Write, inventory: &AggregatedInventory) -> io::Result<()> {
    writeln!(writer, "## Failed Scans\n")?;
    writeln!(writer, "| IP Address | Error |")?;
    writeln!(writer, "|-----------|-------|")?;
    for host in &inventory.failed_hosts {
        let message = host
            .error
            .as_ref()
            .map(|err| err.to_string())
            .unwrap_or_else(|| String::from("unknown error"));
        writeln!(writer, "| `{}` | {} |", host.host, md_escape(&message))?;
    }
    writeln!(writer)
}

/// Trim verbose Intel/AMD model strings to a compact version.
/// E.g. "Intel(R) Xeon(R) Gold 6140 CPU @ 2.30GHz" → "Intel Xeon Gold 6140"
fn shorten_cpu_model(model: &str) -> String {
    let mut model = model.replace("(R)", "").replace("(TM)", "");
    if let Some(index) = model.find(" CPU") {
        model.truncate(index);
    }
    while model.contains("  ") {
        model = model.replace("  ", " ");
    }
    model.trim().to_string()
}

/// Format an integer with thousands separators.
fn format_with_commas(value: u32) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result
}

/// Pipe characters would break table cells.
fn md_escape(value: &str) -> String {
    value.replace('|', "\\|")
}

fn dash_if_empty(value: &str) -> &str {
    if value.is_empty() {
        return "-";
    }
    value
}

#[cfg(test)]
mod tests {
    use super::{format, format_with_commas, md_escape, shorten_cpu_model};
    use common::error::InventoryError;
    use common::hardware::{CpuInfo, HostRecord, MemoryInfo, MemoryState};
    use common::stats::BatchStats;
    use inventory::aggregate::group_by_configuration;

    #[test]
    fn test_shorten_cpu_model() {
        assert_eq!(
            shorten_cpu_model("Intel(R) Xeon(R) Gold 6140 CPU @ 2.30GHz"),
            "Intel Xeon Gold 6140"
        );
        assert_eq!(shorten_cpu_model("AMD EPYC 7763"), "AMD EPYC 7763");
    }

    #[test]
    fn test_format_with_commas() {
        assert_eq!(format_with_commas(950), "950");
        assert_eq!(format_with_commas(2800), "2,800");
        assert_eq!(format_with_commas(1234567), "1,234,567");
    }

    #[test]
    fn test_md_escape() {
        assert_eq!(md_escape("a|b"), "a\\|b");
        assert_eq!(md_escape("plain"), "plain");
    }

    fn record(host: &str) -> HostRecord {
        let mut record = HostRecord::new(host, None);
        record.manufacturer = String::from("Dell Inc.");
        record.model = String::from("PowerEdge R440");
        record.cpu_model = String::from("Intel Xeon Silver 4216");
        record.cpu_count = 2;
        record.cpus = vec![CpuInfo {
            model: String::from("Intel Xeon Silver 4216"),
            cores: 16,
            max_speed_mhz: 2100,
            ..Default::default()
        }];
        record.memory = vec![MemoryInfo {
            capacity_mib: 32768,
            memory_type: String::from("DDR4"),
            speed_mhz: 2666,
            state: MemoryState::Enabled,
            ..Default::default()
        }];
        record.memory_total_gib = 256.0;
        record.memory_slots_total = 16;
        record.memory_slots_used = 8;
        record.memory_slots_free = 8;
        record
    }

    #[test]
    fn test_markdown_report() {
        let records = vec![
            record("10.0.0.1"),
            record("10.0.0.2"),
            HostRecord::failed("10.0.0.9", None, InventoryError::AuthFailed),
        ];
        let inventory = group_by_configuration(records, BatchStats::default());

        let mut buffer = Vec::new();
        format(&mut buffer, &inventory).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.starts_with("# Hardware Inventory Report"));
        assert!(text.contains("| [1](#group-1) | **2** | Dell Inc. PowerEdge R440 |"));
        assert!(text.contains("### Group 1 — 2× Dell Inc. PowerEdge R440"));
        assert!(text.contains("<details>"));
        assert!(text.contains("| **RAM** | 256 GiB DDR4 @ 2,666 MHz |"));
        assert!(text.contains("## Failed Scans"));
        assert!(text.contains("`10.0.0.9`"));
        assert!(text.contains("authentication failed"));
    }
}
