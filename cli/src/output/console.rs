//! Human-readable per-host console output.

use super::round_ms;
use common::hardware::{Health, HostRecord, MediaType, PowerState};
use common::stats::BatchStats;
use std::io::{self, Write};

pub fn format(
    writer: &mut impl Write,
    records: &[HostRecord],
    stats: &BatchStats,
    verbose: bool,
    no_color: bool,
) -> io::Result<()> {
    for record in records {
        format_host(writer, record, verbose, no_color)?;
    }
    format_summary(writer, stats, no_color)
}

fn icon(emoji: &str, no_color: bool) -> &str {
    if no_color {
        return "";
    }
    emoji
}

fn value_or_na(value: &str) -> &str {
    if value.is_empty() {
        return "N/A";
    }
    value
}

fn power_state_icon(state: &PowerState, no_color: bool) -> String {
    if no_color {
        return state.as_str().to_string();
    }
    let symbol = match state {
        PowerState::On => "🟢",
        PowerState::Off => "🔴",
        _ => "🟡",
    };
    format!("{symbol} {state}")
}

fn health_icon(health: &Health, no_color: bool) -> String {
    if no_color {
        return health.as_str().to_string();
    }
    match health {
        Health::Ok => format!("✓ {health}"),
        Health::Warning => format!("⚠ {health}"),
        Health::Critical => format!("✗ {health}"),
        _ => health.as_str().to_string(),
    }
}

fn format_host(
    writer: &mut impl Write,
    record: &HostRecord,
    verbose: bool,
    no_color: bool,
) -> io::Result<()> {
    if let Some(err) = &record.error {
        writeln!(
            writer,
            "\n{} {} - Error: {err}",
            icon("❌", no_color),
            record.host
        )?;
        return Ok(());
    }

    let line = "═".repeat(72);
    writeln!(writer, "\n{line}")?;
    writeln!(
        writer,
        "{}  {} ({})",
        icon("🖥️", no_color),
        record.host,
        record.model
    )?;
    writeln!(writer, "{line}")?;

    writeln!(writer, "\n{} System Information:", icon("📋", no_color))?;
    writeln!(
        writer,
        "   {:<14} {} {}",
        "Model:", record.manufacturer, record.model
    )?;
    writeln!(
        writer,
        "   {:<14} {}",
        "Service Tag:",
        value_or_na(&record.service_tag)
    )?;
    writeln!(
        writer,
        "   {:<14} {}",
        "Serial:",
        value_or_na(&record.serial_number)
    )?;
    writeln!(
        writer,
        "   {:<14} {}",
        "BIOS:",
        value_or_na(&record.bios_version)
    )?;
    writeln!(
        writer,
        "   {:<14} {}",
        "Hostname:",
        value_or_na(&record.hostname)
    )?;
    writeln!(
        writer,
        "   {:<14} {}",
        "Power State:",
        power_state_icon(&record.power_state, no_color)
    )?;

    writeln!(
        writer,
        "\n{} CPUs: {} installed",
        icon("🔲", no_color),
        record.cpu_count
    )?;
    if verbose {
        for cpu in &record.cpus {
            writeln!(writer, "   └─ {}", cpu.socket)?;
            writeln!(writer, "      {}", cpu.model)?;
            writeln!(
                writer,
                "      {} Cores / {} Threads @ {} MHz",
                cpu.cores, cpu.threads, cpu.max_speed_mhz
            )?;
            writeln!(writer, "      Health: {}", health_icon(&cpu.health, no_color))?;
        }
    } else if let Some(cpu) = record.cpus.first() {
        writeln!(
            writer,
            "   └─ {} ({} Cores / {} Threads)",
            cpu.model, cpu.cores, cpu.threads
        )?;
    }

    writeln!(
        writer,
        "\n{} Memory: {:.0} GiB total",
        icon("💾", no_color),
        record.memory_total_gib
    )?;
    writeln!(
        writer,
        "   └─ Slots: {}/{} used ({} free)",
        record.memory_slots_used, record.memory_slots_total, record.memory_slots_free
    )?;
    if verbose {
        for module in &record.memory {
            if module.is_populated() {
                writeln!(
                    writer,
                    "   └─ {}: {:.0} GiB {} @ {} MHz",
                    module.slot,
                    module.capacity_gib(),
                    module.memory_type,
                    module.speed_mhz
                )?;
                writeln!(
                    writer,
                    "      {} {} (S/N: {})",
                    module.manufacturer, module.part_number, module.serial_number
                )?;
            } else {
                writeln!(writer, "   └─ {}: [empty]", module.slot)?;
            }
        }
    }

    if record.gpu_count > 0 {
        writeln!(
            writer,
            "\n{} GPUs: {} installed",
            icon("🎛️", no_color),
            record.gpu_count
        )?;
        for gpu in &record.gpus {
            if gpu.memory_mib > 0 {
                writeln!(
                    writer,
                    "   └─ {}: {} ({:.0} GB VRAM)",
                    gpu.slot,
                    gpu.model,
                    gpu.memory_gib()
                )?;
            } else {
                writeln!(writer, "   └─ {}: {}", gpu.slot, gpu.model)?;
            }
        }
    }

    writeln!(
        writer,
        "\n{} Storage: {} drive(s), {:.2} TB total",
        icon("💿", no_color),
        record.drive_count,
        record.storage_total_tb
    )?;
    if verbose {
        for drive in &record.drives {
            writeln!(
                writer,
                "   └─ {}: {:.0} GB {} ({})",
                drive.name, drive.capacity_gb, drive.media_type, drive.protocol
            )?;
            let life = if drive.life_left_pct > 0.0 {
                format!(" [{:.0}% life]", drive.life_left_pct)
            } else {
                String::new()
            };
            writeln!(
                writer,
                "      {} (S/N: {}) {}{life}",
                drive.model,
                drive.serial_number,
                health_icon(&drive.health, no_color)
            )?;
        }
    } else {
        let mut ssd_count = 0;
        let mut other_count = 0;
        let mut ssd_capacity = 0.0;
        let mut other_capacity = 0.0;
        for drive in &record.drives {
            if drive.media_type == MediaType::Ssd {
                ssd_count += 1;
                ssd_capacity += drive.capacity_gb;
            } else {
                other_count += 1;
                other_capacity += drive.capacity_gb;
            }
        }
        if ssd_count > 0 {
            writeln!(writer, "   └─ {ssd_count}× SSD ({ssd_capacity:.0} GB total)")?;
        }
        if other_count > 0 {
            writeln!(
                writer,
                "   └─ {other_count}× HDD/other ({other_capacity:.0} GB total)"
            )?;
        }
    }

    if record.power_consumed_watts > 0 {
        writeln!(
            writer,
            "\n{} Power: {} W now, {} W peak",
            icon("⚡", no_color),
            record.power_consumed_watts,
            record.power_peak_watts
        )?;
    }

    Ok(())
}

fn format_summary(writer: &mut impl Write, stats: &BatchStats, no_color: bool) -> io::Result<()> {
    let line = "═".repeat(72);
    writeln!(writer, "\n{line}")?;
    writeln!(writer, "{} Summary", icon("📊", no_color))?;
    writeln!(writer, "{line}")?;

    writeln!(writer, "   Total Hosts:     {}", stats.total_hosts)?;
    writeln!(
        writer,
        "   {} Successful:    {}",
        icon("✅", no_color),
        stats.successful_count
    )?;
    writeln!(
        writer,
        "   {} Failed:        {}",
        icon("❌", no_color),
        stats.failed_count
    )?;
    writeln!(writer, "   Success Rate:    {:.1}%", stats.success_rate())?;
    writeln!(writer)?;
    writeln!(
        writer,
        "   Total Duration:  {:?}",
        round_ms(stats.total_duration)
    )?;
    writeln!(
        writer,
        "   Avg per Host:    {:?}",
        round_ms(stats.average_duration)
    )?;
    writeln!(
        writer,
        "   Fastest:         {:?}",
        round_ms(stats.fastest_duration)
    )?;
    writeln!(
        writer,
        "   Slowest:         {:?}",
        round_ms(stats.slowest_duration)
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::format;
    use common::error::InventoryError;
    use common::hardware::{CpuInfo, HostRecord, PowerState};
    use common::stats::BatchStats;

    fn sample_record() -> HostRecord {
        let mut record = HostRecord::new("10.0.0.5", None);
        record.model = String::from("PowerEdge R750");
        record.manufacturer = String::from("Dell Inc.");
        record.service_tag = String::from("SVCTAG1");
        record.power_state = PowerState::On;
        record.cpu_count = 2;
        record.cpus = vec![CpuInfo {
            socket: String::from("CPU.Socket.1"),
            model: String::from("Intel Xeon Gold 6342"),
            cores: 24,
            threads: 48,
            max_speed_mhz: 2800,
            ..Default::default()
        }];
        record.memory_total_gib = 512.0;
        record.memory_slots_total = 4;
        record.memory_slots_used = 2;
        record.memory_slots_free = 2;
        record
    }

    #[test]
    fn test_console_output_contains_key_fields() {
        let stats = BatchStats {
            total_hosts: 1,
            successful_count: 1,
            ..Default::default()
        };
        let mut buffer = Vec::new();
        format(&mut buffer, &[sample_record()], &stats, false, true).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("PowerEdge R750"));
        assert!(text.contains("SVCTAG1"));
        assert!(text.contains("CPUs: 2 installed"));
        assert!(text.contains("Memory: 512 GiB total"));
        assert!(text.contains("Slots: 2/4 used (2 free)"));
        assert!(text.contains("Success Rate:    100.0%"));
        // no_color strips icons
        assert!(!text.contains("✅"));
    }

    #[test]
    fn test_console_output_failed_host() {
        let stats = BatchStats {
            total_hosts: 1,
            failed_count: 1,
            ..Default::default()
        };
        let record = HostRecord::failed("10.0.0.9", None, InventoryError::Timeout);
        let mut buffer = Vec::new();
        format(&mut buffer, &[record], &stats, false, true).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("10.0.0.9 - Error: request timed out"));
        assert!(text.contains("Success Rate:    0.0%"));
    }

    #[test]
    fn test_console_verbose_lists_sockets() {
        let stats = BatchStats::default();
        let mut buffer = Vec::new();
        format(&mut buffer, &[sample_record()], &stats, true, true).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert!(text.contains("CPU.Socket.1"));
        assert!(text.contains("24 Cores / 48 Threads @ 2800 MHz"));
    }
}
