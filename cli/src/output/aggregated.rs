//! Aggregated model → configuration console report.

use super::round_ms;
use common::aggregate::AggregatedInventory;
use std::io::{self, Write};

const WIDTH: usize = 80;

fn bold(no_color: bool) -> &'static str {
    if no_color {
        return "";
    }
    "\x1b[1m"
}

fn reset(no_color: bool) -> &'static str {
    if no_color {
        return "";
    }
    "\x1b[0m"
}

pub fn format(
    writer: &mut impl Write,
    inventory: &AggregatedInventory,
    no_color: bool,
) -> io::Result<()> {
    let line = "═".repeat(WIDTH);
    let thin = "─".repeat(WIDTH);
    let dotted = "·".repeat(60);

    writeln!(writer, "\n{line}")?;
    writeln!(writer, "  HARDWARE INVENTORY REPORT")?;
    writeln!(
        writer,
        "  Generated: {}",
        inventory.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(writer, "{line}")?;
    writeln!(
        writer,
        "  Total: {} hosts  |  Success: {}  |  Failed: {}  |  Models: {}  |  Config groups: {}",
        inventory.total_hosts,
        inventory.successful_count,
        inventory.failed_count,
        inventory.model_groups.len(),
        inventory.total_config_groups()
    )?;
    if !inventory.stats.total_duration.is_zero() {
        writeln!(
            writer,
            "  Scan time: {:?} total  |  avg {:?}/host",
            round_ms(inventory.stats.total_duration),
            round_ms(inventory.stats.average_duration)
        )?;
    }
    writeln!(writer)?;

    for (index, group) in inventory.model_groups.iter().enumerate() {
        writeln!(writer, "{thin}")?;
        writeln!(
            writer,
            "  MODEL {} — {}{}× {}{}",
            index + 1,
            bold(no_color),
            group.total_count,
            group.display_model(),
            reset(no_color)
        )?;
        writeln!(writer, "{thin}")?;

        for (config_index, config) in group.config_groups.iter().enumerate() {
            let fp = &config.fingerprint;

            if group.config_groups.len() > 1 {
                let plural = if config.count == 1 { "" } else { "s" };
                writeln!(
                    writer,
                    "\n  {}Configuration {}/{}{}  ({} host{plural})",
                    bold(no_color),
                    config_index + 1,
                    group.config_groups.len(),
                    reset(no_color),
                    config.count
                )?;
                writeln!(writer, "  {dotted}")?;
            } else {
                writeln!(writer)?;
            }

            let cpu_spec = if fp.cpu_model.is_empty() {
                format!("{} sockets", fp.cpu_count)
            } else {
                format!("{}× {}", fp.cpu_count, fp.cpu_model)
            };
            writeln!(writer, "  {:<15} {cpu_spec}", "CPUs:")?;

            if fp.cpu_cores_per_socket > 0 {
                let total_cores = fp.cpu_cores_per_socket as usize * fp.cpu_count;
                let speed = if fp.cpu_speed_mhz > 0 {
                    format!("  @  {:.2} GHz", fp.cpu_speed_mhz as f64 / 1000.0)
                } else {
                    String::new()
                };
                writeln!(
                    writer,
                    "  {:<15} {} cores/CPU ({total_cores} total){speed}",
                    "CPU Cores:", fp.cpu_cores_per_socket
                )?;
            }

            let mut ram_spec = format!("{} GiB", fp.ram_total_gib);
            if !fp.ram_type.is_empty() {
                ram_spec.push_str("  ");
                ram_spec.push_str(&fp.ram_type);
                if fp.ram_speed_mhz > 0 {
                    ram_spec.push_str(&format!(" @ {} MHz", fp.ram_speed_mhz));
                }
            }
            if fp.ram_module_size_gib > 0 {
                let module_count = config
                    .hosts
                    .first()
                    .map_or(0, |host| host.memory_slots_used);
                if module_count > 0 {
                    ram_spec.push_str(&format!(
                        "  ({module_count}× {} GiB modules)",
                        fp.ram_module_size_gib
                    ));
                } else {
                    ram_spec.push_str(&format!("  ({} GiB/module)", fp.ram_module_size_gib));
                }
            }
            writeln!(writer, "  {:<15} {ram_spec}", "RAM:")?;

            if fp.ram_slots_total > 0 {
                if let Some(first) = config.hosts.first() {
                    writeln!(
                        writer,
                        "  {:<15} {} total  /  {} used  /  {} free",
                        "RAM Slots:",
                        fp.ram_slots_total,
                        first.memory_slots_used,
                        first.memory_slots_free
                    )?;
                }
            }

            if fp.gpu_count > 0 {
                let mut gpu_spec = format!("{}×", fp.gpu_count);
                if !fp.gpu_model.is_empty() {
                    gpu_spec.push(' ');
                    gpu_spec.push_str(&fp.gpu_model);
                }
                if fp.gpu_memory_gib > 0 {
                    gpu_spec.push_str(&format!(" ({} GB VRAM each)", fp.gpu_memory_gib));
                }
                writeln!(writer, "  {:<15} {gpu_spec}", "GPUs:")?;
            }

            let mut storage_spec = fp.storage_summary.clone();
            if config.total_storage_tb > 0.0 {
                storage_spec.push_str(&format!("  ({:.2} TB total)", config.total_storage_tb));
            }
            writeln!(writer, "  {:<15} {storage_spec}", "Storage:")?;

            writeln!(writer, "\n  Hosts ({}):", config.count)?;
            writeln!(
                writer,
                "    {:<18} {:<22} {:<14} {}",
                "IP Address", "Hostname", "Service Tag", "Power"
            )?;
            writeln!(writer, "    {}", "-".repeat(64))?;
            for host in &config.hosts {
                let hostname = if host.hostname.is_empty() {
                    host.display_name.as_deref().unwrap_or("-")
                } else {
                    &host.hostname
                };
                let service_tag = if host.service_tag.is_empty() {
                    "-"
                } else {
                    &host.service_tag
                };
                writeln!(
                    writer,
                    "    {:<18} {:<22} {:<14} {}",
                    host.host, hostname, service_tag, host.power_state
                )?;
            }
        }
        writeln!(writer)?;
    }

    if !inventory.failed_hosts.is_empty() {
        writeln!(writer, "{thin}")?;
        writeln!(writer, "  FAILED SCANS ({})", inventory.failed_hosts.len())?;
        writeln!(writer, "{thin}")?;
        for host in &inventory.failed_hosts {
            let message = host
                .error
                .as_ref()
                .map(|err| err.to_string())
                .unwrap_or_else(|| String::from("unknown error"));
            writeln!(writer, "  {:<20}  {message}", host.host)?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{line}\n")?;
    Ok(())
}
