//! Groups scanned hosts into a model → configuration hierarchy keyed by
//! normalised hardware fingerprints.

use chrono::Utc;
use common::aggregate::{AggregatedInventory, ConfigGroup, HardwareFingerprint, ModelGroup};
use common::hardware::{DriveInfo, HostRecord};
use common::stats::BatchStats;
use std::collections::HashMap;

/// Group hosts two levels deep:
///  1. model group — every host with the same (manufacturer, model)
///  2. config subgroup — hosts within a model sharing the same fingerprint
///
/// Failed hosts are collected separately. Model groups are ordered by
/// total count descending, config subgroups by count descending; ties
/// keep first-seen order.
pub fn group_by_configuration(
    records: Vec<HostRecord>,
    stats: BatchStats,
) -> AggregatedInventory {
    let mut inventory = AggregatedInventory {
        generated_at: Utc::now(),
        total_hosts: records.len(),
        successful_count: 0,
        failed_count: 0,
        model_groups: Vec::new(),
        failed_hosts: Vec::new(),
        stats,
    };

    // (manufacturer, model) → index into model_groups, insertion-ordered
    let mut model_index: HashMap<(String, String), usize> = HashMap::new();
    // "manufacturer|model\0fingerprint-key" → index into that group's config_groups
    let mut config_index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if !record.is_valid() {
            inventory.failed_hosts.push(record);
            inventory.failed_count += 1;
            continue;
        }
        inventory.successful_count += 1;

        let model_key = (record.manufacturer.clone(), record.model.clone());
        let group_index = match model_index.get(&model_key) {
            Some(index) => *index,
            None => {
                let index = inventory.model_groups.len();
                inventory.model_groups.push(ModelGroup {
                    manufacturer: record.manufacturer.clone(),
                    model: record.model.clone(),
                    total_count: 0,
                    config_groups: Vec::new(),
                });
                model_index.insert(model_key.clone(), index);
                index
            }
        };
        let group = &mut inventory.model_groups[group_index];
        group.total_count += 1;

        let fingerprint = build_fingerprint(&record);
        let combined_key = format!(
            "{}|{}\u{0}{}",
            model_key.0,
            model_key.1,
            fingerprint.key()
        );

        match config_index.get(&combined_key) {
            Some(index) => {
                let config_group = &mut group.config_groups[*index];
                config_group.count += 1;
                config_group.hosts.push(record);
            }
            None => {
                config_index.insert(combined_key, group.config_groups.len());
                let total_storage_tb = record.storage_total_tb;
                group.config_groups.push(ConfigGroup {
                    fingerprint,
                    count: 1,
                    hosts: vec![record],
                    total_storage_tb,
                });
            }
        }
    }

    // Stable sorts keep first-seen order between equal counts.
    inventory
        .model_groups
        .sort_by(|a, b| b.total_count.cmp(&a.total_count));
    for group in &mut inventory.model_groups {
        group
            .config_groups
            .sort_by(|a, b| b.count.cmp(&a.count));
    }

    inventory
}

/// Derive the normalised fingerprint for a successfully scanned host.
pub fn build_fingerprint(record: &HostRecord) -> HardwareFingerprint {
    let mut fingerprint = HardwareFingerprint {
        manufacturer: record.manufacturer.clone(),
        model: record.model.clone(),
        cpu_count: record.cpu_count,
        cpu_model: record.cpu_model.clone(),
        ram_total_gib: (record.memory_total_gib + 0.5) as u64,
        ram_slots_total: record.memory_slots_total,
        storage_summary: normalize_storage_summary(&record.drives),
        gpu_count: record.gpu_count,
        ..Default::default()
    };

    // Per-socket CPU details from the first populated socket.
    for cpu in &record.cpus {
        if cpu.cores > 0 {
            fingerprint.cpu_cores_per_socket = cpu.cores;
            fingerprint.cpu_speed_mhz = cpu.max_speed_mhz;
            if fingerprint.cpu_model.is_empty() {
                fingerprint.cpu_model = cpu.model.clone();
            }
            break;
        }
    }

    // Memory type, speed, and module size from the first populated DIMM.
    for module in &record.memory {
        if module.is_populated() {
            fingerprint.ram_type = module.memory_type.clone();
            fingerprint.ram_speed_mhz = module.speed_mhz;
            fingerprint.ram_module_size_gib = (module.capacity_mib + 512) / 1024;
            break;
        }
    }

    // GPU model and VRAM from the first GPU (homogeneous per host).
    if let Some(gpu) = record.gpus.first() {
        fingerprint.gpu_model = gpu.model.clone();
        fingerprint.gpu_memory_gib = (gpu.memory_gib() + 0.5) as u64;
    }

    fingerprint
}

/// Build the canonical storage summary: drives bucketed by rounded
/// capacity and media type, SSDs listed first, remaining media types in
/// lexicographic order, capacities descending within a type.
/// Example: "2×745GB SSD, 4×14306GB HDD"
pub fn normalize_storage_summary(drives: &[DriveInfo]) -> String {
    if drives.is_empty() {
        return String::from("no drives");
    }

    let mut counts: HashMap<(u64, String), usize> = HashMap::new();
    for drive in drives {
        let key = (
            (drive.capacity_gb + 0.5) as u64,
            drive.media_type.as_str().to_string(),
        );
        *counts.entry(key).or_insert(0) += 1;
    }

    let mut keys: Vec<(u64, String)> = counts.keys().cloned().collect();
    keys.sort_by(|a, b| {
        if a.1 != b.1 {
            if a.1 == "SSD" {
                return std::cmp::Ordering::Less;
            }
            if b.1 == "SSD" {
                return std::cmp::Ordering::Greater;
            }
            return a.1.cmp(&b.1);
        }
        b.0.cmp(&a.0)
    });

    let parts: Vec<String> = keys
        .iter()
        .map(|key| format!("{}×{}GB {}", counts[key], key.0, key.1))
        .collect();

    parts.join(", ")
}
