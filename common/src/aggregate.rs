use crate::hardware::HostRecord;
use crate::stats::BatchStats;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Normalised hardware attributes used as the equality key for grouping.
/// Two hosts with equal fingerprints are considered interchangeable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct HardwareFingerprint {
    pub manufacturer: String,
    pub model: String,
    pub cpu_count: usize,
    pub cpu_model: String,
    pub cpu_cores_per_socket: u32,
    pub cpu_speed_mhz: u32,
    pub ram_total_gib: u64,
    /// Size of a single DIMM in GiB
    pub ram_module_size_gib: u64,
    pub ram_type: String,
    pub ram_speed_mhz: u32,
    pub ram_slots_total: usize,
    /// Canonical drive summary, e.g. "2×745GB SSD, 4×14306GB HDD"
    pub storage_summary: String,
    pub gpu_count: usize,
    /// Model of the first GPU (homogeneous per host)
    pub gpu_model: String,
    /// VRAM per GPU in GiB
    pub gpu_memory_gib: u64,
}

impl HardwareFingerprint {
    /// Stable config-subgroup key. Manufacturer and model are excluded
    /// because they already key the enclosing model group.
    pub fn key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
            self.cpu_count,
            self.cpu_model,
            self.cpu_cores_per_socket,
            self.cpu_speed_mhz,
            self.ram_total_gib,
            self.ram_module_size_gib,
            self.ram_type,
            self.ram_speed_mhz,
            self.ram_slots_total,
            self.storage_summary,
            self.gpu_count,
            self.gpu_model,
            self.gpu_memory_gib,
        )
    }
}

/// Hosts within one model group that share an identical configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigGroup {
    pub fingerprint: HardwareFingerprint,
    pub count: usize,
    pub hosts: Vec<HostRecord>,
    /// Taken from the first member
    pub total_storage_tb: f64,
}

/// All hosts of one (manufacturer, model) pair, split into config subgroups.
/// Makes fleet drift obvious: "50× R440: 45 with config A, 5 with config B".
#[derive(Debug, Clone, Serialize)]
pub struct ModelGroup {
    pub manufacturer: String,
    pub model: String,
    pub total_count: usize,
    pub config_groups: Vec<ConfigGroup>,
}

impl ModelGroup {
    /// Human-friendly model string including the manufacturer unless the
    /// model name already starts with it.
    pub fn display_model(&self) -> String {
        if !self.manufacturer.is_empty()
            && !self
                .model
                .to_lowercase()
                .starts_with(&self.manufacturer.to_lowercase())
        {
            return format!("{} {}", self.manufacturer, self.model);
        }
        self.model.clone()
    }
}

/// Top-level aggregated report.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedInventory {
    pub generated_at: DateTime<Utc>,
    pub total_hosts: usize,
    pub successful_count: usize,
    pub failed_count: usize,
    pub model_groups: Vec<ModelGroup>,
    pub failed_hosts: Vec<HostRecord>,
    pub stats: BatchStats,
}

impl AggregatedInventory {
    /// Number of distinct config subgroups across all model groups.
    pub fn total_config_groups(&self) -> usize {
        self.model_groups
            .iter()
            .map(|group| group.config_groups.len())
            .sum()
    }

    /// All successfully scanned hosts, flattened back out of the groups.
    pub fn flat_hosts(&self) -> Vec<HostRecord> {
        let mut hosts = Vec::with_capacity(self.successful_count);
        for model_group in &self.model_groups {
            for config_group in &model_group.config_groups {
                hosts.extend(config_group.hosts.iter().cloned());
            }
        }
        hosts
    }
}
