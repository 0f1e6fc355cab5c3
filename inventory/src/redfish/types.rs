//! Serde bindings for the subset of the Redfish schema the scanner walks.
//! Decoding is lenient: unknown fields are ignored and explicit `null`s
//! collapse to defaults, since BMC firmware fills absent-hardware entries
//! with nulls.

use common::hardware::{MediaType, PowerState, Protocol};
use serde::{Deserialize, Deserializer};

pub const STATE_ENABLED: &str = "Enabled";
pub const STATE_ABSENT: &str = "Absent";

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A reference to another Redfish resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Link {
    #[serde(rename = "@odata.id")]
    pub odata_id: String,
}

/// A Redfish collection response with member links.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Collection {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Members@odata.count")]
    pub count: u64,
    #[serde(rename = "Members")]
    pub members: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Status {
    #[serde(rename = "State", deserialize_with = "null_default")]
    pub state: String,
    #[serde(rename = "Health", deserialize_with = "null_default")]
    pub health: common::hardware::Health,
}

/// The Redfish service root, used for connection validation only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceRoot {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "RedfishVersion")]
    pub redfish_version: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Product")]
    pub product: String,
}

/// A ComputerSystem resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct System {
    #[serde(rename = "Model", deserialize_with = "null_default")]
    pub model: String,
    #[serde(rename = "Manufacturer", deserialize_with = "null_default")]
    pub manufacturer: String,
    #[serde(rename = "SerialNumber", deserialize_with = "null_default")]
    pub serial_number: String,
    /// Dell exposes the service tag as SKU
    #[serde(rename = "SKU", deserialize_with = "null_default")]
    pub sku: String,
    #[serde(rename = "BiosVersion", deserialize_with = "null_default")]
    pub bios_version: String,
    #[serde(rename = "HostName", deserialize_with = "null_default")]
    pub host_name: String,
    #[serde(rename = "PowerState", deserialize_with = "null_default")]
    pub power_state: PowerState,
    #[serde(rename = "MemorySummary")]
    pub memory_summary: MemorySummary,
    #[serde(rename = "ProcessorSummary")]
    pub processor_summary: ProcessorSummary,
    #[serde(rename = "Oem")]
    pub oem: Oem,
    #[serde(rename = "Status")]
    pub status: Status,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemorySummary {
    #[serde(rename = "TotalSystemMemoryGiB", deserialize_with = "null_default")]
    pub total_system_memory_gib: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessorSummary {
    #[serde(rename = "Count", deserialize_with = "null_default")]
    pub count: u32,
    #[serde(rename = "Model", deserialize_with = "null_default")]
    pub model: String,
    #[serde(rename = "LogicalProcessorCount", deserialize_with = "null_default")]
    pub logical_processor_count: u32,
}

/// Vendor OEM block. Dell reports chassis-level DIMM slot counts here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Oem {
    #[serde(rename = "Dell")]
    pub dell: Option<OemDell>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OemDell {
    #[serde(rename = "DellSystem")]
    pub dell_system: Option<DellSystem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DellSystem {
    #[serde(rename = "MaxDIMMSlots", deserialize_with = "null_default")]
    pub max_dimm_slots: u32,
    #[serde(rename = "PopulatedDIMMSlots", deserialize_with = "null_default")]
    pub populated_dimm_slots: u32,
}

/// A Processor resource. GPUs and accelerators appear in the same
/// collection as CPUs on most BMCs.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Processor {
    #[serde(rename = "Name", deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "Socket", deserialize_with = "null_default")]
    pub socket: String,
    #[serde(rename = "Model", deserialize_with = "null_default")]
    pub model: String,
    #[serde(rename = "Manufacturer", deserialize_with = "null_default")]
    pub manufacturer: String,
    #[serde(rename = "ProcessorType", deserialize_with = "null_default")]
    pub processor_type: String,
    #[serde(rename = "ProcessorArchitecture", deserialize_with = "null_default")]
    pub processor_architecture: String,
    #[serde(rename = "InstructionSet", deserialize_with = "null_default")]
    pub instruction_set: String,
    #[serde(rename = "MaxSpeedMHz", deserialize_with = "null_default")]
    pub max_speed_mhz: u32,
    #[serde(rename = "OperatingSpeedMHz", deserialize_with = "null_default")]
    pub operating_speed_mhz: u32,
    #[serde(rename = "TotalCores", deserialize_with = "null_default")]
    pub total_cores: u32,
    #[serde(rename = "TotalThreads", deserialize_with = "null_default")]
    pub total_threads: u32,
    #[serde(rename = "ProcessorMemory")]
    pub processor_memory: Vec<ProcessorMemory>,
    #[serde(rename = "Status")]
    pub status: Status,
}

impl Processor {
    /// Present and enabled.
    pub fn is_installed(&self) -> bool {
        self.status.state == STATE_ENABLED
    }

    /// GPU/accelerator heuristic: either the declared type says so, or the
    /// entry carries inline memory banks with real capacity.
    pub fn is_gpu(&self) -> bool {
        if self.processor_type == "GPU" || self.processor_type == "Accelerator" {
            return true;
        }
        self.processor_memory.iter().any(|bank| bank.capacity_mib > 0)
    }
}

/// Inline VRAM bank on a GPU processor entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProcessorMemory {
    #[serde(rename = "MemoryType", deserialize_with = "null_default")]
    pub memory_type: String,
    #[serde(rename = "CapacityMiB", deserialize_with = "null_default")]
    pub capacity_mib: u64,
}

/// A Memory (DIMM) resource. Absent slots still appear as members with
/// `Status.State == "Absent"` and null capability fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Memory {
    #[serde(rename = "Id", deserialize_with = "null_default")]
    pub id: String,
    #[serde(rename = "DeviceLocator", deserialize_with = "null_default")]
    pub device_locator: String,
    #[serde(rename = "Manufacturer", deserialize_with = "null_default")]
    pub manufacturer: String,
    #[serde(rename = "PartNumber", deserialize_with = "null_default")]
    pub part_number: String,
    #[serde(rename = "SerialNumber", deserialize_with = "null_default")]
    pub serial_number: String,
    #[serde(rename = "MemoryDeviceType", deserialize_with = "null_default")]
    pub memory_device_type: String,
    #[serde(rename = "MemoryType", deserialize_with = "null_default")]
    pub memory_type: String,
    #[serde(rename = "BaseModuleType", deserialize_with = "null_default")]
    pub base_module_type: String,
    #[serde(rename = "CapacityMiB", deserialize_with = "null_default")]
    pub capacity_mib: u64,
    #[serde(rename = "DataWidthBits", deserialize_with = "null_default")]
    pub data_width_bits: u32,
    #[serde(rename = "OperatingSpeedMhz", deserialize_with = "null_default")]
    pub operating_speed_mhz: u32,
    #[serde(rename = "RankCount", deserialize_with = "null_default")]
    pub rank_count: u32,
    #[serde(rename = "Status")]
    pub status: Status,
}

impl Memory {
    pub fn is_populated(&self) -> bool {
        self.status.state == STATE_ENABLED
    }

    pub fn is_empty(&self) -> bool {
        self.status.state == STATE_ABSENT
    }
}

/// A Storage controller resource with links to its drives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
    #[serde(rename = "Id", deserialize_with = "null_default")]
    pub id: String,
    #[serde(rename = "Name", deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "Drives")]
    pub drives: Vec<Link>,
    #[serde(rename = "Drives@odata.count")]
    pub drives_count: u64,
    #[serde(rename = "Status")]
    pub status: Status,
}

/// A Drive resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Drive {
    #[serde(rename = "Name", deserialize_with = "null_default")]
    pub name: String,
    #[serde(rename = "Model", deserialize_with = "null_default")]
    pub model: String,
    #[serde(rename = "Manufacturer", deserialize_with = "null_default")]
    pub manufacturer: String,
    #[serde(rename = "SerialNumber", deserialize_with = "null_default")]
    pub serial_number: String,
    #[serde(rename = "CapacityBytes", deserialize_with = "null_default")]
    pub capacity_bytes: i64,
    #[serde(rename = "MediaType", deserialize_with = "null_default")]
    pub media_type: MediaType,
    #[serde(rename = "Protocol", deserialize_with = "null_default")]
    pub protocol: Protocol,
    #[serde(
        rename = "PredictedMediaLifeLeftPercent",
        deserialize_with = "null_default"
    )]
    pub predicted_media_life_left_percent: f64,
    #[serde(rename = "Status")]
    pub status: Status,
}

impl Drive {
    pub fn capacity_gb(&self) -> f64 {
        self.capacity_bytes as f64 / 1024.0 / 1024.0 / 1024.0
    }
}

/// The chassis Power resource.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Power {
    #[serde(rename = "PowerControl")]
    pub power_control: Vec<PowerControl>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PowerControl {
    #[serde(rename = "PowerConsumedWatts", deserialize_with = "null_default")]
    pub power_consumed_watts: f64,
    #[serde(rename = "PowerMetrics")]
    pub power_metrics: PowerMetrics,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PowerMetrics {
    #[serde(rename = "MaxConsumedWatts", deserialize_with = "null_default")]
    pub max_consumed_watts: f64,
    #[serde(rename = "IntervalInMin", deserialize_with = "null_default")]
    pub interval_in_min: u32,
}
