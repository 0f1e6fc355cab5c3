use crate::error::InventoryError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Component health as reported by the BMC. Values outside the Redfish
/// standard set are preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Health {
    Ok,
    Warning,
    Critical,
    Unknown,
    Other(String),
}

impl From<String> for Health {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OK" => Health::Ok,
            "Warning" => Health::Warning,
            "Critical" => Health::Critical,
            "" => Health::Unknown,
            _ => Health::Other(value),
        }
    }
}

impl From<Health> for String {
    fn from(value: Health) -> Self {
        value.as_str().to_string()
    }
}

impl Health {
    pub fn as_str(&self) -> &str {
        match self {
            Health::Ok => "OK",
            Health::Warning => "Warning",
            Health::Critical => "Critical",
            Health::Unknown => "",
            Health::Other(value) => value,
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Health::Unknown
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Chassis power state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PowerState {
    On,
    Off,
    PoweringOn,
    PoweringOff,
    Unknown,
    Other(String),
}

impl From<String> for PowerState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "On" => PowerState::On,
            "Off" => PowerState::Off,
            "PoweringOn" => PowerState::PoweringOn,
            "PoweringOff" => PowerState::PoweringOff,
            "" => PowerState::Unknown,
            _ => PowerState::Other(value),
        }
    }
}

impl From<PowerState> for String {
    fn from(value: PowerState) -> Self {
        value.as_str().to_string()
    }
}

impl PowerState {
    pub fn as_str(&self) -> &str {
        match self {
            PowerState::On => "On",
            PowerState::Off => "Off",
            PowerState::PoweringOn => "PoweringOn",
            PowerState::PoweringOff => "PoweringOff",
            PowerState::Unknown => "",
            PowerState::Other(value) => value,
        }
    }
}

impl Default for PowerState {
    fn default() -> Self {
        PowerState::Unknown
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// DIMM slot state. `Enabled` means populated, `Absent` means an empty slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemoryState {
    Enabled,
    Absent,
    Disabled,
    Unknown,
    Other(String),
}

impl From<String> for MemoryState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Enabled" => MemoryState::Enabled,
            "Absent" => MemoryState::Absent,
            "Disabled" => MemoryState::Disabled,
            "" => MemoryState::Unknown,
            _ => MemoryState::Other(value),
        }
    }
}

impl From<MemoryState> for String {
    fn from(value: MemoryState) -> Self {
        value.as_str().to_string()
    }
}

impl MemoryState {
    pub fn as_str(&self) -> &str {
        match self {
            MemoryState::Enabled => "Enabled",
            MemoryState::Absent => "Absent",
            MemoryState::Disabled => "Disabled",
            MemoryState::Unknown => "",
            MemoryState::Other(value) => value,
        }
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        MemoryState::Unknown
    }
}

/// Drive media type (SSD, HDD, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MediaType {
    Ssd,
    Hdd,
    Nvme,
    Unknown,
    Other(String),
}

impl From<String> for MediaType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SSD" => MediaType::Ssd,
            "HDD" => MediaType::Hdd,
            "NVMe" => MediaType::Nvme,
            "" => MediaType::Unknown,
            _ => MediaType::Other(value),
        }
    }
}

impl From<MediaType> for String {
    fn from(value: MediaType) -> Self {
        value.as_str().to_string()
    }
}

impl MediaType {
    pub fn as_str(&self) -> &str {
        match self {
            MediaType::Ssd => "SSD",
            MediaType::Hdd => "HDD",
            MediaType::Nvme => "NVMe",
            MediaType::Unknown => "",
            MediaType::Other(value) => value,
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::Unknown
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Drive bus protocol (SATA, SAS, NVMe, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Protocol {
    Sata,
    Sas,
    Nvme,
    Unknown,
    Other(String),
}

impl From<String> for Protocol {
    fn from(value: String) -> Self {
        match value.as_str() {
            "SATA" => Protocol::Sata,
            "SAS" => Protocol::Sas,
            "NVMe" => Protocol::Nvme,
            "" => Protocol::Unknown,
            _ => Protocol::Other(value),
        }
    }
}

impl From<Protocol> for String {
    fn from(value: Protocol) -> Self {
        value.as_str().to_string()
    }
}

impl Protocol {
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::Sata => "SATA",
            Protocol::Sas => "SAS",
            Protocol::Nvme => "NVMe",
            Protocol::Unknown => "",
            Protocol::Other(value) => value,
        }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Protocol::Unknown
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single installed processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpuInfo {
    pub socket: String,
    pub model: String,
    pub manufacturer: String,
    /// Manufacturer and model combined when both are present
    pub brand: String,
    pub cores: u32,
    pub threads: u32,
    pub max_speed_mhz: u32,
    pub operating_speed_mhz: u32,
    pub architecture: String,
    pub instruction_set: String,
    pub health: Health,
}

/// A single memory module or empty DIMM slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub slot: String,
    /// Module size in MiB
    pub capacity_mib: u64,
    /// Device type, e.g. "DDR4", "DDR5"
    #[serde(rename = "type")]
    pub memory_type: String,
    pub technology: String,
    /// Module form, e.g. "RDIMM", "LRDIMM"
    pub base_module_type: String,
    pub speed_mhz: u32,
    pub manufacturer: String,
    pub part_number: String,
    pub serial_number: String,
    pub rank_count: u32,
    pub data_width_bits: u32,
    pub state: MemoryState,
    pub health: Health,
}

impl MemoryInfo {
    /// True when the slot contains an active DIMM.
    pub fn is_populated(&self) -> bool {
        self.state == MemoryState::Enabled
    }

    /// True when the slot is empty.
    pub fn is_empty(&self) -> bool {
        self.state == MemoryState::Absent
    }

    pub fn capacity_gib(&self) -> f64 {
        self.capacity_mib as f64 / 1024.0
    }
}

/// A single physical drive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DriveInfo {
    pub name: String,
    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub capacity_gb: f64,
    pub media_type: MediaType,
    pub protocol: Protocol,
    /// Predicted media life remaining, 0 when unknown
    pub life_left_pct: f64,
    pub health: Health,
}

impl DriveInfo {
    pub fn capacity_tb(&self) -> f64 {
        self.capacity_gb / 1024.0
    }

    pub fn is_ssd(&self) -> bool {
        self.media_type == MediaType::Ssd
    }
}

/// A GPU or accelerator reported through the processor collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GpuInfo {
    pub slot: String,
    pub model: String,
    pub manufacturer: String,
    /// VRAM in MiB, summed over the inline memory banks (0 if unknown)
    pub memory_mib: u64,
    pub memory_type: String,
    pub health: Health,
}

impl GpuInfo {
    pub fn memory_gib(&self) -> f64 {
        self.memory_mib as f64 / 1024.0
    }
}

/// Everything collected from a single BMC. A failed scan still produces a
/// record; `error` is set and only the identification fields are meaningful.
#[derive(Debug, Clone, Serialize)]
pub struct HostRecord {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub collected_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<InventoryError>,

    pub model: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub service_tag: String,
    pub bios_version: String,
    pub hostname: String,
    pub power_state: PowerState,

    pub cpus: Vec<CpuInfo>,
    pub cpu_count: usize,
    pub cpu_model: String,

    pub memory: Vec<MemoryInfo>,
    pub memory_total_gib: f64,
    pub memory_slots_total: usize,
    pub memory_slots_used: usize,
    pub memory_slots_free: usize,

    pub drives: Vec<DriveInfo>,
    pub drive_count: usize,
    pub storage_total_tb: f64,

    pub gpus: Vec<GpuInfo>,
    pub gpu_count: usize,

    pub power_consumed_watts: u32,
    pub power_peak_watts: u32,
}

impl HostRecord {
    pub fn new(host: &str, display_name: Option<String>) -> Self {
        HostRecord {
            host: host.to_string(),
            display_name,
            collected_at: Utc::now(),
            error: None,
            model: String::new(),
            manufacturer: String::new(),
            serial_number: String::new(),
            service_tag: String::new(),
            bios_version: String::new(),
            hostname: String::new(),
            power_state: PowerState::Unknown,
            cpus: Vec::new(),
            cpu_count: 0,
            cpu_model: String::new(),
            memory: Vec::new(),
            memory_total_gib: 0.0,
            memory_slots_total: 0,
            memory_slots_used: 0,
            memory_slots_free: 0,
            drives: Vec::new(),
            drive_count: 0,
            storage_total_tb: 0.0,
            gpus: Vec::new(),
            gpu_count: 0,
            power_consumed_watts: 0,
            power_peak_watts: 0,
        }
    }

    /// Shorthand for building a record that failed before collection.
    pub fn failed(host: &str, display_name: Option<String>, error: InventoryError) -> Self {
        let mut record = HostRecord::new(host, display_name);
        record.error = Some(error);
        record
    }

    /// True when collection completed without a fatal error.
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// The best available name: configured display name, then the
    /// reported hostname, then the address we scanned.
    pub fn best_name(&self) -> &str {
        if let Some(name) = &self.display_name {
            if !name.is_empty() {
                return name;
            }
        }
        if !self.hostname.is_empty() {
            return &self.hostname;
        }
        &self.host
    }

    /// One-line summary for log output.
    pub fn summary(&self) -> String {
        if let Some(err) = &self.error {
            return format!("{}: ERROR - {err}", self.host);
        }
        format!(
            "{}: {}, {} CPUs, {:.0} GiB RAM ({}/{} slots), {} drives ({:.2} TB)",
            self.host,
            self.model,
            self.cpu_count,
            self.memory_total_gib,
            self.memory_slots_used,
            self.memory_slots_total,
            self.drive_count,
            self.storage_total_tb
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CpuInfo, DriveInfo, Health, HostRecord, MediaType, MemoryInfo, MemoryState, PowerState,
        Protocol,
    };
    use crate::error::InventoryError;

    #[test]
    fn test_health_from_wire() {
        assert_eq!(Health::from(String::from("OK")), Health::Ok);
        assert_eq!(Health::from(String::from("Critical")), Health::Critical);
        assert_eq!(Health::from(String::new()), Health::Unknown);
    }

    #[test]
    fn test_unknown_values_preserved() {
        let media = MediaType::from(String::from("SMR"));
        assert_eq!(media, MediaType::Other(String::from("SMR")));
        assert_eq!(media.as_str(), "SMR");

        let proto = Protocol::from(String::from("USB"));
        assert_eq!(proto.as_str(), "USB");

        let state = PowerState::from(String::from("Paused"));
        assert_eq!(state.as_str(), "Paused");
    }

    #[test]
    fn test_enum_serde_round_trip() {
        let media: MediaType = serde_json::from_str("\"SSD\"").unwrap();
        assert_eq!(media, MediaType::Ssd);
        assert_eq!(serde_json::to_string(&media).unwrap(), "\"SSD\"");

        let odd: MediaType = serde_json::from_str("\"Tape\"").unwrap();
        assert_eq!(serde_json::to_string(&odd).unwrap(), "\"Tape\"");
    }

    #[test]
    fn test_memory_slot_states() {
        let mut module = MemoryInfo {
            slot: String::from("A1"),
            capacity_mib: 32768,
            state: MemoryState::Enabled,
            ..Default::default()
        };
        assert!(module.is_populated());
        assert!(!module.is_empty());
        assert_eq!(module.capacity_gib(), 32.0);

        module.state = MemoryState::Absent;
        assert!(module.is_empty());
        assert!(!module.is_populated());
    }

    #[test]
    fn test_drive_helpers() {
        let drive = DriveInfo {
            capacity_gb: 2048.0,
            media_type: MediaType::Ssd,
            ..Default::default()
        };
        assert_eq!(drive.capacity_tb(), 2.0);
        assert!(drive.is_ssd());
    }

    #[test]
    fn test_best_name_fallback() {
        let mut record = HostRecord::new("10.0.0.5", None);
        assert_eq!(record.best_name(), "10.0.0.5");

        record.hostname = String::from("compute-05");
        assert_eq!(record.best_name(), "compute-05");

        record.display_name = Some(String::from("rack3-slot2"));
        assert_eq!(record.best_name(), "rack3-slot2");
    }

    #[test]
    fn test_failed_record() {
        let record = HostRecord::failed("10.0.0.9", None, InventoryError::Timeout);
        assert!(!record.is_valid());
        assert!(record.summary().contains("ERROR"));
        assert!(record.summary().contains("request timed out"));
    }

    #[test]
    fn test_summary_line() {
        let mut record = HostRecord::new("10.0.0.5", None);
        record.model = String::from("PowerEdge R750");
        record.cpu_count = 2;
        record.cpus = vec![CpuInfo::default(), CpuInfo::default()];
        record.memory_total_gib = 512.0;
        record.memory_slots_total = 4;
        record.memory_slots_used = 2;
        record.drive_count = 1;
        record.storage_total_tb = 0.87;
        assert_eq!(
            record.summary(),
            "10.0.0.5: PowerEdge R750, 2 CPUs, 512 GiB RAM (2/4 slots), 1 drives (0.87 TB)"
        );
    }

    #[test]
    fn test_record_serializes_error_as_message() {
        let record = HostRecord::failed("10.0.0.9", None, InventoryError::AuthFailed);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["error"], "authentication failed");
        assert_eq!(value["host"], "10.0.0.9");
    }
}
