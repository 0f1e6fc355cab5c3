//! Central location for default values, API paths, and environment
//! variable names so nothing is scattered through the codebase.

use std::time::Duration;

// Connection defaults
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Hard cap on parallel scans regardless of configuration
pub const MAX_CONCURRENCY: usize = 50;
pub const DEFAULT_INSECURE_TLS: bool = true;

// Asset-system defaults
pub const NETBOX_TIMEOUT_SECONDS: u64 = 30;
pub const NETBOX_INSECURE_TLS: bool = false;

// HTTP client defaults
pub const HTTP_MAX_IDLE_CONNS: usize = 10;
pub const HTTP_IDLE_CONN_TIMEOUT_SECONDS: u64 = 30;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "console";

/// Expansion limit for a single IP range or CIDR entry
pub const MAX_RANGE_IPS: usize = 10_000;

// Redfish API paths (Dell iDRAC convention)
pub const REDFISH_BASE_PATH: &str = "/redfish/v1/";
pub const REDFISH_SYSTEM_PATH: &str = "/redfish/v1/Systems/System.Embedded.1";
pub const REDFISH_PROCESSORS_PATH: &str = "/redfish/v1/Systems/System.Embedded.1/Processors";
pub const REDFISH_MEMORY_PATH: &str = "/redfish/v1/Systems/System.Embedded.1/Memory";
pub const REDFISH_STORAGE_PATH: &str = "/redfish/v1/Systems/System.Embedded.1/Storage";
pub const REDFISH_POWER_PATH: &str = "/redfish/v1/Chassis/System.Embedded.1/Power";

// NetBox API paths
pub const NETBOX_DEVICES_PATH: &str = "/api/dcim/devices/";
pub const NETBOX_STATUS_PATH: &str = "/api/status/";

// NetBox custom field names (defaults, overridable per deployment)
pub const FIELD_CPU_COUNT: &str = "hw_cpu_count";
pub const FIELD_CPU_MODEL: &str = "hw_cpu_model";
pub const FIELD_CPU_CORES: &str = "hw_cpu_cores";
pub const FIELD_RAM_TOTAL_GB: &str = "hw_ram_total_gb";
pub const FIELD_RAM_SLOTS_TOTAL: &str = "hw_ram_slots_total";
pub const FIELD_RAM_SLOTS_USED: &str = "hw_ram_slots_used";
pub const FIELD_RAM_SLOTS_FREE: &str = "hw_ram_slots_free";
pub const FIELD_RAM_TYPE: &str = "hw_memory_type";
pub const FIELD_RAM_SPEED_MHZ: &str = "hw_memory_speed_mhz";
pub const FIELD_DISK_COUNT: &str = "hw_disk_count";
pub const FIELD_STORAGE_SUMMARY: &str = "hw_storage_summary";
pub const FIELD_STORAGE_TOTAL_TB: &str = "hw_storage_total_tb";
pub const FIELD_BIOS_VERSION: &str = "hw_bios_version";
pub const FIELD_POWER_STATE: &str = "hw_power_state";
pub const FIELD_POWER_CONSUMED_WATTS: &str = "hw_power_consumed_watts";
pub const FIELD_POWER_PEAK_WATTS: &str = "hw_power_peak_watts";
pub const FIELD_LAST_INVENTORY: &str = "hw_last_inventory";
pub const FIELD_GPU_COUNT: &str = "hw_gpu_count";
pub const FIELD_GPU_MODEL: &str = "hw_gpu_model";
pub const FIELD_GPU_MEMORY_GB: &str = "hw_gpu_memory_gb";

// Environment variable names honoured by the config loader
pub const ENV_LOG_LEVEL: &str = "RACKSCAN_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "RACKSCAN_LOG_FORMAT";
pub const ENV_DEFAULT_USERNAME: &str = "RACKSCAN_DEFAULT_USER";
pub const ENV_DEFAULT_PASSWORD: &str = "RACKSCAN_DEFAULT_PASS";
pub const ENV_NETBOX_URL: &str = "NETBOX_URL";
pub const ENV_NETBOX_TOKEN: &str = "NETBOX_TOKEN";

pub fn default_timeout() -> Duration {
    Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
}

pub fn netbox_timeout() -> Duration {
    Duration::from_secs(NETBOX_TIMEOUT_SECONDS)
}

pub fn http_idle_conn_timeout() -> Duration {
    Duration::from_secs(HTTP_IDLE_CONN_TIMEOUT_SECONDS)
}
