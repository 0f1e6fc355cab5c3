//! Walks the Redfish resource graph of a single BMC and assembles a
//! `HostRecord`. Only the system resource is fatal; every later component
//! degrades to a partial record.

use crate::config::{Config, DefaultsConfig, HostSpec, HttpConfig};
use crate::defaults;
use crate::redfish::types::{
    Collection, Drive, Memory, Power, Processor, ServiceRoot, Storage, System,
};
use crate::redfish::RedfishClient;
use common::error::InventoryError;
use common::hardware::{CpuInfo, DriveInfo, GpuInfo, HostRecord, MemoryInfo, MemoryState};
use log::{debug, info, warn};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// Scans individual hosts. Holds the two shared HTTP clients (verifying
/// and certificate-skipping) so connection pools are reused fleet-wide.
pub struct HostScanner {
    defaults: DefaultsConfig,
    verify_client: reqwest::Client,
    insecure_client: reqwest::Client,
}

pub(crate) fn build_http_client(
    insecure: bool,
    http: &HttpConfig,
) -> Result<reqwest::Client, InventoryError> {
    reqwest::Client::builder()
        .user_agent(concat!("rackscan/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(http.max_idle_conns())
        .pool_idle_timeout(http.idle_conn_timeout())
        .danger_accept_invalid_certs(insecure)
        .build()
        .map_err(|err| InventoryError::config("http", &format!("failed to build client: {err}")))
}

fn base_url(host: &str) -> String {
    // BMCs are HTTPS; an explicit scheme in the host entry wins (useful
    // for lab setups and tests)
    if host.starts_with("http://") || host.starts_with("https://") {
        return host.to_string();
    }
    format!("https://{host}")
}

impl HostScanner {
    pub fn new(config: &Config) -> Result<Self, InventoryError> {
        Ok(HostScanner {
            defaults: config.defaults.clone(),
            verify_client: build_http_client(false, &config.http)?,
            insecure_client: build_http_client(true, &config.http)?,
        })
    }

    fn client_for(&self, spec: &HostSpec) -> RedfishClient {
        let insecure = spec.insecure_tls(self.defaults.insecure_tls());
        let http = if insecure {
            self.insecure_client.clone()
        } else {
            self.verify_client.clone()
        };
        RedfishClient::new(
            base_url(&spec.host),
            spec.username(&self.defaults.username).to_string(),
            spec.password(&self.defaults.password).to_string(),
            http,
        )
    }

    /// Scan one host. Always returns a record; failures surface through
    /// the record's `error` field.
    pub async fn scan_host(&self, cancel: &CancellationToken, spec: &HostSpec) -> HostRecord {
        let mut record = HostRecord::new(&spec.host, spec.display_name.clone());

        debug!("[scanner] Scanning host {}", spec.host);

        let client = self.client_for(spec);
        let deadline = spec.timeout(self.defaults.timeout());

        if timeout(deadline, self.walk(cancel, &client, &mut record))
            .await
            .is_err()
        {
            warn!(
                "[scanner] Scan of {} exceeded its {deadline:?} deadline",
                spec.host
            );
            record.error = Some(InventoryError::Timeout);
        }

        if record.is_valid() {
            info!("[scanner] {}", record.summary());
        }

        record
    }

    /// Probe the service root to verify reachability and credentials.
    pub async fn validate_connection(
        &self,
        cancel: &CancellationToken,
        spec: &HostSpec,
    ) -> Option<InventoryError> {
        let client = self.client_for(spec);
        let deadline = spec.timeout(self.defaults.timeout());

        match timeout(
            deadline,
            client.get::<ServiceRoot>(cancel, defaults::REDFISH_BASE_PATH),
        )
        .await
        {
            Err(_) => Some(InventoryError::Timeout),
            Ok(Err(err)) => Some(err),
            Ok(Ok(root)) => {
                debug!(
                    "[scanner] Connection to {} validated (Redfish {})",
                    spec.host, root.redfish_version
                );
                None
            }
        }
    }

    async fn walk(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) {
        // System resource is fatal: without it the record is useless.
        if let Err(err) = self.collect_system(cancel, client, record).await {
            if err.is(&InventoryError::Cancelled) {
                record.error = Some(InventoryError::Cancelled);
            } else {
                warn!(
                    "[scanner] Failed to collect system info from {}: {err}",
                    record.host
                );
                record.error = Some(err);
            }
            return;
        }

        if let Err(err) = self.collect_processors(cancel, client, record).await {
            if err.is(&InventoryError::Cancelled) {
                record.error = Some(InventoryError::Cancelled);
                return;
            }
            warn!(
                "[scanner] Failed to collect processor info from {}: {err}",
                record.host
            );
        }

        if let Err(err) = self.collect_memory(cancel, client, record).await {
            if err.is(&InventoryError::Cancelled) {
                record.error = Some(InventoryError::Cancelled);
                return;
            }
            warn!(
                "[scanner] Failed to collect memory info from {}: {err}",
                record.host
            );
        }

        if let Err(err) = self.collect_storage(cancel, client, record).await {
            if err.is(&InventoryError::Cancelled) {
                record.error = Some(InventoryError::Cancelled);
                return;
            }
            warn!(
                "[scanner] Failed to collect storage info from {}: {err}",
                record.host
            );
        }

        // Power data is optional on many chassis
        if let Err(err) = self.collect_power(cancel, client, record).await {
            if err.is(&InventoryError::Cancelled) {
                record.error = Some(InventoryError::Cancelled);
                return;
            }
            debug!(
                "[scanner] Failed to collect power info from {}: {err}",
                record.host
            );
        }
    }

    async fn collect_system(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) -> Result<(), InventoryError> {
        let system: System = client
            .get(cancel, defaults::REDFISH_SYSTEM_PATH)
            .await
            .map_err(|err| InventoryError::collection(&record.host, "system", err))?;

        record.model = system.model;
        record.manufacturer = system.manufacturer;
        record.serial_number = system.serial_number;
        record.service_tag = system.sku;
        record.bios_version = system.bios_version;
        record.hostname = system.host_name;
        record.power_state = system.power_state;

        record.cpu_count = system.processor_summary.count as usize;
        record.cpu_model = system.processor_summary.model;
        record.memory_total_gib = system.memory_summary.total_system_memory_gib;

        // The chassis-level slot count from the OEM block beats counting
        // collection members later.
        if let Some(dell_system) = system.oem.dell.and_then(|dell| dell.dell_system) {
            if dell_system.max_dimm_slots > 0 {
                record.memory_slots_total = dell_system.max_dimm_slots as usize;
                debug!(
                    "[scanner] OEM data for {}: {} DIMM slots ({} populated)",
                    record.host, dell_system.max_dimm_slots, dell_system.populated_dimm_slots
                );
            }
        }

        info!(
            "[scanner] System info for {}: {} {} (service tag {}, BIOS {}, power {})",
            record.host,
            record.manufacturer,
            record.model,
            record.service_tag,
            record.bios_version,
            record.power_state
        );

        Ok(())
    }

    async fn collect_processors(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) -> Result<(), InventoryError> {
        let collection: Collection = client
            .get(cancel, defaults::REDFISH_PROCESSORS_PATH)
            .await
            .map_err(|err| InventoryError::collection(&record.host, "processors", err))?;

        let mut cpus = Vec::new();
        let mut gpus = Vec::new();

        for member in &collection.members {
            let processor: Processor = match client.get(cancel, &member.odata_id).await {
                Ok(result) => result,
                Err(err) => {
                    if err.is(&InventoryError::Cancelled) {
                        return Err(InventoryError::collection(&record.host, "processors", err));
                    }
                    warn!(
                        "[scanner] Failed to get processor {} from {}: {err}",
                        member.odata_id, record.host
                    );
                    continue;
                }
            };

            if !processor.is_installed() {
                continue;
            }

            if processor.is_gpu() {
                let gpu = build_gpu_info(&processor);
                debug!(
                    "[scanner] GPU on {}: {} {} ({} MiB {})",
                    record.host, gpu.slot, gpu.model, gpu.memory_mib, gpu.memory_type
                );
                gpus.push(gpu);
            } else {
                let brand = if !processor.manufacturer.is_empty() && !processor.model.is_empty() {
                    format!("{} {}", processor.manufacturer, processor.model)
                } else {
                    processor.model.clone()
                };
                cpus.push(CpuInfo {
                    socket: processor.socket,
                    model: processor.model,
                    manufacturer: processor.manufacturer,
                    brand,
                    cores: processor.total_cores,
                    threads: processor.total_threads,
                    max_speed_mhz: processor.max_speed_mhz,
                    operating_speed_mhz: processor.operating_speed_mhz,
                    architecture: processor.processor_architecture,
                    instruction_set: processor.instruction_set,
                    health: processor.status.health,
                });
            }
        }

        record.gpu_count = gpus.len();
        record.gpus = gpus;

        if !cpus.is_empty() {
            record.cpu_count = cpus.len();
            // The summary sometimes lacks a model where the per-socket
            // resources carry one.
            if record.cpu_model.is_empty() && !cpus[0].model.is_empty() {
                record.cpu_model = cpus[0].model.clone();
            }
        }
        record.cpus = cpus;

        debug!(
            "[scanner] Processors on {}: {} CPUs, {} GPUs",
            record.host, record.cpu_count, record.gpu_count
        );

        Ok(())
    }

    async fn collect_memory(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) -> Result<(), InventoryError> {
        let collection: Collection = client
            .get(cancel, defaults::REDFISH_MEMORY_PATH)
            .await
            .map_err(|err| InventoryError::collection(&record.host, "memory", err))?;

        let mut modules = Vec::new();
        let mut total_mib: u64 = 0;
        let mut slots_used = 0;

        for member in &collection.members {
            let memory: Memory = match client.get(cancel, &member.odata_id).await {
                Ok(result) => result,
                Err(err) => {
                    if err.is(&InventoryError::Cancelled) {
                        return Err(InventoryError::collection(&record.host, "memory", err));
                    }
                    warn!(
                        "[scanner] Failed to get memory module {} from {}: {err}",
                        member.odata_id, record.host
                    );
                    continue;
                }
            };

            let slot = if memory.device_locator.is_empty() {
                memory.id.clone()
            } else {
                memory.device_locator.clone()
            };

            let module = MemoryInfo {
                slot,
                capacity_mib: memory.capacity_mib,
                memory_type: memory.memory_device_type,
                technology: memory.memory_type,
                base_module_type: memory.base_module_type,
                speed_mhz: memory.operating_speed_mhz,
                manufacturer: memory.manufacturer,
                part_number: memory.part_number,
                serial_number: memory.serial_number,
                rank_count: memory.rank_count,
                data_width_bits: memory.data_width_bits,
                state: MemoryState::from(memory.status.state),
                health: memory.status.health,
            };

            if module.is_populated() {
                slots_used += 1;
                total_mib += module.capacity_mib;
            }

            modules.push(module);
        }

        record.memory_slots_used = slots_used;
        if record.memory_slots_total == 0 {
            record.memory_slots_total = modules.len();
        }
        record.memory_slots_free = record.memory_slots_total.saturating_sub(slots_used);
        record.memory = modules;

        // Prefer the per-DIMM aggregate when the summary undercounts.
        if total_mib > 0 {
            let calculated_gib = total_mib as f64 / 1024.0;
            if record.memory_total_gib == 0.0 || calculated_gib > record.memory_total_gib {
                record.memory_total_gib = calculated_gib;
            }
        }

        debug!(
            "[scanner] Memory on {}: {:.0} GiB, slots {}/{} used",
            record.host, record.memory_total_gib, record.memory_slots_used, record.memory_slots_total
        );

        Ok(())
    }

    async fn collect_storage(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) -> Result<(), InventoryError> {
        let collection: Collection = client
            .get(cancel, defaults::REDFISH_STORAGE_PATH)
            .await
            .map_err(|err| InventoryError::collection(&record.host, "storage", err))?;

        let mut drives = Vec::new();
        let mut total_bytes: i64 = 0;

        for member in &collection.members {
            let storage: Storage = match client.get(cancel, &member.odata_id).await {
                Ok(result) => result,
                Err(err) => {
                    if err.is(&InventoryError::Cancelled) {
                        return Err(InventoryError::collection(&record.host, "storage", err));
                    }
                    warn!(
                        "[scanner] Failed to get storage controller {} from {}: {err}",
                        member.odata_id, record.host
                    );
                    continue;
                }
            };

            for link in &storage.drives {
                let drive: Drive = match client.get(cancel, &link.odata_id).await {
                    Ok(result) => result,
                    Err(err) => {
                        if err.is(&InventoryError::Cancelled) {
                            return Err(InventoryError::collection(&record.host, "storage", err));
                        }
                        warn!(
                            "[scanner] Failed to get drive {} from {}: {err}",
                            link.odata_id, record.host
                        );
                        continue;
                    }
                };

                total_bytes += drive.capacity_bytes;
                drives.push(DriveInfo {
                    name: drive.name,
                    model: drive.model,
                    manufacturer: drive.manufacturer,
                    serial_number: drive.serial_number,
                    capacity_gb: drive.capacity_bytes as f64 / 1024.0 / 1024.0 / 1024.0,
                    media_type: drive.media_type,
                    protocol: drive.protocol,
                    life_left_pct: drive.predicted_media_life_left_percent,
                    health: drive.status.health,
                });
            }
        }

        record.drive_count = drives.len();
        record.drives = drives;
        if total_bytes > 0 {
            record.storage_total_tb = total_bytes as f64 / 1024.0 / 1024.0 / 1024.0 / 1024.0;
        }

        debug!(
            "[scanner] Storage on {}: {} drives, {:.2} TB",
            record.host, record.drive_count, record.storage_total_tb
        );

        Ok(())
    }

    async fn collect_power(
        &self,
        cancel: &CancellationToken,
        client: &RedfishClient,
        record: &mut HostRecord,
    ) -> Result<(), InventoryError> {
        let power: Power = client
            .get(cancel, defaults::REDFISH_POWER_PATH)
            .await
            .map_err(|err| InventoryError::collection(&record.host, "power", err))?;

        if let Some(control) = power.power_control.first() {
            if control.power_consumed_watts > 0.0 {
                record.power_consumed_watts = control.power_consumed_watts.round() as u32;
            }
            if control.power_metrics.max_consumed_watts > 0.0 {
                record.power_peak_watts = control.power_metrics.max_consumed_watts.round() as u32;
            }
            debug!(
                "[scanner] Power on {}: {} W now, {} W peak",
                record.host, record.power_consumed_watts, record.power_peak_watts
            );
        }

        Ok(())
    }
}

/// Build a `GpuInfo` from a processor entry classified as a GPU. VRAM is
/// the sum over the inline memory banks; a GPU can report several.
fn build_gpu_info(processor: &Processor) -> GpuInfo {
    let slot = if processor.socket.is_empty() {
        processor.name.clone()
    } else {
        processor.socket.clone()
    };

    let mut gpu = GpuInfo {
        slot,
        model: processor.model.clone(),
        manufacturer: processor.manufacturer.clone(),
        memory_mib: 0,
        memory_type: String::new(),
        health: processor.status.health.clone(),
    };

    for bank in &processor.processor_memory {
        if bank.capacity_mib > 0 {
            gpu.memory_mib += bank.capacity_mib;
            if gpu.memory_type.is_empty() {
                gpu.memory_type = bank.memory_type.clone();
            }
        }
    }

    gpu
}
