//! NetBox (asset system) client: device lookup by asset tag with serial
//! fallback, and idempotent custom-field updates per device.

use crate::aggregate::normalize_storage_summary;
use crate::config::NetboxConfig;
use crate::defaults;
use chrono::SecondsFormat;
use common::error::InventoryError;
use common::hardware::{GpuInfo, HostRecord};
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio_util::sync::CancellationToken;

/// NetBox custom-field names. Deployments rename these to match their
/// own field definitions.
#[derive(Debug, Clone)]
pub struct FieldNames {
    pub cpu_count: String,
    pub cpu_model: String,
    pub cpu_cores: String,
    pub ram_total_gb: String,
    pub ram_slots_total: String,
    pub ram_slots_used: String,
    pub ram_slots_free: String,
    pub ram_type: String,
    pub ram_speed_mhz: String,
    pub disk_count: String,
    pub storage_summary: String,
    pub storage_total_tb: String,
    pub bios_version: String,
    pub power_state: String,
    pub power_consumed_watts: String,
    pub power_peak_watts: String,
    pub last_inventory: String,
    pub gpu_count: String,
    pub gpu_model: String,
    pub gpu_memory_gb: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames {
            cpu_count: defaults::FIELD_CPU_COUNT.to_string(),
            cpu_model: defaults::FIELD_CPU_MODEL.to_string(),
            cpu_cores: defaults::FIELD_CPU_CORES.to_string(),
            ram_total_gb: defaults::FIELD_RAM_TOTAL_GB.to_string(),
            ram_slots_total: defaults::FIELD_RAM_SLOTS_TOTAL.to_string(),
            ram_slots_used: defaults::FIELD_RAM_SLOTS_USED.to_string(),
            ram_slots_free: defaults::FIELD_RAM_SLOTS_FREE.to_string(),
            ram_type: defaults::FIELD_RAM_TYPE.to_string(),
            ram_speed_mhz: defaults::FIELD_RAM_SPEED_MHZ.to_string(),
            disk_count: defaults::FIELD_DISK_COUNT.to_string(),
            storage_summary: defaults::FIELD_STORAGE_SUMMARY.to_string(),
            storage_total_tb: defaults::FIELD_STORAGE_TOTAL_TB.to_string(),
            bios_version: defaults::FIELD_BIOS_VERSION.to_string(),
            power_state: defaults::FIELD_POWER_STATE.to_string(),
            power_consumed_watts: defaults::FIELD_POWER_CONSUMED_WATTS.to_string(),
            power_peak_watts: defaults::FIELD_POWER_PEAK_WATTS.to_string(),
            last_inventory: defaults::FIELD_LAST_INVENTORY.to_string(),
            gpu_count: defaults::FIELD_GPU_COUNT.to_string(),
            gpu_model: defaults::FIELD_GPU_MODEL.to_string(),
            gpu_memory_gb: defaults::FIELD_GPU_MEMORY_GB.to_string(),
        }
    }
}

/// A device record as returned by the NetBox API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: u64,
    pub url: String,
    pub name: Option<String>,
    pub serial: Option<String>,
    pub asset_tag: Option<String>,
    pub custom_fields: Value,
}

/// A paginated device listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceList {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Device>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NetboxStatus {
    #[serde(rename = "django-version")]
    django_version: String,
}

/// Outcome of syncing one host.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncResult {
    pub host: String,
    pub success: bool,
    pub error: Option<String>,
}

pub struct NetboxClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    field_names: FieldNames,
}

impl NetboxClient {
    pub fn new(config: &NetboxConfig) -> Result<Self, InventoryError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("rackscan/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure_tls);

        if !config.ca_cert_pem.is_empty() {
            match reqwest::Certificate::from_pem(config.ca_cert_pem.as_bytes()) {
                Ok(certificate) => {
                    debug!("[netbox] Custom CA certificate loaded");
                    builder = builder.add_root_certificate(certificate);
                }
                Err(err) => {
                    warn!("[netbox] Failed to parse CA certificate, using system roots: {err:?}");
                }
            }
        }

        let http = builder.build().map_err(|err| {
            InventoryError::config("netbox", &format!("failed to build HTTP client: {err}"))
        })?;

        Ok(NetboxClient {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
            field_names: FieldNames::default(),
        })
    }

    pub fn with_field_names(mut self, field_names: FieldNames) -> Self {
        self.field_names = field_names;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue a request with auth headers and map the response through the
    /// shared status classification. Returns the raw body.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        request: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<Vec<u8>, InventoryError> {
        let request = request
            .header("authorization", format!("Token {}", self.token))
            .header("accept", "application/json");

        let send_result = tokio::select! {
            _ = cancel.cancelled() => return Err(InventoryError::Cancelled),
            result = request.send() => result,
        };

        let response = match send_result {
            Ok(result) => result,
            Err(err) => {
                error!("[netbox] Request to {path} failed: {err:?}");
                if err.is_timeout() {
                    return Err(InventoryError::Timeout);
                }
                if err.is_connect() {
                    return Err(InventoryError::ConnectionFailed);
                }
                return Err(InventoryError::redfish(
                    &self.base_url,
                    path,
                    0,
                    "",
                    &err.to_string(),
                ));
            }
        };

        let status = response.status();
        debug!("[netbox] {path} completed with status {status}");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            error!("[netbox] Authentication rejected ({status})");
            return Err(InventoryError::AuthFailed);
        }

        let body_result = tokio::select! {
            _ = cancel.cancelled() => return Err(InventoryError::Cancelled),
            result = response.bytes() => result,
        };
        let body = match body_result {
            Ok(result) => result,
            Err(err) => {
                error!("[netbox] Failed to read response from {path}: {err:?}");
                return Err(InventoryError::InvalidResponse);
            }
        };

        if status == StatusCode::NOT_FOUND {
            return Err(InventoryError::NotFound);
        }
        if status.as_u16() >= 400 {
            let body_text = String::from_utf8_lossy(&body);
            error!("[netbox] API error from {path}: {status} {body_text}");
            return Err(InventoryError::redfish(
                &self.base_url,
                path,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
                &body_text,
            ));
        }

        Ok(body.to_vec())
    }

    /// Probe the API status endpoint to verify reachability and the token.
    pub async fn test_connection(&self, cancel: &CancellationToken) -> Result<(), InventoryError> {
        debug!("[netbox] Testing connection to {}", self.base_url);

        let request = self.http.get(self.url(defaults::NETBOX_STATUS_PATH));
        let body = self
            .execute(cancel, request, defaults::NETBOX_STATUS_PATH)
            .await?;

        let status: NetboxStatus = match serde_json::from_slice(&body) {
            Ok(result) => result,
            Err(err) => {
                error!("[netbox] Failed to decode status response: {err:?}");
                return Err(InventoryError::InvalidResponse);
            }
        };

        info!(
            "[netbox] Connection test successful (django {})",
            status.django_version
        );
        Ok(())
    }

    async fn query_devices(
        &self,
        cancel: &CancellationToken,
        param: &str,
        value: &str,
    ) -> Result<Option<Device>, InventoryError> {
        let request = self
            .http
            .get(self.url(defaults::NETBOX_DEVICES_PATH))
            .query(&[(param, value)]);
        let body = self
            .execute(cancel, request, defaults::NETBOX_DEVICES_PATH)
            .await?;

        let list: DeviceList = match serde_json::from_slice(&body) {
            Ok(result) => result,
            Err(err) => {
                error!("[netbox] Failed to decode device list: {err:?}");
                return Err(InventoryError::InvalidResponse);
            }
        };

        if list.count == 0 || list.results.is_empty() {
            debug!("[netbox] No device with {param}={value}");
            return Ok(None);
        }

        let device = list.results.into_iter().next();
        if let Some(found) = &device {
            debug!(
                "[netbox] Device found with {param}={value}: id {} ({})",
                found.id,
                found.name.as_deref().unwrap_or("-")
            );
        }
        Ok(device)
    }

    /// Look up a device by serial number.
    pub async fn find_device_by_serial(
        &self,
        cancel: &CancellationToken,
        serial: &str,
    ) -> Result<Option<Device>, InventoryError> {
        self.query_devices(cancel, "serial", serial).await
    }

    /// Look up a device by service tag: asset tag first, then the tag as
    /// a serial number.
    pub async fn find_device_by_service_tag(
        &self,
        cancel: &CancellationToken,
        service_tag: &str,
    ) -> Result<Option<Device>, InventoryError> {
        if let Some(device) = self.query_devices(cancel, "asset_tag", service_tag).await? {
            return Ok(Some(device));
        }
        self.find_device_by_serial(cancel, service_tag).await
    }

    /// Two-step identity lookup for a scanned host: service tag (with its
    /// internal serial fallback), then the chassis serial number.
    async fn find_device(
        &self,
        cancel: &CancellationToken,
        record: &HostRecord,
    ) -> Result<Option<Device>, InventoryError> {
        if !record.service_tag.is_empty() {
            if let Some(device) = self
                .find_device_by_service_tag(cancel, &record.service_tag)
                .await?
            {
                return Ok(Some(device));
            }
        }

        if !record.serial_number.is_empty() {
            return self
                .find_device_by_serial(cancel, &record.serial_number)
                .await;
        }

        warn!(
            "[netbox] No service tag or serial number available for {}",
            record.host
        );
        Ok(None)
    }

    /// Partial update of a device's custom fields.
    pub async fn update_device_custom_fields(
        &self,
        cancel: &CancellationToken,
        device_id: u64,
        fields: Map<String, Value>,
    ) -> Result<(), InventoryError> {
        let path = format!("{}{}/", defaults::NETBOX_DEVICES_PATH, device_id);
        let body = json!({ "custom_fields": fields });

        debug!(
            "[netbox] PATCH {path} with {} custom fields",
            body["custom_fields"].as_object().map_or(0, |map| map.len())
        );

        let request = self.http.patch(self.url(&path)).json(&body);
        self.execute(cancel, request, &path).await?;

        info!("[netbox] Updated custom fields on device {device_id}");
        Ok(())
    }

    /// Sync one host's inventory into its NetBox device record.
    pub async fn sync_one(
        &self,
        cancel: &CancellationToken,
        record: &HostRecord,
    ) -> Result<(), InventoryError> {
        info!(
            "[netbox] Syncing {} (service_tag={}, serial={})",
            record.host, record.service_tag, record.serial_number
        );

        let device = match self.find_device(cancel, record).await? {
            Some(result) => result,
            None => {
                warn!(
                    "[netbox] Device not found for {} (service_tag={}, serial={})",
                    record.host, record.service_tag, record.serial_number
                );
                return Err(InventoryError::DeviceNotFound {
                    service_tag: record.service_tag.clone(),
                    serial: record.serial_number.clone(),
                });
            }
        };

        let fields = self.build_custom_fields(record);
        self.update_device_custom_fields(cancel, device.id, fields)
            .await?;

        info!("[netbox] Synced {} to device {}", record.host, device.id);
        Ok(())
    }

    /// Sync every record sequentially. Never short-circuits; hosts whose
    /// collection failed are skipped with an explanatory result.
    pub async fn sync_all(
        &self,
        cancel: &CancellationToken,
        records: &[HostRecord],
    ) -> Vec<SyncResult> {
        info!("[netbox] Syncing {} hosts", records.len());

        let mut results = Vec::with_capacity(records.len());
        for record in records {
            if !record.is_valid() {
                let reason = record
                    .error
                    .as_ref()
                    .map(|err| err.to_string())
                    .unwrap_or_else(|| String::from("unknown"));
                results.push(SyncResult {
                    host: record.host.clone(),
                    success: false,
                    error: Some(format!("skipped: collection failed with error: {reason}")),
                });
                continue;
            }

            match self.sync_one(cancel, record).await {
                Ok(()) => results.push(SyncResult {
                    host: record.host.clone(),
                    success: true,
                    error: None,
                }),
                Err(err) => results.push(SyncResult {
                    host: record.host.clone(),
                    success: false,
                    error: Some(err.to_string()),
                }),
            }
        }

        let successful = results.iter().filter(|result| result.success).count();
        info!(
            "[netbox] Sync completed: {successful}/{} successful",
            results.len()
        );

        results
    }

    /// Build the custom-field payload for one host. Power and GPU-memory
    /// integers are omitted when the underlying datum is absent; every
    /// other configured field is always emitted so stale values get
    /// cleared.
    fn build_custom_fields(&self, record: &HostRecord) -> Map<String, Value> {
        let names = &self.field_names;
        let mut fields = Map::new();

        fields.insert(names.cpu_count.clone(), json!(record.cpu_count));
        fields.insert(names.cpu_model.clone(), json!(record.cpu_model));
        fields.insert(
            names.ram_total_gb.clone(),
            json!(record.memory_total_gib as u64),
        );
        fields.insert(
            names.ram_slots_total.clone(),
            json!(record.memory_slots_total),
        );
        fields.insert(names.ram_slots_used.clone(), json!(record.memory_slots_used));
        fields.insert(names.ram_slots_free.clone(), json!(record.memory_slots_free));
        fields.insert(
            names.storage_total_tb.clone(),
            json!(format!("{:.2}", record.storage_total_tb)),
        );
        fields.insert(names.bios_version.clone(), json!(record.bios_version));
        fields.insert(
            names.power_state.clone(),
            json!(record.power_state.as_str()),
        );
        fields.insert(
            names.last_inventory.clone(),
            json!(record
                .collected_at
                .to_rfc3339_opts(SecondsFormat::Secs, true)),
        );

        if let Some(cpu) = record.cpus.first() {
            fields.insert(names.cpu_cores.clone(), json!(cpu.cores));
        }

        for module in &record.memory {
            if module.is_populated() {
                fields.insert(names.ram_type.clone(), json!(module.memory_type));
                fields.insert(names.ram_speed_mhz.clone(), json!(module.speed_mhz));
                break;
            }
        }

        fields.insert(names.disk_count.clone(), json!(record.drive_count));
        if !record.drives.is_empty() {
            fields.insert(
                names.storage_summary.clone(),
                json!(normalize_storage_summary(&record.drives)),
            );
        }

        if record.power_consumed_watts > 0 {
            fields.insert(
                names.power_consumed_watts.clone(),
                json!(record.power_consumed_watts),
            );
        }
        if record.power_peak_watts > 0 {
            fields.insert(names.power_peak_watts.clone(), json!(record.power_peak_watts));
        }

        fields.insert(names.gpu_count.clone(), json!(record.gpu_count));
        if !record.gpus.is_empty() {
            fields.insert(names.gpu_model.clone(), json!(build_gpu_summary(&record.gpus)));
            let total_vram_mib: u64 = record.gpus.iter().map(|gpu| gpu.memory_mib).sum();
            if total_vram_mib > 0 {
                fields.insert(names.gpu_memory_gb.clone(), json!(total_vram_mib / 1024));
            }
        }

        fields
    }
}

/// Compact GPU summary grouped by model and VRAM, in first-seen order.
/// Example: "4× NVIDIA A100 (80 GB)" or "2× NVIDIA H100, 2× NVIDIA A30"
fn build_gpu_summary(gpus: &[GpuInfo]) -> String {
    let mut order: Vec<(String, u64)> = Vec::new();
    let mut counts: std::collections::HashMap<(String, u64), usize> =
        std::collections::HashMap::new();

    for gpu in gpus {
        let key = (gpu.model.clone(), gpu.memory_gib() as u64);
        if !counts.contains_key(&key) {
            order.push(key.clone());
        }
        *counts.entry(key).or_insert(0) += 1;
    }

    let parts: Vec<String> = order
        .iter()
        .map(|key| {
            let mut entry = format!("{}× {}", counts[key], key.0);
            if key.1 > 0 {
                entry.push_str(&format!(" ({} GB)", key.1));
            }
            entry
        })
        .collect();

    parts.join(", ")
}

#[cfg(test)]
mod tests {
    use super::{build_gpu_summary, NetboxClient, SyncResult};
    use crate::config::NetboxConfig;
    use common::error::InventoryError;
    use common::hardware::{
        CpuInfo, DriveInfo, GpuInfo, HostRecord, MediaType, MemoryInfo, MemoryState, PowerState,
    };
    use httpmock::{Method::GET, Method::PATCH, MockServer};
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    fn client_for(server: &MockServer) -> NetboxClient {
        NetboxClient::new(&NetboxConfig {
            url: server.base_url(),
            token: String::from("abc123"),
            ..Default::default()
        })
        .unwrap()
    }

    fn valid_record() -> HostRecord {
        let mut record = HostRecord::new("10.0.0.5", None);
        record.model = String::from("PowerEdge R750");
        record.manufacturer = String::from("Dell Inc.");
        record.service_tag = String::from("SVCTAG");
        record.serial_number = String::from("ABC123");
        record.bios_version = String::from("2.10.2");
        record.power_state = PowerState::On;
        record.cpu_count = 2;
        record.cpu_model = String::from("Intel Xeon Gold 6342");
        record.cpus = vec![CpuInfo {
            cores: 24,
            ..Default::default()
        }];
        record.memory = vec![MemoryInfo {
            capacity_mib: 262144,
            memory_type: String::from("DDR4"),
            speed_mhz: 3200,
            state: MemoryState::Enabled,
            ..Default::default()
        }];
        record.memory_total_gib = 512.0;
        record.memory_slots_total = 4;
        record.memory_slots_used = 2;
        record.memory_slots_free = 2;
        record.drives = vec![DriveInfo {
            capacity_gb: 894.25,
            media_type: MediaType::Ssd,
            ..Default::default()
        }];
        record.drive_count = 1;
        record.storage_total_tb = 0.87;
        record.power_consumed_watts = 420;
        record.power_peak_watts = 580;
        record
    }

    #[tokio::test]
    async fn test_connection_ok() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/status/")
                .header("authorization", "Token abc123")
                .header("accept", "application/json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"django-version": "4.2.9"}));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        client.test_connection(&cancel).await.unwrap();
        mock.assert();
    }

    #[tokio::test]
    #[should_panic(expected = "AuthFailed")]
    async fn test_connection_bad_token() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/status/");
            then.status(403).body("Invalid token");
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        client.test_connection(&cancel).await.unwrap();
    }

    #[tokio::test]
    #[should_panic(expected = "InvalidResponse")]
    async fn test_connection_bad_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/status/");
            then.status(200).body("not json");
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        client.test_connection(&cancel).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_device_by_serial() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("serial", "ABC123");
            then.status(200).json_body(json!({
                "count": 1,
                "next": null,
                "previous": null,
                "results": [
                    {"id": 42, "url": "/api/dcim/devices/42/", "name": "compute-05",
                     "serial": "ABC123", "asset_tag": null, "custom_fields": {}}
                ]
            }));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let device = client
            .find_device_by_serial(&cancel, "ABC123")
            .await
            .unwrap()
            .unwrap();
        mock.assert();

        assert_eq!(device.id, 42);
        assert_eq!(device.name.as_deref(), Some("compute-05"));
    }

    #[tokio::test]
    async fn test_find_device_by_serial_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/dcim/devices/");
            then.status(200)
                .json_body(json!({"count": 0, "next": null, "previous": null, "results": []}));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let device = client.find_device_by_serial(&cancel, "NOPE").await.unwrap();
        assert!(device.is_none());
    }

    #[tokio::test]
    async fn test_find_by_service_tag_falls_back_to_serial() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("asset_tag", "SVCTAG");
            then.status(200)
                .json_body(json!({"count": 0, "results": []}));
        });
        let serial_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("serial", "SVCTAG");
            then.status(200).json_body(json!({
                "count": 1,
                "results": [{"id": 7, "name": "by-serial", "serial": "SVCTAG"}]
            }));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let device = client
            .find_device_by_service_tag(&cancel, "SVCTAG")
            .await
            .unwrap()
            .unwrap();
        serial_mock.assert();
        assert_eq!(device.id, 7);
    }

    #[tokio::test]
    async fn test_sync_one_serial_fallback_and_patch() {
        let server = MockServer::start();
        // Asset tag lookup misses
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("asset_tag", "SVCTAG");
            then.status(200).json_body(json!({"count": 0, "results": []}));
        });
        // Service tag as serial misses too
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("serial", "SVCTAG");
            then.status(200).json_body(json!({"count": 0, "results": []}));
        });
        // Chassis serial hits
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("serial", "ABC123");
            then.status(200).json_body(json!({
                "count": 1,
                "results": [{"id": 42, "name": "compute-05", "serial": "ABC123"}]
            }));
        });
        let patch_mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/api/dcim/devices/42/")
                .header("authorization", "Token abc123")
                .header("content-type", "application/json")
                .body_contains("hw_cpu_count")
                .body_contains("hw_ram_total_gb")
                .body_contains("hw_storage_summary")
                .body_contains("hw_bios_version")
                .body_contains("hw_last_inventory");
            then.status(200).json_body(json!({"id": 42}));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        client.sync_one(&cancel, &valid_record()).await.unwrap();
        patch_mock.assert();
    }

    #[tokio::test]
    async fn test_sync_one_device_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/dcim/devices/");
            then.status(200).json_body(json!({"count": 0, "results": []}));
        });

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let err = client
            .sync_one(&cancel, &valid_record())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            InventoryError::DeviceNotFound {
                service_tag: String::from("SVCTAG"),
                serial: String::from("ABC123"),
            }
        );
        assert_eq!(
            err.to_string(),
            "device not found in asset system (service_tag=SVCTAG, serial=ABC123)"
        );
    }

    #[tokio::test]
    async fn test_sync_all_skips_failed_records() {
        let server = MockServer::start();
        let client = client_for(&server);
        let cancel = CancellationToken::new();

        let records = vec![HostRecord::failed(
            "10.0.0.9",
            None,
            InventoryError::Timeout,
        )];
        let results = client.sync_all(&cancel, &records).await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        let message = results[0].error.as_deref().unwrap();
        assert!(message.starts_with("skipped:"), "got: {message}");
    }

    #[tokio::test]
    async fn test_sync_all_continues_after_failure() {
        let server = MockServer::start();
        // First record: nothing matches anywhere → device not found.
        // Second record: found and patched.
        for (param, value) in [
            ("asset_tag", "SVCTAG"),
            ("serial", "SVCTAG"),
            ("serial", "ABC123"),
        ] {
            server.mock(move |when, then| {
                when.method(GET)
                    .path("/api/dcim/devices/")
                    .query_param(param, value);
                then.status(200).json_body(json!({"count": 0, "results": []}));
            });
        }
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/dcim/devices/")
                .query_param("asset_tag", "TAG2");
            then.status(200).json_body(json!({
                "count": 1,
                "results": [{"id": 9, "name": "second", "serial": "DEF456"}]
            }));
        });
        server.mock(|when, then| {
            when.method(PATCH).path("/api/dcim/devices/9/");
            then.status(200).json_body(json!({"id": 9}));
        });

        let mut first = valid_record();
        first.host = String::from("10.0.0.5");
        let mut second = valid_record();
        second.host = String::from("10.0.0.6");
        second.service_tag = String::from("TAG2");
        second.serial_number = String::from("DEF456");

        let client = client_for(&server);
        let cancel = CancellationToken::new();
        let results = client.sync_all(&cancel, &[first, second]).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("device not found"));
        assert!(results[1].success, "second sync failed: {:?}", results[1].error);
    }

    #[test]
    fn test_build_custom_fields_payload() {
        let server = MockServer::start();
        let client = client_for(&server);
        let record = valid_record();

        let fields = client.build_custom_fields(&record);

        assert_eq!(fields["hw_cpu_count"], json!(2));
        assert_eq!(fields["hw_cpu_model"], json!("Intel Xeon Gold 6342"));
        assert_eq!(fields["hw_cpu_cores"], json!(24));
        assert_eq!(fields["hw_ram_total_gb"], json!(512));
        assert_eq!(fields["hw_ram_slots_total"], json!(4));
        assert_eq!(fields["hw_ram_slots_used"], json!(2));
        assert_eq!(fields["hw_ram_slots_free"], json!(2));
        assert_eq!(fields["hw_memory_type"], json!("DDR4"));
        assert_eq!(fields["hw_memory_speed_mhz"], json!(3200));
        assert_eq!(fields["hw_disk_count"], json!(1));
        assert_eq!(fields["hw_storage_summary"], json!("1×894GB SSD"));
        assert_eq!(fields["hw_storage_total_tb"], json!("0.87"));
        assert_eq!(fields["hw_bios_version"], json!("2.10.2"));
        assert_eq!(fields["hw_power_state"], json!("On"));
        assert_eq!(fields["hw_power_consumed_watts"], json!(420));
        assert_eq!(fields["hw_power_peak_watts"], json!(580));
        assert_eq!(fields["hw_gpu_count"], json!(0));
        // Timestamp is RFC 3339 UTC with a trailing Z
        let timestamp = fields["hw_last_inventory"].as_str().unwrap();
        assert!(timestamp.ends_with('Z'), "got: {timestamp}");
    }

    #[test]
    fn test_build_custom_fields_omits_absent_power() {
        let server = MockServer::start();
        let client = client_for(&server);
        let mut record = valid_record();
        record.power_consumed_watts = 0;
        record.power_peak_watts = 0;

        let fields = client.build_custom_fields(&record);
        assert!(!fields.contains_key("hw_power_consumed_watts"));
        assert!(!fields.contains_key("hw_power_peak_watts"));
        // Always-emitted fields stay, even at zero
        assert_eq!(fields["hw_gpu_count"], json!(0));
    }

    #[test]
    fn test_build_custom_fields_gpu_summary() {
        let server = MockServer::start();
        let client = client_for(&server);
        let mut record = valid_record();
        record.gpus = vec![
            GpuInfo {
                model: String::from("NVIDIA A100"),
                memory_mib: 81920,
                ..Default::default()
            },
            GpuInfo {
                model: String::from("NVIDIA A100"),
                memory_mib: 81920,
                ..Default::default()
            },
        ];
        record.gpu_count = 2;

        let fields = client.build_custom_fields(&record);
        assert_eq!(fields["hw_gpu_count"], json!(2));
        assert_eq!(fields["hw_gpu_model"], json!("2× NVIDIA A100 (80 GB)"));
        assert_eq!(fields["hw_gpu_memory_gb"], json!(160));
    }

    #[test]
    fn test_gpu_summary_mixed_models() {
        let gpus = vec![
            GpuInfo {
                model: String::from("NVIDIA H100"),
                memory_mib: 81920,
                ..Default::default()
            },
            GpuInfo {
                model: String::from("NVIDIA A30"),
                memory_mib: 24576,
                ..Default::default()
            },
            GpuInfo {
                model: String::from("NVIDIA H100"),
                memory_mib: 81920,
                ..Default::default()
            },
        ];
        assert_eq!(
            build_gpu_summary(&gpus),
            "2× NVIDIA H100 (80 GB), 1× NVIDIA A30 (24 GB)"
        );
    }

    #[test]
    fn test_gpu_summary_without_vram() {
        let gpus = vec![GpuInfo {
            model: String::from("Matrox G200"),
            memory_mib: 0,
            ..Default::default()
        }];
        assert_eq!(build_gpu_summary(&gpus), "1× Matrox G200");
    }

    #[test]
    fn test_sync_result_serialises() {
        let result = SyncResult {
            host: String::from("10.0.0.5"),
            success: true,
            error: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["host"], "10.0.0.5");
        assert_eq!(value["success"], true);
    }
}
