//! CSV rendering, one row per host.

use common::hardware::HostRecord;
use common::stats::BatchStats;
use csv::WriterBuilder;
use std::io::{self, Write};

fn to_io(err: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

pub fn format(
    writer: &mut impl Write,
    records: &[HostRecord],
    _stats: &BatchStats,
) -> io::Result<()> {
    let mut csv_writer = WriterBuilder::new().from_writer(Vec::new());

    csv_writer.write_record([
        "host",
        "model",
        "manufacturer",
        "service_tag",
        "serial",
        "bios_version",
        "power_state",
        "cpu_count",
        "cpu_model",
        "ram_total_gb",
        "ram_slots_total",
        "ram_slots_used",
        "ram_slots_free",
        "drive_count",
        "storage_total_tb",
        "gpu_count",
        "power_consumed_watts",
        "power_peak_watts",
        "status",
        "error",
    ])
    .map_err(to_io)?;

    for record in records {
        let (status, error) = match &record.error {
            None => ("OK", String::new()),
            Some(err) => ("ERROR", err.to_string()),
        };
        let cpu_count = record.cpu_count.to_string();
        let ram_total = format!("{:.0}", record.memory_total_gib);
        let slots_total = record.memory_slots_total.to_string();
        let slots_used = record.memory_slots_used.to_string();
        let slots_free = record.memory_slots_free.to_string();
        let drive_count = record.drive_count.to_string();
        let storage_total = format!("{:.2}", record.storage_total_tb);
        let gpu_count = record.gpu_count.to_string();
        let power_consumed = record.power_consumed_watts.to_string();
        let power_peak = record.power_peak_watts.to_string();

        csv_writer
            .write_record([
                record.host.as_str(),
                record.model.as_str(),
                record.manufacturer.as_str(),
                record.service_tag.as_str(),
                record.serial_number.as_str(),
                record.bios_version.as_str(),
                record.power_state.as_str(),
                cpu_count.as_str(),
                record.cpu_model.as_str(),
                ram_total.as_str(),
                slots_total.as_str(),
                slots_used.as_str(),
                slots_free.as_str(),
                drive_count.as_str(),
                storage_total.as_str(),
                gpu_count.as_str(),
                power_consumed.as_str(),
                power_peak.as_str(),
                status,
                error.as_str(),
            ])
            .map_err(to_io)?;
    }

    let bytes = csv_writer
        .into_inner()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    writer.write_all(&bytes)
}
