//! JSON rendering of the raw scan results.

use common::hardware::HostRecord;
use common::stats::BatchStats;
use serde_json::json;
use std::io::{self, Write};

pub fn format(
    writer: &mut impl Write,
    records: &[HostRecord],
    stats: &BatchStats,
) -> io::Result<()> {
    let document = json!({
        "hosts": records,
        "stats": stats,
    });
    serde_json::to_writer_pretty(&mut *writer, &document)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    writeln!(writer)
}

#[cfg(test)]
mod tests {
    use super::format;
    use common::error::InventoryError;
    use common::hardware::HostRecord;
    use common::stats::BatchStats;

    #[test]
    fn test_json_document_shape() {
        let mut ok = HostRecord::new("10.0.0.1", None);
        ok.model = String::from("PowerEdge R440");
        let failed = HostRecord::failed("10.0.0.2", None, InventoryError::AuthFailed);

        let stats = BatchStats {
            total_hosts: 2,
            successful_count: 1,
            failed_count: 1,
            ..Default::default()
        };

        let mut buffer = Vec::new();
        format(&mut buffer, &[ok, failed], &stats).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["hosts"].as_array().unwrap().len(), 2);
        assert_eq!(value["hosts"][0]["model"], "PowerEdge R440");
        assert_eq!(value["hosts"][1]["error"], "authentication failed");
        assert_eq!(value["stats"]["total_hosts"], 2);
    }
}
