use crate::domain::model::FlattenedRecord;
use crate::utils::error::{EtlError, Result};

/// Output columns, in order.
pub const COLUMNS: [&str; 10] = [
    "tenant_id",
    "parent_key",
    "parent_status",
    "child_name",
    "child_kind",
    "child_value",
    "notes",
    "proxy_flag",
    "tls_mode",
    "parent_ns_info",
];

fn to_fields(row: &FlattenedRecord) -> [&str; 10] {
    [
        row.tenant_id.as_str(),
        row.parent_key.as_str(),
        row.parent_status.as_str(),
        row.child_name.as_str(),
        row.child_kind.as_str(),
        row.child_value.as_str(),
        row.notes.as_str(),
        row.proxy_flag.as_str(),
        row.tls_mode.as_str(),
        row.parent_ns_info.as_str(),
    ]
}

/// Renders the header plus one line per row. With no rows the output is the
/// header alone.
pub fn render_csv(rows: &[FlattenedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    for row in rows {
        writer.write_record(to_fields(row))?;
    }

    writer
        .into_inner()
        .map_err(|e| EtlError::IoError(e.into_error()))
}
