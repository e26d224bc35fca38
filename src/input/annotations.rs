use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;

/// Published per-cell annotation rows, in file order.
///
/// `raw_id` keeps the publication's identifier untouched; re-keying into the
/// matrix barcode space happens on derived copies during reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationRow {
    pub raw_id: String,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct AnnotationTable {
    pub id_column: String,
    pub label_column: String,
    pub rows: Vec<AnnotationRow>,
}

/// Reads a comma-separated annotation file with a header row.
///
/// The identifier column is `id_column` when present; otherwise the first
/// column is used, which is where R writes row names.
pub fn load_annotations(
    path: &Path,
    id_column: &str,
    label_column: &str,
) -> Result<AnnotationTable, InputError> {
    let reader = open_maybe_gz(path)?;
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv.headers()?.clone();
    if headers.is_empty() {
        return Err(InputError::Parse(format!(
            "annotation file {} has no header",
            path.display()
        )));
    }

    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| InputError::MissingColumn {
            column: label_column.to_string(),
            path: path.to_path_buf(),
        })?;

    let (id_idx, id_name) = match headers.iter().position(|h| h == id_column) {
        Some(idx) => (idx, id_column.to_string()),
        None => {
            tracing::warn!(
                column = id_column,
                fallback = headers.get(0).unwrap_or_default(),
                "annotation id column not found; using first column"
            );
            (0, headers.get(0).unwrap_or_default().to_string())
        }
    };

    let mut rows = Vec::new();
    for (line, record) in csv.records().enumerate() {
        let record = record?;
        let (Some(raw_id), Some(label)) = (record.get(id_idx), record.get(label_idx)) else {
            tracing::warn!(row = line + 1, "annotation row is missing columns; skipping");
            continue;
        };
        if raw_id.is_empty() {
            tracing::warn!(row = line + 1, "annotation row has empty identifier; skipping");
            continue;
        }
        rows.push(AnnotationRow {
            raw_id: raw_id.to_string(),
            label: label.to_string(),
        });
    }

    if rows.is_empty() {
        return Err(InputError::Parse(format!(
            "annotation file {} has no rows",
            path.display()
        )));
    }

    tracing::info!(
        rows = rows.len(),
        id_column = %id_name,
        label_column,
        "loaded published annotations"
    );

    Ok(AnnotationTable {
        id_column: id_name,
        label_column: label_column.to_string(),
        rows,
    })
}
