use std::io::BufRead;
use std::path::Path;

use crate::input::InputError;
use crate::input::reader::open_maybe_gz;

pub const GENE_EXPRESSION: &str = "Gene Expression";

#[derive(Debug, Clone)]
pub struct Feature {
    pub id: String,
    pub symbol: String,
    pub feature_type: Option<String>,
}

impl Feature {
    /// v2 files carry no type column and are gene expression only.
    pub fn is_gene_expression(&self) -> bool {
        self.feature_type
            .as_deref()
            .is_none_or(|t| t == GENE_EXPRESSION)
    }
}

pub fn parse_features(path: &Path) -> Result<Vec<Feature>, InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut features = Vec::new();
    let mut line_no = 0usize;
    let mut format_cols: Option<usize> = None;

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < 2 {
            return Err(InputError::Parse(format!(
                "features line {} has <2 columns",
                line_no
            )));
        }
        match format_cols {
            None => format_cols = Some(cols.len()),
            Some(2) if cols.len() >= 3 => {
                tracing::warn!(
                    line = line_no,
                    "features file appears to be v3 even though first line looked v2"
                );
            }
            Some(_) => {}
        }
        let feature_type = cols
            .get(2)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        features.push(Feature {
            id: cols[0].trim().to_string(),
            symbol: cols[1].trim().to_string(),
            feature_type,
        });
    }

    if features.is_empty() {
        return Err(InputError::Parse("features file is empty".to_string()));
    }

    Ok(features)
}
