use metapath_core::{MetapathError, MetapathResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Read a walk corpus: one walk per line, tokens separated by whitespace.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected. Blank
/// lines become empty walks, which training later skips.
pub fn read_walks<P: AsRef<Path>>(path: P) -> MetapathResult<Vec<Vec<String>>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let mut walks = Vec::new();
    let mut line = Vec::new();
    let mut tokens = 0usize;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        let text = String::from_utf8_lossy(&line);
        let walk: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        tokens += walk.len();
        walks.push(walk);
    }

    info!(path = %path.display(), walks = walks.len(), tokens, "read walk corpus");
    Ok(walks)
}

/// Read `token,type` rows into a lookup map. No header row.
pub fn read_node_types<P: AsRef<Path>>(path: P) -> MetapathResult<HashMap<String, String>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(e, 0))?;

    let mut types = HashMap::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| csv_error(e, i + 1))?;
        if record.len() != 2 {
            return Err(MetapathError::Format {
                line: i + 1,
                message: format!("expected `token,type`, got {} fields", record.len()),
            });
        }
        types.insert(record[0].to_string(), record[1].to_string());
    }

    info!(path = %path.display(), nodes = types.len(), "read node types");
    Ok(types)
}

fn csv_error(err: csv::Error, line: usize) -> MetapathError {
    let line = err.position().map(|p| p.line() as usize).unwrap_or(line);
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => MetapathError::Io(io),
        _ => MetapathError::Format { line, message },
    }
}
