use metapath_core::embedding::cosine;
use metapath_core::{EmbeddingTable, MetapathError, MetapathResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write embeddings as text: a `V D` header, then `token v_1 ... v_D` per
/// row in id order.
pub fn write_embeddings<P: AsRef<Path>, S: AsRef<str>>(
    path: P,
    words: &[S],
    table: &EmbeddingTable,
) -> MetapathResult<()> {
    if words.len() != table.rows() {
        return Err(MetapathError::config(format!(
            "{} tokens for {} embedding rows",
            words.len(),
            table.rows()
        )));
    }
    let path = path.as_ref();
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "{} {}", table.rows(), table.dim())?;
    for (word, row) in words.iter().zip(table.iter_rows()) {
        write!(out, "{}", word.as_ref())?;
        for v in row {
            write!(out, " {}", v)?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    info!(path = %path.display(), rows = table.rows(), dim = table.dim(), "wrote embeddings");
    Ok(())
}

/// Embeddings loaded back from the text format.
#[derive(Debug, Clone)]
pub struct Embeddings {
    pub tokens: Vec<String>,
    pub vectors: EmbeddingTable,
    index: HashMap<String, usize>,
}

impl Embeddings {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.vectors.dim()
    }

    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.index.get(token).map(|&i| self.vectors.row(i))
    }

    /// The `n` tokens closest to `token` by cosine similarity.
    pub fn nearest(&self, token: &str, n: usize) -> Vec<(&str, f32)> {
        let Some(&target) = self.index.get(token) else {
            return Vec::new();
        };
        let query = self.vectors.row(target);
        let mut scored: Vec<(&str, f32)> = self
            .tokens
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != target)
            .map(|(i, t)| (t.as_str(), cosine(query, self.vectors.row(i))))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);
        scored
    }
}

fn format_err(line: usize, message: impl Into<String>) -> MetapathError {
    MetapathError::Format { line, message: message.into() }
}

/// Parse a file written by [`write_embeddings`].
pub fn read_embeddings<P: AsRef<Path>>(path: P) -> MetapathResult<Embeddings> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header = lines.next().ok_or_else(|| format_err(1, "missing header"))??;
    let mut fields = header.split_whitespace();
    let mut header_field = |name: &str| -> MetapathResult<usize> {
        fields
            .next()
            .ok_or_else(|| format_err(1, format!("header lacks {}", name)))?
            .parse::<usize>()
            .map_err(|e| format_err(1, format!("bad {}: {}", name, e)))
    };
    let rows = header_field("vocabulary size")?;
    let dim = header_field("dimension")?;

    let mut tokens = Vec::with_capacity(rows);
    let mut data = Vec::with_capacity(rows * dim);
    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut parts = line.split(' ');
        let token = parts.next().unwrap_or_default().to_string();
        let before = data.len();
        for p in parts {
            let v = p
                .parse::<f32>()
                .map_err(|e| format_err(line_no, format!("bad value {:?}: {}", p, e)))?;
            data.push(v);
        }
        if data.len() - before != dim {
            return Err(format_err(
                line_no,
                format!("expected {} values, got {}", dim, data.len() - before),
            ));
        }
        tokens.push(token);
    }
    if tokens.len() != rows {
        return Err(format_err(
            tokens.len() + 2,
            format!("header promises {} rows, found {}", rows, tokens.len()),
        ));
    }

    let vectors = EmbeddingTable::from_vec(data, rows, dim)
        .ok_or_else(|| format_err(1, "row data does not match header"))?;
    let index = tokens.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
    Ok(Embeddings { tokens, vectors, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.embedding");
        let table = EmbeddingTable::uniform(4, 3, 0.5, 9);
        let words = ["a1", "v2", "p3", "a4"];
        write_embeddings(&path, &words, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().next(), Some("4 3"));
        assert_eq!(text.lines().count(), 5);

        let emb = read_embeddings(&path).unwrap();
        assert_eq!(emb.len(), 4);
        assert_eq!(emb.dim(), 3);
        assert_eq!(emb.tokens, words);
        for (i, w) in words.iter().enumerate() {
            for (a, b) in emb.get(w).unwrap().iter().zip(table.row(i)) {
                assert_relative_eq!(*a, *b, epsilon = 1e-7);
            }
        }
    }

    #[test]
    fn test_row_count_mismatch_rejected() {
        let table = EmbeddingTable::zeros(2, 2);
        let dir = tempfile::tempdir().unwrap();
        let err = write_embeddings(dir.path().join("x"), &["only"], &table).unwrap_err();
        assert!(matches!(err, MetapathError::Configuration(_)));
    }

    #[test]
    fn test_unwritable_destination_is_io_error() {
        let table = EmbeddingTable::zeros(1, 2);
        let err = write_embeddings("/nonexistent-dir/sub/out.embedding", &["a"], &table).unwrap_err();
        assert!(matches!(err, MetapathError::Io(_)));
    }

    #[test]
    fn test_malformed_rows() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "2 2\na 1 2\nb 3\n").unwrap();
        let err = read_embeddings(f.path()).unwrap_err();
        assert!(matches!(err, MetapathError::Format { line: 3, .. }));

        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "two 2\n").unwrap();
        assert!(matches!(read_embeddings(f.path()).unwrap_err(), MetapathError::Format { line: 1, .. }));
    }

    #[test]
    fn test_nearest() {
        let table = EmbeddingTable::from_vec(vec![1.0, 0.0, 0.9, 0.1, 0.0, 1.0], 3, 2).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e");
        write_embeddings(&path, &["x", "y", "z"], &table).unwrap();
        let emb = read_embeddings(&path).unwrap();
        let near = emb.nearest("x", 1);
        assert_eq!(near[0].0, "y");
        assert!(emb.nearest("missing", 3).is_empty());
    }
}
