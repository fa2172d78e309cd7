use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// One benchmark query, loaded from a `.sql` file. The file stem is the query's identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub id: String,
    pub sql: String,
    pub path: PathBuf,
}

/// Enumerate the query corpus, one [QuerySpec] per `.sql` file, sorted by id.
///
/// An empty corpus is an error: a sweep with nothing to run must not start.
pub fn load_queries(dir: &Path) -> anyhow::Result<Vec<QuerySpec>> {
    let mut queries = Vec::new();
    let mut seen = HashSet::new();

    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Cannot read query directory {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("sql") {
            continue;
        }

        let id = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        if !seen.insert(id.clone()) {
            anyhow::bail!("Duplicate query id {id} at {}", path.display());
        }

        let sql = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read query file {}", path.display()))?;
        if sql.trim().is_empty() {
            log::warn!("Skipping empty query file {}", path.display());
            continue;
        }

        queries.push(QuerySpec {
            id,
            sql,
            path: path.to_path_buf(),
        });
    }

    anyhow::ensure!(
        !queries.is_empty(),
        "No .sql query files found in {}",
        dir.display()
    );

    queries.sort_by(|a, b| a.id.cmp(&b.id));
    log::info!("Loaded {} queries from {}", queries.len(), dir.display());

    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn loads_sql_files_sorted_by_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q02.sql"), "SELECT 2").unwrap();
        std::fs::write(dir.path().join("q01.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a query").unwrap();

        let queries = load_queries(dir.path()).unwrap();

        assert_eq!(
            queries.iter().map(|q| q.id.as_str()).collect::<Vec<_>>(),
            vec!["q01", "q02"]
        );
        assert_eq!(queries[0].sql, "SELECT 1");
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load_queries(dir.path()).is_err());
    }

    #[test]
    fn empty_query_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("q01.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("blank.sql"), "  \n").unwrap();

        let queries = load_queries(dir.path()).unwrap();

        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn duplicate_ids_across_subdirectories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("q01.sql"), "SELECT 1").unwrap();
        std::fs::write(dir.path().join("nested").join("q01.sql"), "SELECT 1").unwrap();

        assert!(load_queries(dir.path()).is_err());
    }
}
