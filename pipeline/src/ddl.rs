use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use lakebench_client::ClusterClient;

/// Generate the schema-and-table DDL for every (scale factor, format) combination.
///
/// Each combination gets its own schema named `dfs.hdfs.tpcds_<scale>gb_<format>`, with one
/// CTAS per table reading straight from the uploaded files.
pub fn generate_ddl(
    hdfs_base_path: &str,
    scale_factors: &[u32],
    formats: &[String],
    tables: &[&str],
) -> Vec<(String, String)> {
    let mut statements = Vec::new();

    for &scale_factor in scale_factors {
        for format in formats {
            let schema_name = format!("dfs.hdfs.tpcds_{scale_factor}gb_{format}");

            let mut sql = format!("-- DDL for {schema_name}\n");
            sql.push_str(&format!("CREATE SCHEMA IF NOT EXISTS {schema_name};\n"));
            sql.push_str(&format!("USE {schema_name};\n\n"));

            for table in tables {
                sql.push_str(&format!("-- {table}\n"));
                sql.push_str(&format!("CREATE OR REPLACE TABLE {table} AS\n"));
                sql.push_str(&format!(
                    "SELECT * FROM dfs.hdfs.`{hdfs_base_path}/{scale_factor}gb/{format}/{table}/*`;\n\n"
                ));
            }

            statements.push((schema_name, sql));
        }
    }

    statements
}

/// Write one `.sql` file per schema, returning the written paths.
pub fn write_ddl_files(
    statements: &[(String, String)],
    output_dir: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)?;

    let mut paths = Vec::new();
    for (schema_name, sql) in statements {
        let path = output_dir.join(format!("{}.sql", schema_name.replace('.', "_")));
        std::fs::write(&path, sql)
            .with_context(|| format!("Cannot write DDL file {}", path.display()))?;
        log::info!("Wrote DDL for {schema_name} to {}", path.display());
        paths.push(path);
    }

    Ok(paths)
}

/// Submit every statement of every schema to the cluster, in order. Returns the number of
/// statements executed.
pub async fn execute_ddl(
    client: &ClusterClient,
    statements: &[(String, String)],
    timeout: Duration,
) -> anyhow::Result<usize> {
    let mut executed = 0;
    for (schema_name, sql) in statements {
        log::info!(
            "Executing DDL for {schema_name} on cluster {}",
            client.target().id
        );
        for statement in split_statements(sql) {
            client
                .execute(&statement, timeout)
                .await
                .with_context(|| format!("DDL failed for {schema_name}"))?;
            executed += 1;
        }
    }

    Ok(executed)
}

/// Split a DDL script into single statements, dropping comment lines. The query endpoint takes
/// one statement per request.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn generates_one_schema_per_scale_and_format() {
        let statements = generate_ddl(
            "/benchmark/tpcds",
            &[1, 10],
            &["csv".to_string(), "parquet".to_string()],
            &["store_sales"],
        );

        assert_eq!(statements.len(), 4);
        assert_eq!(statements[0].0, "dfs.hdfs.tpcds_1gb_csv");
        assert_eq!(statements[3].0, "dfs.hdfs.tpcds_10gb_parquet");
    }

    #[test]
    fn ddl_references_the_uploaded_paths() {
        let statements = generate_ddl(
            "/benchmark/tpcds",
            &[1],
            &["parquet".to_string()],
            &["store_sales", "item"],
        );

        let (schema, sql) = &statements[0];
        assert_eq!(schema, "dfs.hdfs.tpcds_1gb_parquet");
        assert!(sql.contains("CREATE SCHEMA IF NOT EXISTS dfs.hdfs.tpcds_1gb_parquet;"));
        assert!(sql.contains("CREATE OR REPLACE TABLE store_sales AS"));
        assert!(sql.contains("SELECT * FROM dfs.hdfs.`/benchmark/tpcds/1gb/parquet/store_sales/*`;"));
        assert!(sql.contains("CREATE OR REPLACE TABLE item AS"));
    }

    #[test]
    fn scripts_split_into_clean_statements() {
        let (_, sql) = &generate_ddl(
            "/benchmark/tpcds",
            &[1],
            &["parquet".to_string()],
            &["item"],
        )[0];

        let statements = split_statements(sql);

        assert_eq!(
            statements,
            vec![
                "CREATE SCHEMA IF NOT EXISTS dfs.hdfs.tpcds_1gb_parquet".to_string(),
                "USE dfs.hdfs.tpcds_1gb_parquet".to_string(),
                "CREATE OR REPLACE TABLE item AS\nSELECT * FROM dfs.hdfs.`/benchmark/tpcds/1gb/parquet/item/*`"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn ddl_files_land_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let statements = generate_ddl("/bench", &[1], &["csv".to_string()], &["item"]);

        let paths = write_ddl_files(&statements, dir.path()).unwrap();

        assert_eq!(paths.len(), 1);
        assert!(paths[0].ends_with("dfs_hdfs_tpcds_1gb_csv.sql"));
        let written = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(written.contains("CREATE OR REPLACE TABLE item AS"));
    }
}
