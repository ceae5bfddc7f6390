//! Loads custom query definitions from YAML:
//! `queries: [ { name, help, sql, label_columns? } ]`.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDef {
    pub name: String,
    pub help: String,
    pub sql: String,
    pub label_columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct QueriesFile {
    #[serde(default)]
    queries: Vec<RawQuery>,
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    name: Option<String>,
    help: Option<String>,
    sql: Option<String>,
    label_columns: Option<Vec<String>>,
}

/// Parse the file; entries missing any of name/help/sql are skipped with a
/// debug log. An empty file or one without a `queries` key yields no
/// queries.
pub fn load(path: &Path) -> anyhow::Result<Vec<QueryDef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading queries file {}", path.display()))?;
    let parsed: Option<QueriesFile> = serde_yaml::from_str(&content)
        .with_context(|| format!("parsing queries file {}", path.display()))?;

    let Some(file) = parsed else {
        return Ok(Vec::new());
    };

    let mut result = Vec::new();
    for entry in file.queries {
        let name = non_blank(entry.name.as_deref());
        let help = non_blank(entry.help.as_deref());
        let sql = non_blank(entry.sql.as_deref());
        let (Some(name), Some(help), Some(sql)) = (name, help, sql) else {
            debug!(?entry, "skipping query entry with missing name/help/sql");
            continue;
        };
        let label_columns = entry.label_columns.and_then(|cols| {
            let cols: Vec<String> = cols
                .into_iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
            if cols.is_empty() { None } else { Some(cols) }
        });
        result.push(QueryDef {
            name,
            help,
            sql,
            label_columns,
        });
    }
    debug!(count = result.len(), path = %path.display(), "loaded custom queries");
    Ok(result)
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
