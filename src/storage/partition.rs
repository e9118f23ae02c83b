//! Hive-style partition directories (`year=2018/month=11`).

use std::path::{Component, Path, PathBuf};

/// Directory value used for a null partition column.
pub const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Relative directory for one combination of partition values.
pub fn partition_dir(columns: &[&str], values: &[Option<String>]) -> PathBuf {
    columns
        .iter()
        .zip(values)
        .map(|(column, value)| format!("{}={}", column, encode_value(value.as_deref())))
        .collect()
}

fn encode_value(value: Option<&str>) -> String {
    match value {
        None => DEFAULT_PARTITION.to_owned(),
        Some(v) => urlencoding::encode(v).into_owned(),
    }
}

/// Parse a relative partition directory back into `(column, value)` pairs.
pub fn parse_partition_dir(dir: &Path) -> Result<Vec<(String, Option<String>)>, String> {
    let mut pairs = Vec::new();
    for component in dir.components() {
        let segment = match component {
            Component::Normal(segment) => segment.to_string_lossy(),
            other => return Err(format!("unexpected path component {:?}", other)),
        };
        let (column, raw) = segment
            .split_once('=')
            .ok_or_else(|| format!("'{}' is not a column=value segment", segment))?;
        let value = if raw == DEFAULT_PARTITION {
            None
        } else {
            let decoded = urlencoding::decode(raw)
                .map_err(|e| format!("bad partition value '{}': {}", raw, e))?;
            Some(decoded.into_owned())
        };
        pairs.push((column.to_owned(), value));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_nested_directories() {
        let dir = partition_dir(
            &["year", "artist_id"],
            &[Some("2000".to_owned()), Some("AR1".to_owned())],
        );
        assert_eq!(dir, PathBuf::from("year=2000/artist_id=AR1"));
    }

    #[test]
    fn null_and_special_values_survive_the_path() {
        let values = vec![None, Some("a/b=c d%".to_owned())];
        let dir = partition_dir(&["year", "artist_id"], &values);
        assert_eq!(dir.components().count(), 2);

        let parsed = parse_partition_dir(&dir).unwrap();
        assert_eq!(
            parsed,
            vec![
                ("year".to_owned(), None),
                ("artist_id".to_owned(), Some("a/b=c d%".to_owned())),
            ]
        );
    }

    #[test]
    fn unpartitioned_is_empty() {
        assert_eq!(partition_dir(&[], &[]), PathBuf::new());
        assert!(parse_partition_dir(Path::new("")).unwrap().is_empty());
    }

    #[test]
    fn rejects_plain_directories() {
        assert!(parse_partition_dir(Path::new("2018/11")).is_err());
    }
}
