//! Relation store: partitioned Parquet relations under one output root.
//!
//! Every write replaces the whole relation. Files are first written to a
//! staging directory next to the target, which is swapped in once complete
//! and marked with a `_SUCCESS` file. Readers treat a relation without the
//! marker as missing.

mod error;
mod partition;
mod relation;

pub use error::StorageError;
pub use partition::{parse_partition_dir, partition_dir, DEFAULT_PARTITION};
pub use relation::Relation;

use crate::source::is_ignored;
use arrow::array::{ArrayRef, Int32Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

pub const SUCCESS_MARKER: &str = "_SUCCESS";

const DATA_FILE_NAME: &str = "part-00000.snappy.parquet";

const STAGING_INFIX: &str = ".staging-";

#[derive(Debug, Clone)]
pub struct RelationStore {
    root: PathBuf,
}

impl RelationStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// Staging directories left behind by an interrupted write are removed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(StorageError::io(&root))?;
        let store = Self { root };
        store.sweep_staging()?;
        Ok(store)
    }

    fn sweep_staging(&self) -> Result<(), StorageError> {
        for entry in fs::read_dir(&self.root).map_err(StorageError::io(&self.root))? {
            let entry = entry.map_err(StorageError::io(&self.root))?;
            let name = entry.file_name();
            let is_staging = name
                .to_str()
                .is_some_and(|n| n.starts_with('.') && n.contains(STAGING_INFIX));
            if is_staging && entry.path().is_dir() {
                warn!("Removing leftover staging directory {:?}", entry.path());
                fs::remove_dir_all(entry.path()).map_err(StorageError::io(entry.path()))?;
            }
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn relation_dir(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Whether a complete copy of relation `R` is present.
    pub fn contains<R: Relation>(&self) -> bool {
        self.relation_dir(R::NAME).join(SUCCESS_MARKER).is_file()
    }

    /// Replace relation `R` with `rows`. Returns the number of rows written.
    pub fn write<R: Relation>(&self, rows: &[R]) -> Result<usize, StorageError> {
        let target = self.relation_dir(R::NAME);
        let staging = self
            .root
            .join(format!(".{}{}{}", R::NAME, STAGING_INFIX, Uuid::new_v4()));

        let result = self.write_partitions(&staging, rows);
        if let Err(err) = result {
            let _ = fs::remove_dir_all(&staging);
            return Err(err);
        }

        if target.exists() {
            fs::remove_dir_all(&target).map_err(StorageError::io(&target))?;
        }
        fs::rename(&staging, &target).map_err(StorageError::io(&target))?;
        info!("Wrote {} rows to relation '{}'", rows.len(), R::NAME);
        Ok(rows.len())
    }

    fn write_partitions<R: Relation>(&self, staging: &Path, rows: &[R]) -> Result<(), StorageError> {
        fs::create_dir_all(staging).map_err(StorageError::io(staging))?;

        let mut partitions: BTreeMap<Vec<Option<String>>, Vec<&R>> = BTreeMap::new();
        for row in rows {
            partitions.entry(row.partition_values()).or_default().push(row);
        }

        let schema = R::schema();
        let data_columns: Vec<usize> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, field)| !R::PARTITION_COLUMNS.contains(&field.name().as_str()))
            .map(|(index, _)| index)
            .collect();

        for (values, group) in &partitions {
            let dir = staging.join(partition_dir(R::PARTITION_COLUMNS, values));
            fs::create_dir_all(&dir).map_err(StorageError::io(&dir))?;
            let batch = R::to_batch(group)?.project(&data_columns)?;
            write_parquet(&dir.join(DATA_FILE_NAME), &batch)?;
        }
        debug!(
            "Staged {} partitions for relation '{}'",
            partitions.len(),
            R::NAME
        );

        let marker = staging.join(SUCCESS_MARKER);
        File::create(&marker).map_err(StorageError::io(&marker))?;
        Ok(())
    }

    /// Read relation `R` back, partition columns included.
    pub fn read<R: Relation>(&self) -> Result<Vec<R>, StorageError> {
        let dir = self.relation_dir(R::NAME);
        if !self.contains::<R>() {
            return Err(StorageError::MissingRelation {
                relation: R::NAME,
                path: dir,
            });
        }

        let mut rows = Vec::new();
        let walker = WalkDir::new(&dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored(e));
        for entry in walker {
            let entry = entry.map_err(|e| StorageError::Io {
                path: dir.clone(),
                source: e.into(),
            })?;
            let is_data_file = entry.file_type().is_file()
                && entry.path().extension().is_some_and(|ext| ext == "parquet");
            if !is_data_file {
                continue;
            }
            let partition = entry
                .path()
                .parent()
                .and_then(|parent| parent.strip_prefix(&dir).ok())
                .unwrap_or_else(|| Path::new(""));
            rows.extend(read_data_file::<R>(entry.path(), partition)?);
        }
        debug!("Read {} rows from relation '{}'", rows.len(), R::NAME);
        Ok(rows)
    }
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), StorageError> {
    let file = File::create(path).map_err(StorageError::io(path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

fn read_data_file<R: Relation>(path: &Path, partition: &Path) -> Result<Vec<R>, StorageError> {
    let pairs = parse_partition_dir(partition)
        .map_err(|reason| StorageError::layout(R::NAME, format!("{:?}: {}", path, reason)))?;
    let columns: Vec<&str> = pairs.iter().map(|(column, _)| column.as_str()).collect();
    if columns != R::PARTITION_COLUMNS {
        return Err(StorageError::layout(
            R::NAME,
            format!(
                "{:?} is partitioned by {:?}, expected {:?}",
                path,
                columns,
                R::PARTITION_COLUMNS
            ),
        ));
    }

    let file = File::open(path).map_err(StorageError::io(path))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let schema = R::schema();

    let mut rows = Vec::new();
    for batch in reader {
        let batch = batch?;
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let partition_value = pairs
                .iter()
                .find(|(column, _)| column == field.name())
                .map(|(_, value)| value.as_deref());
            let array = match partition_value {
                Some(value) => partition_array::<R>(field, value, batch.num_rows())?,
                None => batch.column_by_name(field.name()).cloned().ok_or_else(|| {
                    StorageError::layout(
                        R::NAME,
                        format!("{:?} has no column '{}'", path, field.name()),
                    )
                })?,
            };
            arrays.push(array);
        }
        let full = RecordBatch::try_new(schema.clone(), arrays)?;
        rows.extend(R::from_batch(&full)?);
    }
    Ok(rows)
}

/// Constant column holding a partition value parsed from the directory name.
fn partition_array<R: Relation>(
    field: &Field,
    value: Option<&str>,
    len: usize,
) -> Result<ArrayRef, StorageError> {
    let bad_value = || {
        StorageError::layout(
            R::NAME,
            format!("bad value {:?} for partition column '{}'", value, field.name()),
        )
    };
    let array: ArrayRef = match field.data_type() {
        DataType::Utf8 => Arc::new(StringArray::from(vec![value; len])),
        DataType::Int32 => {
            let parsed = value
                .map(|v| v.parse::<i32>().map_err(|_| bad_value()))
                .transpose()?;
            Arc::new(Int32Array::from(vec![parsed; len]))
        }
        DataType::Int64 => {
            let parsed = value
                .map(|v| v.parse::<i64>().map_err(|_| bad_value()))
                .transpose()?;
            Arc::new(Int64Array::from(vec![parsed; len]))
        }
        other => {
            return Err(StorageError::layout(
                R::NAME,
                format!(
                    "partition column '{}' has unsupported type {}",
                    field.name(),
                    other
                ),
            ))
        }
    };
    Ok(array)
}
