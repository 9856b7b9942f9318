use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DatasetDescriptor;
use crate::data::loader;
use crate::error::{IngestionError, NotFoundError};
use crate::state::palette::color_for_dataset;

/// Output of ingestion for one descriptor: a sorted, duplicate-free,
/// null-free series plus its name and unit.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedSeries {
    pub name: String,
    pub unit: String,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
}

/// Anything that can turn a descriptor into a clean series.
pub trait SeriesSource {
    fn ingest(&self, descriptor: &DatasetDescriptor) -> Result<IngestedSeries, IngestionError>;
}

/// Reads CSV/Excel files relative to a data directory.
pub struct FileSource {
    pub data_dir: PathBuf,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }
}

impl SeriesSource for FileSource {
    fn ingest(&self, descriptor: &DatasetDescriptor) -> Result<IngestedSeries, IngestionError> {
        let path = descriptor.source_path(&self.data_dir);
        let table = loader::load_table(
            &descriptor.name,
            &path,
            &descriptor.time_column,
            &descriptor.value_column,
        )?;
        let clean = loader::extract_series(
            &descriptor.name,
            &table,
            &descriptor.time_column,
            &descriptor.value_column,
        )?;
        if clean.dropped_rows > 0 {
            tracing::debug!(
                "{}: dropped {} null or duplicate rows ({:?} timestamps)",
                descriptor.name,
                clean.dropped_rows,
                clean.encoding
            );
        }
        Ok(IngestedSeries {
            name: descriptor.name.clone(),
            unit: descriptor.resolved_unit(),
            times: clean.times,
            values: clean.values,
        })
    }
}

/// One loaded environmental time series. Immutable after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub name: String,
    pub unit: String,
    /// Position among successfully loaded datasets; the dataset's stable identity index.
    pub load_index: usize,
    pub color: [u8; 4],
    times: Arc<[f64]>,
    values: Arc<[f64]>,
    min_time: f64,
    max_time: f64,
}

impl Dataset {
    pub fn times(&self) -> &Arc<[f64]> {
        &self.times
    }

    pub fn values(&self) -> &Arc<[f64]> {
        &self.values
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_time, self.max_time)
    }

    pub fn point_count(&self) -> usize {
        self.times.len()
    }
}

/// All datasets that loaded, keyed by name, in load order.
#[derive(Debug, Clone, Default)]
pub struct SeriesStore {
    datasets: Vec<Dataset>,
    by_name: HashMap<String, usize>,
}

impl SeriesStore {
    /// Ingest every descriptor in order. Failures are per dataset: they are
    /// logged and returned, and the failed dataset is left out of the store.
    pub fn load(
        source: &impl SeriesSource,
        descriptors: &[DatasetDescriptor],
    ) -> (Self, Vec<IngestionError>) {
        let mut loaded = Vec::new();
        let mut failures = Vec::new();

        for descriptor in descriptors {
            if loaded.iter().any(|s: &IngestedSeries| s.name == descriptor.name) {
                failures.push(IngestionError::DuplicateName {
                    name: descriptor.name.clone(),
                });
                continue;
            }
            match source.ingest(descriptor) {
                Ok(series) if series.times.is_empty() => failures.push(IngestionError::Empty {
                    name: descriptor.name.clone(),
                }),
                Ok(series) => {
                    tracing::info!("Loaded {}: {} points", series.name, series.times.len());
                    loaded.push(series);
                }
                Err(e) => failures.push(e),
            }
        }

        for failure in &failures {
            tracing::warn!("Skipping dataset: {failure}");
        }

        (Self::from_series(loaded), failures)
    }

    /// Build a store from already clean series. Colors are assigned from the
    /// position in `series`.
    pub fn from_series(series: Vec<IngestedSeries>) -> Self {
        let count = series.len();
        let mut datasets = Vec::with_capacity(count);
        let mut by_name = HashMap::with_capacity(count);

        for (load_index, s) in series.into_iter().enumerate() {
            let min_time = s.times.first().copied().unwrap_or(0.0);
            let max_time = s.times.last().copied().unwrap_or(0.0);
            by_name.insert(s.name.clone(), load_index);
            datasets.push(Dataset {
                name: s.name,
                unit: s.unit,
                load_index,
                color: color_for_dataset(load_index, count),
                times: s.times.into(),
                values: s.values.into(),
                min_time,
                max_time,
            });
        }

        Self { datasets, by_name }
    }

    pub fn get(&self, name: &str) -> Result<&Dataset, NotFoundError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.datasets[idx])
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    pub fn by_index(&self, load_index: usize) -> Option<&Dataset> {
        self.datasets.get(load_index)
    }

    pub fn index_of(&self, name: &str) -> Result<usize, NotFoundError> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| NotFoundError(name.to_string()))
    }

    /// Datasets in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Union of every dataset's time bounds.
    pub fn time_bounds(&self) -> Option<(f64, f64)> {
        self.datasets.iter().map(Dataset::bounds).reduce(|a, b| (a.0.min(b.0), a.1.max(b.1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MemorySource;

    impl SeriesSource for MemorySource {
        fn ingest(&self, d: &DatasetDescriptor) -> Result<IngestedSeries, IngestionError> {
            match d.source.as_str() {
                "missing" => Err(IngestionError::MissingSource {
                    name: d.name.clone(),
                    path: PathBuf::from(&d.source),
                }),
                "empty" => Ok(IngestedSeries {
                    name: d.name.clone(),
                    unit: d.resolved_unit(),
                    times: vec![],
                    values: vec![],
                }),
                _ => Ok(IngestedSeries {
                    name: d.name.clone(),
                    unit: d.resolved_unit(),
                    times: vec![10.0, 20.0, 30.0],
                    values: vec![1.0, 2.0, 3.0],
                }),
            }
        }
    }

    fn descriptor(source: &str, name: &str) -> DatasetDescriptor {
        DatasetDescriptor::new(source, "datetime", "value", name, "u")
    }

    #[test]
    fn failed_datasets_are_absent_but_others_load() {
        let (store, failures) = SeriesStore::load(
            &MemorySource,
            &[
                descriptor("a.csv", "A"),
                descriptor("missing", "B"),
                descriptor("empty", "C"),
                descriptor("d.csv", "D"),
                descriptor("e.csv", "A"),
            ],
        );

        assert_eq!(store.names(), vec!["A", "D"]);
        assert_eq!(failures.len(), 3);
        assert!(matches!(failures[0], IngestionError::MissingSource { .. }));
        assert!(matches!(failures[1], IngestionError::Empty { .. }));
        assert!(matches!(failures[2], IngestionError::DuplicateName { .. }));
        assert_eq!(store.get("B").unwrap_err(), NotFoundError("B".to_string()));
    }

    #[test]
    fn load_index_counts_only_loaded_datasets() {
        let (store, _) = SeriesStore::load(
            &MemorySource,
            &[descriptor("missing", "X"), descriptor("a.csv", "A"), descriptor("b.csv", "B")],
        );
        assert_eq!(store.get("A").unwrap().load_index, 0);
        assert_eq!(store.get("B").unwrap().load_index, 1);
        assert_eq!(store.get("B").unwrap().bounds(), (10.0, 30.0));
    }

    #[test]
    fn time_bounds_is_union() {
        let store = SeriesStore::from_series(vec![
            IngestedSeries { name: "A".into(), unit: "u".into(), times: vec![5.0, 8.0], values: vec![0.0, 0.0] },
            IngestedSeries { name: "B".into(), unit: "u".into(), times: vec![1.0, 6.0], values: vec![0.0, 0.0] },
        ]);
        assert_eq!(store.time_bounds(), Some((1.0, 8.0)));
        assert_eq!(SeriesStore::default().time_bounds(), None);
    }
}
