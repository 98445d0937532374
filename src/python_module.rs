//! Python bindings for ferric-cuckoo using PyO3

use crate::config::{CuckooConfig, Geometry};
use crate::filter::CuckooFilter;
use crate::hash::hash_item;
use crate::CuckooError;
use numpy::{IntoPyArray, PyArray1, PyReadonlyArray1};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

fn to_py_err(err: CuckooError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Python wrapper for CuckooFilter
///
/// `release()` frees the table; every later call raises `RuntimeError`.
#[pyclass(name = "CuckooFilter")]
struct PyCuckooFilter {
    inner: Option<CuckooFilter>,
}

impl PyCuckooFilter {
    fn filter(&self) -> PyResult<&CuckooFilter> {
        self.inner
            .as_ref()
            .ok_or_else(|| PyRuntimeError::new_err("cuckoo filter used after release()"))
    }

    fn filter_mut(&mut self) -> PyResult<&mut CuckooFilter> {
        self.inner
            .as_mut()
            .ok_or_else(|| PyRuntimeError::new_err("cuckoo filter used after release()"))
    }
}

#[pymethods]
impl PyCuckooFilter {
    #[new]
    #[pyo3(signature = (capacity, fingerprint_bits=16, slots_per_bucket=4, max_kicks=500, seed=None))]
    fn new(
        capacity: usize,
        fingerprint_bits: u32,
        slots_per_bucket: usize,
        max_kicks: usize,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mut config = CuckooConfig::default()
            .with_fingerprint_bits(fingerprint_bits)
            .with_slots_per_bucket(slots_per_bucket)
            .with_max_kicks(max_kicks);
        if let Some(seed) = seed {
            config = config.with_seed(seed);
        }

        let filter = CuckooFilter::with_config(capacity, config).map_err(to_py_err)?;
        Ok(PyCuckooFilter {
            inner: Some(filter),
        })
    }

    /// Rebuild a filter from `to_bytes()` output
    #[staticmethod]
    #[pyo3(signature = (data, num_buckets, fingerprint_bits=16, slots_per_bucket=4, max_kicks=500))]
    fn restore(
        data: &[u8],
        num_buckets: usize,
        fingerprint_bits: u32,
        slots_per_bucket: usize,
        max_kicks: usize,
    ) -> PyResult<Self> {
        let geometry =
            Geometry::new(num_buckets, slots_per_bucket, fingerprint_bits).map_err(to_py_err)?;
        let config = CuckooConfig::default().with_max_kicks(max_kicks);
        let filter = CuckooFilter::restore(geometry, config, data).map_err(to_py_err)?;
        Ok(PyCuckooFilter {
            inner: Some(filter),
        })
    }

    /// Returns False when the filter is too full to take the key
    fn insert(&mut self, key: u64) -> PyResult<bool> {
        match self.filter_mut()?.insert(key) {
            Ok(_) => Ok(true),
            Err(CuckooError::Full { .. }) => Ok(false),
            Err(err) => Err(to_py_err(err)),
        }
    }

    fn contains(&self, key: u64) -> PyResult<bool> {
        Ok(self.filter()?.contains(key))
    }

    fn __contains__(&self, key: u64) -> PyResult<bool> {
        self.contains(key)
    }

    fn delete(&mut self, key: u64) -> PyResult<bool> {
        Ok(self.filter_mut()?.delete(key))
    }

    fn contains_many<'py>(
        &self,
        py: Python<'py>,
        keys: PyReadonlyArray1<'py, u64>,
    ) -> PyResult<&'py PyArray1<bool>> {
        let filter = self.filter()?;
        let found: Vec<bool> = keys
            .as_array()
            .iter()
            .map(|&key| filter.contains(key))
            .collect();
        Ok(found.into_pyarray(py))
    }

    fn release(&mut self) -> PyResult<()> {
        match self.inner.take() {
            Some(filter) => {
                filter.release();
                Ok(())
            }
            None => Err(PyRuntimeError::new_err("cuckoo filter released twice")),
        }
    }

    fn is_released(&self) -> bool {
        self.inner.is_none()
    }

    fn is_broken(&self) -> PyResult<bool> {
        Ok(self.filter()?.is_broken())
    }

    fn clear(&mut self) -> PyResult<()> {
        self.filter_mut()?.clear();
        Ok(())
    }

    fn __len__(&self) -> PyResult<usize> {
        Ok(self.filter()?.len())
    }

    fn capacity(&self) -> PyResult<usize> {
        Ok(self.filter()?.capacity())
    }

    fn num_buckets(&self) -> PyResult<usize> {
        Ok(self.filter()?.geometry().num_buckets())
    }

    fn load_factor(&self) -> PyResult<f64> {
        Ok(self.filter()?.load_factor())
    }

    fn get_fpr(&self) -> PyResult<f64> {
        Ok(self.filter()?.estimated_fpr())
    }

    fn bucket_loads<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray1<usize>> {
        Ok(self.filter()?.bucket_loads().into_pyarray(py))
    }

    fn mem_bytes(&self) -> PyResult<usize> {
        Ok(self.filter()?.memory_bytes())
    }

    fn to_bytes(&self) -> PyResult<Vec<u8>> {
        Ok(self.filter()?.to_bytes())
    }

    fn backend(&self) -> &str {
        "rust"
    }

    fn stats(&self) -> PyResult<String> {
        Ok(self.filter()?.stats().to_string())
    }

    fn __repr__(&self) -> String {
        match &self.inner {
            Some(filter) => format!(
                "CuckooFilter(len={}, buckets={}, fingerprint_bits={})",
                filter.len(),
                filter.geometry().num_buckets(),
                filter.geometry().fingerprint_bits()
            ),
            None => "CuckooFilter(released)".to_string(),
        }
    }
}

/// Hash a byte string into a filter key
#[pyfunction]
fn hash_bytes(data: &[u8]) -> u64 {
    hash_item(data)
}

/// Python module definition
#[pymodule]
fn ferric_cuckoo(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyCuckooFilter>()?;

    m.add_function(wrap_pyfunction!(hash_bytes, m)?)?;

    // Add module constants
    m.add("DEFAULT_SLOTS_PER_BUCKET", crate::config::DEFAULT_SLOTS_PER_BUCKET)?;
    m.add("DEFAULT_MAX_KICKS", crate::config::DEFAULT_MAX_KICKS)?;
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
