use super::{ValueType, WatchList, WatchListEntry, WatchValue};
use crate::host::{EmulatorHost, HostError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name → value mapping returned by `get_watch_list_values`
pub type MemorySample = BTreeMap<String, WatchValue>;

/// Why a single watched value could not be sampled
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReadFault {
    #[error(transparent)]
    Host(#[from] HostError),

    /// NaN and infinities have no JSON number form
    #[error("value {0} is not a finite number")]
    NonFinite(f32),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to read '{name}' at {address:#010x}: {source}")]
pub struct SampleError {
    pub name: String,
    pub address: u32,
    #[source]
    pub source: ReadFault,
}

/// Reads every watched address on demand
///
/// Samples are never cached. If a single read faults the whole sample is
/// discarded, so callers see either every entry or nothing; an empty watch
/// list and a faulted read both produce an empty map.
#[derive(Clone)]
pub struct MemorySampler {
    watch_list: Arc<WatchList>,
    host: Arc<dyn EmulatorHost>,
}

impl MemorySampler {
    pub fn new(watch_list: Arc<WatchList>, host: Arc<dyn EmulatorHost>) -> Self {
        Self { watch_list, host }
    }

    pub fn watch_list(&self) -> &WatchList {
        &self.watch_list
    }

    /// All-or-nothing sample; faults are logged and yield an empty map
    pub fn sample(&self) -> MemorySample {
        match self.try_sample() {
            Ok(sample) => sample,
            Err(e) => {
                warn!("Discarding memory sample: {}", e);
                MemorySample::new()
            }
        }
    }

    /// Reads every entry, stopping at the first fault
    pub fn try_sample(&self) -> Result<MemorySample, SampleError> {
        let mut sample = MemorySample::new();
        for entry in self.watch_list.iter() {
            let value = read_entry(self.host.as_ref(), entry).map_err(|source| SampleError {
                name: entry.name.clone(),
                address: entry.address,
                source,
            })?;
            sample.insert(entry.name.clone(), value);
        }
        debug!("Sampled {} watched values", sample.len());
        Ok(sample)
    }
}

/// Reads one entry sized per its declared type
///
/// A float that is not finite is a fault; it could not be sent as a number.
pub fn read_entry(host: &dyn EmulatorHost, entry: &WatchListEntry) -> Result<WatchValue, ReadFault> {
    let address = entry.address;
    Ok(match entry.value_type {
        ValueType::U8 => WatchValue::U8(host.read_u8(address)?),
        ValueType::U16 => WatchValue::U16(host.read_u16(address)?),
        ValueType::U32 => WatchValue::U32(host.read_u32(address)?),
        ValueType::F32 => {
            let value = host.read_f32(address)?;
            if !value.is_finite() {
                return Err(ReadFault::NonFinite(value));
            }
            WatchValue::F32(value)
        }
    })
}
