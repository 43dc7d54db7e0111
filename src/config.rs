//! Table sizing configuration.

use crate::load::LoadRecord;
use core::fmt;

/// Load factor used when none is configured.
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;

/// Largest bucket count a table accepts; the accountant's record array must
/// stay within `isize::MAX` bytes.
pub const MAX_BUCKETS: usize = isize::MAX as usize / core::mem::size_of::<LoadRecord>();

/// Sizing for a new table: expected element count and target load factor.
///
/// ```
/// use chained_hashmap::TableConfig;
///
/// let config = TableConfig::new().expected_len(30).load_factor(0.5).build().unwrap();
/// assert_eq!(config.bucket_count(), 60);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableConfig {
    expected_len: usize,
    load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            expected_len: 0,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements the table should hold without resizing.
    pub fn expected_len(mut self, n: usize) -> Self {
        self.expected_len = n;
        self
    }

    /// Elements per bucket above which the table grows.
    pub fn load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Validate the configuration.
    ///
    /// The load factor must be finite, positive, and large enough that one
    /// element fits in at most [`MAX_BUCKETS`] buckets. The bucket count for
    /// `expected_len` must not exceed [`MAX_BUCKETS`] either.
    pub fn build(self) -> Result<Self, ConfigError> {
        if !self.load_factor.is_finite()
            || self.load_factor <= 0.0
            || buckets_for(1, self.load_factor) > MAX_BUCKETS
        {
            return Err(ConfigError::InvalidLoadFactor(self.load_factor));
        }
        if self.bucket_count() > MAX_BUCKETS {
            return Err(ConfigError::TooManyBuckets {
                expected_len: self.expected_len,
                load_factor: self.load_factor,
            });
        }
        Ok(self)
    }

    #[inline]
    pub fn get_load_factor(&self) -> f64 {
        self.load_factor
    }

    #[inline]
    pub fn get_expected_len(&self) -> usize {
        self.expected_len
    }

    /// `ceil(expected_len / load_factor)`, at least one.
    pub fn bucket_count(&self) -> usize {
        buckets_for(self.expected_len, self.load_factor)
    }
}

/// Smallest bucket count keeping `len` elements at or under `load_factor`.
pub(crate) fn buckets_for(len: usize, load_factor: f64) -> usize {
    let n = (len as f64 / load_factor).ceil();
    if n >= usize::MAX as f64 {
        usize::MAX
    } else {
        (n as usize).max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Load factor must be finite and positive, and not so small that a
    /// single element needs more than [`MAX_BUCKETS`] buckets.
    InvalidLoadFactor(f64),
    /// `expected_len / load_factor` exceeds [`MAX_BUCKETS`].
    TooManyBuckets { expected_len: usize, load_factor: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidLoadFactor(lf) => {
                write!(f, "invalid load factor {lf}: must be finite and > 0")
            }
            ConfigError::TooManyBuckets {
                expected_len,
                load_factor,
            } => write!(
                f,
                "{expected_len} elements at load factor {load_factor} need more than {MAX_BUCKETS} buckets"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
