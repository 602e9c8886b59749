//! Configuration for analysis and burning.
//!
//! All behaviour is controlled through [`TaggerConfig`], built via its
//! [`TaggerConfigBuilder`]. The raster DPI lives here and is handed to both
//! the detector (point to pixel anchoring) and the renderer, so the two
//! conversions always use the same value.

use crate::annotation::SizingTable;
use crate::error::TaggerError;
use std::fmt;

/// Default raster resolution.
pub const DEFAULT_DPI: u32 = 150;

/// Default suffix of the side-car transaction file.
pub const DEFAULT_CACHE_SUFFIX: &str = "_transactions.json";

/// Configuration for analysing and annotating a PDF.
///
/// # Example
/// ```rust
/// use pdftag::TaggerConfig;
///
/// let config = TaggerConfig::builder()
///     .dpi(150)
///     .verify_cache_hash(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct TaggerConfig {
    /// Raster DPI shared by detection and rendering. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Characters searched for an amount after each date. Default: 100.
    pub amount_window_chars: usize,

    /// Appended to the PDF's file stem to name the transaction file.
    /// Default: `_transactions.json`.
    pub cache_suffix: String,

    /// Re-hash the PDF when loading cached transactions and discard the
    /// cache on mismatch. Default: false.
    ///
    /// Off by default: a cache written for one file is trusted for whatever
    /// file later sits at the same path.
    pub verify_cache_hash: bool,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Font sizing of the translucent guide.
    pub primary_sizing: SizingTable,

    /// Font and rectangle sizing of placed tags.
    pub placed_sizing: SizingTable,
}

impl Default for TaggerConfig {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            amount_window_chars: 100,
            cache_suffix: DEFAULT_CACHE_SUFFIX.to_string(),
            verify_cache_hash: false,
            password: None,
            primary_sizing: SizingTable::primary(),
            placed_sizing: SizingTable::placed(),
        }
    }
}

impl fmt::Debug for TaggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaggerConfig")
            .field("dpi", &self.dpi)
            .field("amount_window_chars", &self.amount_window_chars)
            .field("cache_suffix", &self.cache_suffix)
            .field("verify_cache_hash", &self.verify_cache_hash)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("primary_sizing", &self.primary_sizing)
            .field("placed_sizing", &self.placed_sizing)
            .finish()
    }
}

impl TaggerConfig {
    pub fn builder() -> TaggerConfigBuilder {
        TaggerConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`TaggerConfig`].
#[derive(Debug)]
pub struct TaggerConfigBuilder {
    config: TaggerConfig,
}

impl TaggerConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn amount_window_chars(mut self, n: usize) -> Self {
        self.config.amount_window_chars = n;
        self
    }

    pub fn cache_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.cache_suffix = suffix.into();
        self
    }

    pub fn verify_cache_hash(mut self, v: bool) -> Self {
        self.config.verify_cache_hash = v;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn primary_sizing(mut self, table: SizingTable) -> Self {
        self.config.primary_sizing = table;
        self
    }

    pub fn placed_sizing(mut self, table: SizingTable) -> Self {
        self.config.placed_sizing = table;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<TaggerConfig, TaggerError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(TaggerError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.amount_window_chars == 0 {
            return Err(TaggerError::InvalidConfig(
                "Amount window must be at least one character".into(),
            ));
        }
        if c.cache_suffix.is_empty() || c.cache_suffix.contains(['/', '\\']) {
            return Err(TaggerError::InvalidConfig(format!(
                "Cache suffix must be a non-empty file name fragment, got '{}'",
                c.cache_suffix
            )));
        }
        Ok(self.config)
    }
}
