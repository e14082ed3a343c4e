use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ExportError, Result};

/// Default archive destination, relative to the working directory.
pub const DEFAULT_DESTINATION: &str = "output.zip";

/// Default number of columns shown in a PDF table.
pub const DEFAULT_MAX_COLUMNS: usize = 4;

// ---------------------------------------------------------------------------
// Document styling
// ---------------------------------------------------------------------------

/// One of the standard 14 PDF fonts usable without embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PdfFont {
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

impl PdfFont {
    /// PostScript name used in the font dictionary.
    pub fn base_font(self) -> &'static str {
        match self {
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
        }
    }

    /// Average glyph advance as a fraction of the font size.
    pub fn average_width(self) -> f64 {
        match self {
            Self::Courier | Self::CourierBold => 0.6,
            Self::Helvetica | Self::HelveticaBold => 0.55,
            _ => 0.5,
        }
    }
}

/// RGB color with 0-255 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const PINK: Rgb = Rgb(255, 175, 175);
    pub const GRAY: Rgb = Rgb(128, 128, 128);

    /// Components scaled to the 0.0-1.0 range PDF operators expect.
    pub fn to_unit(self) -> (f64, f64, f64) {
        (
            f64::from(self.0) / 255.0,
            f64::from(self.1) / 255.0,
            f64::from(self.2) / 255.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentStyle {
    pub header_font: PdfFont,
    pub header_font_size: f64,
    pub header_text_color: Rgb,
    pub header_background: Rgb,
    pub body_font: PdfFont,
    pub body_font_size: f64,
    pub body_text_color: Rgb,
    pub border_color: Rgb,
}

impl Default for DocumentStyle {
    fn default() -> Self {
        Self {
            header_font: PdfFont::TimesBoldItalic,
            header_font_size: 14.0,
            header_text_color: Rgb::RED,
            header_background: Rgb::PINK,
            body_font: PdfFont::TimesRoman,
            body_font_size: 10.0,
            body_text_color: Rgb::BLACK,
            border_color: Rgb::GRAY,
        }
    }
}

/// What the document renderer does with columns beyond `max_columns`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationPolicy {
    /// Drop the extra columns without notice.
    Silent,
    /// Drop the extra columns and log a warning.
    #[default]
    Warn,
    /// Refuse to render.
    Reject,
}

// ---------------------------------------------------------------------------
// Renderer options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetOptions {
    /// Worksheet name; the record type name when unset.
    pub sheet_name: Option<String>,
    pub autofit: bool,
}

impl Default for SpreadsheetOptions {
    fn default() -> Self {
        Self {
            sheet_name: None,
            autofit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    pub max_columns: usize,
    pub truncation: TruncationPolicy,
    /// Heading drawn above the table on the first page.
    pub title: Option<String>,
    pub style: DocumentStyle,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            max_columns: DEFAULT_MAX_COLUMNS,
            truncation: TruncationPolicy::default(),
            title: None,
            style: DocumentStyle::default(),
        }
    }
}

impl DocumentOptions {
    pub fn with_max_columns(mut self, max_columns: usize) -> Self {
        self.max_columns = max_columns;
        self
    }

    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_columns == 0 {
            return Err(ExportError::Config(
                "document.max_columns must be at least 1".into(),
            ));
        }
        let sizes = [self.style.header_font_size, self.style.body_font_size];
        if sizes.iter().any(|s| !s.is_finite() || *s < 4.0 || *s > 72.0) {
            return Err(ExportError::Config(
                "document font sizes must be between 4 and 72 points".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Settings for one export batch, loadable from a JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub destination: PathBuf,
    pub spreadsheet: SpreadsheetOptions,
    pub document: DocumentOptions,
    pub log_level: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            spreadsheet: SpreadsheetOptions::default(),
            document: DocumentOptions::default(),
            log_level: "info".into(),
        }
    }
}

impl ExportConfig {
    /// Loads config from `path`, falling back to defaults when the file is
    /// missing. The result is validated.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            ExportError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ExportError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content).map_err(|e| {
            ExportError::Config(format!("Failed to write config {}: {e}", path.display()))
        })?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.destination.as_os_str().is_empty() {
            return Err(ExportError::Config("destination must not be empty".into()));
        }
        if let Some(name) = &self.spreadsheet.sheet_name {
            if name.trim().is_empty() {
                return Err(ExportError::Config(
                    "spreadsheet.sheet_name must not be blank".into(),
                ));
            }
        }
        self.document.validate()
    }
}
