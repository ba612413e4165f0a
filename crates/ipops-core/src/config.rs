// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process configuration, read once from the environment at startup and
// immutable afterwards.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{IpopsError, Result};

/// Rendering mode for printed pages and, symmetrically, the ingestion mode
/// expected by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageDataFormat {
    /// Base64 text pages, the degraded human/OCR fallback.
    Text,
    /// One Data-Matrix symbol per page.
    #[default]
    DataMatrix,
}

impl PageDataFormat {
    /// Parse an alias. Matching is insensitive to case, spaces, and
    /// underscores: `text`, `txt`, `raw`, `string`, `str`, and `base64`
    /// select [`PageDataFormat::Text`]; `matrix`, `qr-code`, `qrcode`,
    /// and `data-matrix` select [`PageDataFormat::DataMatrix`].
    pub fn parse(raw: &str) -> Option<Self> {
        let normalised: String = raw
            .trim()
            .chars()
            .filter(|c| *c != ' ' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalised.as_str() {
            "text" | "txt" | "raw" | "string" | "str" | "base64" => Some(Self::Text),
            "matrix" | "qr-code" | "qrcode" | "data-matrix" | "datamatrix" => {
                Some(Self::DataMatrix)
            }
            _ => None,
        }
    }
}

/// Logger threshold names accepted by `IPOPS_PRINTER_LOG_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Some(Self::Debug),
            "INFO" => Some(Self::Info),
            "WARNING" => Some(Self::Warning),
            "ERROR" => Some(Self::Error),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }

    /// The closest `tracing` level. `CRITICAL` has no tracing counterpart
    /// and collapses into `ERROR`.
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Critical => tracing::Level::ERROR,
        }
    }
}

/// Printer-side settings. Built once at startup; read-only thereafter.
#[derive(Debug, Clone)]
pub struct PrinterSettings {
    /// Upper bound in bytes on a page chunk in Data-Matrix mode. Frames
    /// larger than this are split across pages, not rejected.
    pub max_buffer_size: usize,
    /// Threshold below which the accumulator keeps pulling more records.
    pub contiguous_min_buffer_size: usize,
    /// Inter-record idle timeout while already holding partial data.
    pub contiguous_data_timeout: Duration,
    /// Poll interval while waiting for the first record of a new frame.
    pub new_frame_polling_rate: Duration,
    /// Page rendering mode.
    pub pdf_data_format: PageDataFormat,
    /// Logger threshold.
    pub log_level: LogLevel,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            max_buffer_size: 1500,
            contiguous_min_buffer_size: 1400,
            contiguous_data_timeout: Duration::from_secs_f64(10.0),
            new_frame_polling_rate: Duration::from_secs_f64(0.15),
            pdf_data_format: PageDataFormat::DataMatrix,
            log_level: LogLevel::Info,
        }
    }
}

impl PrinterSettings {
    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key-lookup function. Unset and
    /// blank variables fall back to their defaults; set variables are
    /// validated against the ranges below and reject the whole startup on
    /// failure.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let max_buffer_size = parse_int(
            &lookup,
            "IPOPS_PRINTER_MAX_BUFFER_SIZE",
            defaults.max_buffer_size,
            2,
            10_000,
        )?;
        let contiguous_min_buffer_size = parse_int(
            &lookup,
            "IPOPS_PRINTER_CONTIGUOUS_MIN_BUFFER_SIZE",
            defaults.contiguous_min_buffer_size,
            1,
            max_buffer_size - 1,
        )?;
        let contiguous_data_timeout = parse_seconds(
            &lookup,
            "IPOPS_PRINTER_CONTIGUOUS_DATA_TIMEOUT",
            defaults.contiguous_data_timeout,
            0.01,
            1000.0,
        )?;
        let new_frame_polling_rate = parse_seconds(
            &lookup,
            "IPOPS_PRINTER_NEW_FRAME_POLLING_RATE",
            defaults.new_frame_polling_rate,
            0.01,
            10.0,
        )?;

        let pdf_data_format = match non_blank(&lookup, "IPOPS_PRINTER_PDF_DATA_FORMAT") {
            None => defaults.pdf_data_format,
            Some(raw) => PageDataFormat::parse(&raw).ok_or_else(|| {
                IpopsError::Config(format!(
                    "invalid value for IPOPS_PRINTER_PDF_DATA_FORMAT: {raw:?}"
                ))
            })?,
        };

        let log_level = match non_blank(&lookup, "IPOPS_PRINTER_LOG_LEVEL") {
            None => defaults.log_level,
            Some(raw) => LogLevel::parse(&raw).ok_or_else(|| {
                IpopsError::Config(format!(
                    "invalid value for IPOPS_PRINTER_LOG_LEVEL: {raw:?}"
                ))
            })?,
        };

        Ok(Self {
            max_buffer_size,
            contiguous_min_buffer_size,
            contiguous_data_timeout,
            new_frame_polling_rate,
            pdf_data_format,
            log_level,
        })
    }
}

/// Scanner-side settings.
#[derive(Debug, Clone)]
pub struct ScannerSettings {
    /// Named pipe the reassembled stream is appended to.
    pub inbound_path: PathBuf,
    /// Expected page format: Data-Matrix symbols or OCR text pages.
    pub page_format: PageDataFormat,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            inbound_path: PathBuf::from("/var/run/printun"),
            page_format: PageDataFormat::DataMatrix,
        }
    }
}

impl ScannerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let inbound_path = match non_blank(&lookup, "IPOPS_INBOUND_PATH") {
            None => defaults.inbound_path,
            Some(raw) => PathBuf::from(raw),
        };

        let page_format = match non_blank(&lookup, "IPOPS_SCANNER_PAGE_FORMAT") {
            None => defaults.page_format,
            Some(raw) => PageDataFormat::parse(&raw).ok_or_else(|| {
                IpopsError::Config(format!(
                    "invalid value for IPOPS_SCANNER_PAGE_FORMAT: {raw:?}"
                ))
            })?,
        };

        Ok(Self {
            inbound_path,
            page_format,
        })
    }
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn parse_int(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
    min: usize,
    max: usize,
) -> Result<usize> {
    let value = match non_blank(lookup, key) {
        None => default,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| IpopsError::Config(format!("invalid value for {key}: {raw:?}")))?,
    };
    if !(min..=max).contains(&value) {
        return Err(IpopsError::Config(format!(
            "{key} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(value)
}

fn parse_seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
    min: f64,
    max: f64,
) -> Result<Duration> {
    let value = match non_blank(lookup, key) {
        None => default.as_secs_f64(),
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| IpopsError::Config(format!("invalid value for {key}: {raw:?}")))?,
    };
    if !value.is_finite() || value < min || value > max {
        return Err(IpopsError::Config(format!(
            "{key} must be between {min} and {max} seconds, got {value}"
        )));
    }
    Ok(Duration::from_secs_f64(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let settings = PrinterSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.max_buffer_size, 1500);
        assert_eq!(settings.contiguous_min_buffer_size, 1400);
        assert_eq!(settings.contiguous_data_timeout, Duration::from_secs(10));
        assert_eq!(
            settings.new_frame_polling_rate,
            Duration::from_millis(150)
        );
        assert_eq!(settings.pdf_data_format, PageDataFormat::DataMatrix);
        assert_eq!(settings.log_level, LogLevel::Info);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let lookup = lookup_from(&[("IPOPS_PRINTER_MAX_BUFFER_SIZE", "  ")]);
        let settings = PrinterSettings::from_lookup(lookup).unwrap();
        assert_eq!(settings.max_buffer_size, 1500);
    }

    #[test]
    fn explicit_values_override() {
        let lookup = lookup_from(&[
            ("IPOPS_PRINTER_MAX_BUFFER_SIZE", "2000"),
            ("IPOPS_PRINTER_CONTIGUOUS_MIN_BUFFER_SIZE", "100"),
            ("IPOPS_PRINTER_CONTIGUOUS_DATA_TIMEOUT", "0.5"),
            ("IPOPS_PRINTER_NEW_FRAME_POLLING_RATE", "0.05"),
            ("IPOPS_PRINTER_PDF_DATA_FORMAT", "text"),
            ("IPOPS_PRINTER_LOG_LEVEL", "debug"),
        ]);
        let settings = PrinterSettings::from_lookup(lookup).unwrap();
        assert_eq!(settings.max_buffer_size, 2000);
        assert_eq!(settings.contiguous_min_buffer_size, 100);
        assert_eq!(settings.contiguous_data_timeout, Duration::from_millis(500));
        assert_eq!(settings.new_frame_polling_rate, Duration::from_millis(50));
        assert_eq!(settings.pdf_data_format, PageDataFormat::Text);
        assert_eq!(settings.log_level, LogLevel::Debug);
    }

    #[test]
    fn out_of_range_values_rejected() {
        for (key, value) in [
            ("IPOPS_PRINTER_MAX_BUFFER_SIZE", "1"),
            ("IPOPS_PRINTER_MAX_BUFFER_SIZE", "10001"),
            ("IPOPS_PRINTER_CONTIGUOUS_MIN_BUFFER_SIZE", "0"),
            ("IPOPS_PRINTER_CONTIGUOUS_DATA_TIMEOUT", "0.001"),
            ("IPOPS_PRINTER_CONTIGUOUS_DATA_TIMEOUT", "1001"),
            ("IPOPS_PRINTER_NEW_FRAME_POLLING_RATE", "11"),
        ] {
            let pair = [(key, value)];
            let lookup = lookup_from(&pair);
            assert!(
                matches!(
                    PrinterSettings::from_lookup(lookup),
                    Err(IpopsError::Config(_))
                ),
                "{key}={value} should be rejected"
            );
        }
    }

    #[test]
    fn min_buffer_must_stay_below_max() {
        let lookup = lookup_from(&[
            ("IPOPS_PRINTER_MAX_BUFFER_SIZE", "100"),
            ("IPOPS_PRINTER_CONTIGUOUS_MIN_BUFFER_SIZE", "100"),
        ]);
        assert!(matches!(
            PrinterSettings::from_lookup(lookup),
            Err(IpopsError::Config(_))
        ));
    }

    #[test]
    fn unparseable_values_rejected() {
        let lookup = lookup_from(&[("IPOPS_PRINTER_MAX_BUFFER_SIZE", "lots")]);
        assert!(matches!(
            PrinterSettings::from_lookup(lookup),
            Err(IpopsError::Config(_))
        ));
    }

    #[test]
    fn format_aliases() {
        for alias in ["text", "TXT", "raw", "String", "str", "BASE64", "ba se_64"] {
            assert_eq!(
                PageDataFormat::parse(alias),
                Some(PageDataFormat::Text),
                "{alias}"
            );
        }
        for alias in ["matrix", "QR-Code", "qrcode", "data-matrix", "DATA_MATRIX", "Data Matrix"] {
            assert_eq!(
                PageDataFormat::parse(alias),
                Some(PageDataFormat::DataMatrix),
                "{alias}"
            );
        }
        assert_eq!(PageDataFormat::parse("pdf417"), None);
    }

    #[test]
    fn log_level_names() {
        assert_eq!(LogLevel::parse(" warning "), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("CRITICAL"), Some(LogLevel::Critical));
        assert_eq!(LogLevel::parse("trace"), None);
        assert_eq!(LogLevel::Critical.tracing_level(), tracing::Level::ERROR);
        assert_eq!(LogLevel::Warning.tracing_level(), tracing::Level::WARN);
    }

    #[test]
    fn scanner_defaults_and_overrides() {
        let settings = ScannerSettings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.inbound_path, PathBuf::from("/var/run/printun"));
        assert_eq!(settings.page_format, PageDataFormat::DataMatrix);

        let lookup = lookup_from(&[
            ("IPOPS_INBOUND_PATH", "/tmp/diode"),
            ("IPOPS_SCANNER_PAGE_FORMAT", "text"),
        ]);
        let settings = ScannerSettings::from_lookup(lookup).unwrap();
        assert_eq!(settings.inbound_path, PathBuf::from("/tmp/diode"));
        assert_eq!(settings.page_format, PageDataFormat::Text);
    }
}
