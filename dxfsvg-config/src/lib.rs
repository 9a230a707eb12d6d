use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use dxfsvg_core::vector::MAX_CANVAS_SIZE;

pub const CONFIG_ENV_VAR: &str = "DXFSVG_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub conversion: ConversionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置，并校验数值范围。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `DXFSVG_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(path));
        }

        let current = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(current)
    }

    /// 在指定目录下查找 `config/default.toml`。
    pub fn discover_in(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let default_path = dir.as_ref().join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let conversion = &self.conversion;
        if conversion.canvas_size == 0 || conversion.canvas_size > MAX_CANVAS_SIZE {
            return Err(ConfigError::Invalid {
                message: format!(
                    "conversion.canvas_size 必须在 1..={MAX_CANVAS_SIZE} 之内，实际为 {}",
                    conversion.canvas_size
                ),
            });
        }
        if !conversion.margin_fraction.is_finite() || conversion.margin_fraction < 0.0 {
            return Err(ConfigError::Invalid {
                message: format!(
                    "conversion.margin_fraction 必须为非负数，实际为 {}",
                    conversion.margin_fraction
                ),
            });
        }
        if conversion.marker_layer_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "conversion.marker_layer_name 不能为空".to_string(),
            });
        }
        if conversion.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                message: "conversion.timeout_ms 必须大于 0，不限时请省略该项".to_string(),
            });
        }
        Ok(())
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 转换参数。
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    #[serde(default = "ConversionConfig::default_marker_layer")]
    pub marker_layer_name: String,
    #[serde(default = "ConversionConfig::default_canvas_size")]
    pub canvas_size: u32,
    #[serde(default = "ConversionConfig::default_margin_fraction")]
    pub margin_fraction: f64,
    /// 设置后进入图框模式。
    #[serde(default)]
    pub frame_name: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl ConversionConfig {
    fn default_marker_layer() -> String {
        "svgframe".to_string()
    }

    fn default_canvas_size() -> u32 {
        512
    }

    fn default_margin_fraction() -> f64 {
        0.05
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            marker_layer_name: Self::default_marker_layer(),
            canvas_size: Self::default_canvas_size(),
            margin_fraction: Self::default_margin_fraction(),
            frame_name: None,
            timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// 保留填充 SVG 与栅格图，便于排查面积结果。
    #[serde(default)]
    pub keep_intermediates: bool,
    #[serde(default = "OutputConfig::default_units_label")]
    pub units_label: String,
}

impl OutputConfig {
    fn default_units_label() -> String {
        "Inch".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            keep_intermediates: false,
            units_label: Self::default_units_label(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("配置无效: {message}")]
    Invalid { message: String },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_returned_when_file_missing() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let cfg = AppConfig::discover_in(dir.path()).expect("discover should succeed");
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.conversion.marker_layer_name, "svgframe");
        assert_eq!(cfg.conversion.canvas_size, 512);
        assert!((cfg.conversion.margin_fraction - 0.05).abs() < f64::EPSILON);
        assert!(cfg.conversion.frame_name.is_none());
        assert!(cfg.conversion.timeout_ms.is_none());
        assert!(!cfg.output.keep_intermediates);
        assert_eq!(cfg.output.units_label, "Inch");
    }

    #[test]
    fn discover_in_reads_config_directory() {
        let dir = tempfile::tempdir().expect("create temp dir");
        fs::create_dir_all(dir.path().join("config")).expect("create config dir");
        fs::write(
            dir.path().join("config/default.toml"),
            "[conversion]\ncanvas_size = 1024\n",
        )
        .expect("write config");

        let cfg = AppConfig::discover_in(dir.path()).expect("discover should succeed");
        assert_eq!(cfg.conversion.canvas_size, 1024);
        assert_eq!(cfg.conversion.marker_layer_name, "svgframe");
    }

    #[test]
    fn load_from_temp_file() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        writeln!(
            file,
            r#"
            [logging]
            level = "debug"

            [conversion]
            marker_layer_name = "FRAMES"
            canvas_size = 800
            margin_fraction = 0.1
            frame_name = "A"
            timeout_ms = 2500

            [output]
            keep_intermediates = true
            units_label = "mm"
            "#
        )
        .unwrap();

        let cfg = AppConfig::from_file(file.path()).expect("load config");
        assert_eq!(cfg.logging.level, "debug");
        assert_eq!(cfg.conversion.marker_layer_name, "FRAMES");
        assert_eq!(cfg.conversion.canvas_size, 800);
        assert!((cfg.conversion.margin_fraction - 0.1).abs() < f64::EPSILON);
        assert_eq!(cfg.conversion.frame_name.as_deref(), Some("A"));
        assert_eq!(cfg.conversion.timeout_ms, Some(2500));
        assert!(cfg.output.keep_intermediates);
        assert_eq!(cfg.output.units_label, "mm");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for body in [
            "[conversion]\ncanvas_size = 0\n",
            "[conversion]\ncanvas_size = 70000\n",
            "[conversion]\nmargin_fraction = -0.5\n",
            "[conversion]\nmarker_layer_name = \"  \"\n",
            "[conversion]\ntimeout_ms = 0\n",
        ] {
            let mut file = tempfile::NamedTempFile::new().expect("create temp file");
            file.write_all(body.as_bytes()).unwrap();
            let err = AppConfig::from_file(file.path()).expect_err(body);
            assert!(matches!(err, ConfigError::Invalid { .. }), "{body}: {err}");
        }
    }

    #[test]
    fn canvas_size_upper_bound_is_inclusive() {
        let mut config = AppConfig::default();
        config.conversion.canvas_size = MAX_CANVAS_SIZE;
        assert!(config.validate().is_ok());
        config.conversion.canvas_size = MAX_CANVAS_SIZE + 1;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(b"[conversion\ncanvas_size = ").unwrap();
        let err = AppConfig::from_file(file.path()).expect_err("parse should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
