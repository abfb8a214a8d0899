//! Bridge configuration and the host's default-parameter delivery.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::callbacks::MAX_PATH;
use crate::errors::{BridgeError, ErrorInfo};
use crate::strings::{read_str_bounded, Narrow};
use crate::trace::TraceLevel;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TCB_CONFIG";

/// TOML-configurable settings of a plugin instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name used in log messages.
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,
    /// Least severe trace level that is still recorded.
    #[serde(default = "default_trace_level")]
    pub trace_level: TraceLevel,
    /// Free-form settings handed to the plugin.
    #[serde(default)]
    pub settings: BTreeMap<String, String>,
}

fn default_plugin_name() -> String {
    "plugin".to_string()
}

fn default_trace_level() -> TraceLevel {
    TraceLevel::Info
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plugin_name: default_plugin_name(),
            trace_level: default_trace_level(),
            settings: BTreeMap::new(),
        }
    }
}

impl BridgeConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, BridgeError> {
        toml::from_str(contents).map_err(|err| {
            BridgeError::Config(ErrorInfo::new("tcb.config.parse", err.to_string()))
        })
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let contents = fs::read_to_string(path).map_err(|err| {
            BridgeError::Config(
                ErrorInfo::new("tcb.config.read", format!("failed to read config: {err}"))
                    .with_context("path", path.display().to_string()),
            )
        })?;
        Self::from_toml_str(&contents).map_err(|err| {
            BridgeError::Config(
                err.info()
                    .clone()
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Loads the file named by [`CONFIG_ENV`], or returns defaults when the
    /// variable is unset or empty.
    pub fn from_env() -> Result<Self, BridgeError> {
        match env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => Ok(Self::default()),
        }
    }

    /// Looks up a plugin setting.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }
}

/// Native layout of the default-parameter struct.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DefaultParamStruct {
    /// Size of the struct as the host compiled it.
    pub size: i32,
    /// Low part of the plugin interface version.
    pub plugin_interface_version_low: u32,
    /// High part of the plugin interface version.
    pub plugin_interface_version_hi: u32,
    /// Suggested settings file, terminated.
    pub default_ini_name: [u8; MAX_PATH],
}

impl DefaultParamStruct {
    /// Builds a struct the way the host fills it.
    pub fn new(version_hi: u32, version_low: u32, default_ini: &str) -> Self {
        let mut value = Self {
            size: std::mem::size_of::<Self>() as i32,
            plugin_interface_version_low: version_low,
            plugin_interface_version_hi: version_hi,
            default_ini_name: [0; MAX_PATH],
        };
        crate::strings::write_fixed::<Narrow>(&mut value.default_ini_name, Some(default_ini));
        value
    }
}

/// Decoded default parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultParams {
    /// Interface version as `(high, low)`, e.g. `(2, 10)` for 2.10.
    pub interface_version: (u32, u32),
    /// Settings file suggested by the host.
    pub default_ini: PathBuf,
}

impl DefaultParams {
    /// Decodes the host struct.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must point to a readable struct of at least the size
    /// it declares.
    pub unsafe fn read(ptr: *const DefaultParamStruct) -> Result<Self, BridgeError> {
        if ptr.is_null() {
            return Err(BridgeError::missing_argument("SetDefaultParams", "parameter struct"));
        }
        let declared = std::ptr::addr_of!((*ptr).size).read_unaligned();
        if declared < std::mem::size_of::<DefaultParamStruct>() as i32 {
            return Err(BridgeError::Marshal(
                ErrorInfo::new(
                    "tcb.marshal.struct_size",
                    "default parameter struct is too small",
                )
                .with_context("size", declared.to_string()),
            ));
        }
        let raw = &*ptr;
        let ini = read_str_bounded::<Narrow>(raw.default_ini_name.as_ptr(), MAX_PATH);
        Ok(Self {
            interface_version: (
                raw.plugin_interface_version_hi,
                raw.plugin_interface_version_low,
            ),
            default_ini: PathBuf::from(ini.unwrap_or_default()),
        })
    }
}
