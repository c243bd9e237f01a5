use serde::Deserialize;
use std::path::{Path, PathBuf};
use talkweave_engine::{Limits, Locale, ParseError, ParserConfig, PatternSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid pattern in config file at {config_path}: {source}")]
    InvalidPattern {
        config_path: PathBuf,
        source: ParseError,
    },

    #[error("Config file at {config_path} lists {count} month names, expected 12")]
    InvalidMonths { config_path: PathBuf, count: usize },
}

/// Wiki-specific settings. Anything left out keeps the English-wiki default.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub months: Option<Vec<String>>,
    pub timezone: Option<String>,
    pub utc_offset_minutes: Option<i32>,
    pub signature_patterns: Option<Vec<PatternSettings>>,
    pub user_link_prefixes: Option<Vec<String>>,
    pub non_signature_classes: Option<Vec<String>>,
    pub moved_content_classes: Option<Vec<String>>,
    pub decorative_classes: Option<Vec<String>>,
    pub outdent_classes: Option<Vec<String>>,
    pub signature_prefix: Option<String>,
    pub limits: LimitSettings,

    /// File the settings were read from, for error reports.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// One `[[signature_patterns]]` table; `template` uses `{timestamp}`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PatternSettings {
    pub name: String,
    pub template: String,
    pub author_group: Option<String>,
    pub date_group: Option<String>,
    #[serde(default)]
    pub unsigned: bool,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitSettings {
    pub walk_steps: Option<usize>,
    pub overlap_threshold: Option<f64>,
    pub chain_depth: Option<usize>,
    pub trim_passes: Option<usize>,
    pub author_distance: Option<usize>,
    pub signature_length: Option<usize>,
}

impl From<PatternSettings> for PatternSpec {
    fn from(p: PatternSettings) -> Self {
        PatternSpec {
            name: p.name,
            template: p.template,
            author_group: p.author_group,
            date_group: p.date_group,
            unsigned: p.unsigned,
        }
    }
}

impl LimitSettings {
    fn apply(&self, limits: &mut Limits) {
        if let Some(v) = self.walk_steps {
            limits.walk_steps = v;
        }
        if let Some(v) = self.overlap_threshold {
            limits.overlap_threshold = v;
        }
        if let Some(v) = self.chain_depth {
            limits.chain_depth = v;
        }
        if let Some(v) = self.trim_passes {
            limits.trim_passes = v;
        }
        if let Some(v) = self.author_distance {
            limits.author_distance = v;
        }
        if let Some(v) = self.signature_length {
            limits.signature_length = v;
        }
    }
}

impl Settings {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut settings: Settings =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        settings.source_path = Some(config_path.to_path_buf());

        Ok(Some(settings))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/talkweave");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Builds the engine configuration, compiling every pattern.
    pub fn into_parser_config(self) -> Result<ParserConfig, ConfigError> {
        let config_path = self.source_path.clone().unwrap_or_default();
        let invalid = |source| ConfigError::InvalidPattern {
            config_path: config_path.clone(),
            source,
        };

        let defaults = Locale::default();
        let months = self.months.unwrap_or(defaults.months);
        if months.len() != 12 {
            return Err(ConfigError::InvalidMonths {
                config_path: config_path.clone(),
                count: months.len(),
            });
        }
        let locale = Locale {
            months,
            timezone: self.timezone.unwrap_or(defaults.timezone),
            utc_offset_minutes: self
                .utc_offset_minutes
                .unwrap_or(defaults.utc_offset_minutes),
        };
        let patterns: Vec<PatternSpec> = match self.signature_patterns {
            Some(patterns) => patterns.into_iter().map(PatternSpec::from).collect(),
            None => talkweave_engine::default_patterns(),
        };

        let mut config = ParserConfig::new(&locale, &patterns).map_err(invalid)?;
        if let Some(prefix) = &self.signature_prefix {
            config.set_signature_prefix(prefix).map_err(invalid)?;
        }
        if let Some(v) = self.user_link_prefixes {
            config.user_link_prefixes = v;
        }
        if let Some(v) = self.non_signature_classes {
            config.non_signature_classes = v;
        }
        if let Some(v) = self.moved_content_classes {
            config.moved_content_classes = v;
        }
        if let Some(v) = self.decorative_classes {
            config.decorative_classes = v;
        }
        if let Some(v) = self.outdent_classes {
            config.outdent_classes = v;
        }
        self.limits.apply(&mut config.limits);
        Ok(config)
    }
}
