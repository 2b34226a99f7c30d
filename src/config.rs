use std::{
    collections::BTreeSet,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::DEFAULT_SCRIPT_PATTERN;

pub const CONFIG_FILE_NAME: &str = ".gettextrc.json";

/// Path components that are never checked: generated migrations and test code.
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &["migrations", "tests", "factories.py", "tests.py"];

/// Public names of `django.db.models`. A call through any of them,
/// `models.CharField('Дата')` or `models.Value('Текст')` alike, keeps its
/// first positional argument out of the report.
pub const DJANGO_MODELS_EXPORTS: &[&str] = &[
    // aggregates
    "Aggregate",
    "Avg",
    "Count",
    "Max",
    "Min",
    "StdDev",
    "Sum",
    "Variance",
    // constraints
    "BaseConstraint",
    "CheckConstraint",
    "Deferrable",
    "UniqueConstraint",
    // enums
    "Choices",
    "IntegerChoices",
    "TextChoices",
    // fields
    "AutoField",
    "BLANK_CHOICE_DASH",
    "BigAutoField",
    "BigIntegerField",
    "BinaryField",
    "BooleanField",
    "CharField",
    "CommaSeparatedIntegerField",
    "DateField",
    "DateTimeField",
    "DecimalField",
    "DurationField",
    "EmailField",
    "Empty",
    "Field",
    "FilePathField",
    "FloatField",
    "GenericIPAddressField",
    "IPAddressField",
    "IntegerField",
    "NOT_PROVIDED",
    "NullBooleanField",
    "PositiveBigIntegerField",
    "PositiveIntegerField",
    "PositiveSmallIntegerField",
    "SlugField",
    "SmallAutoField",
    "SmallIntegerField",
    "TextField",
    "TimeField",
    "URLField",
    "UUIDField",
    "FileField",
    "ImageField",
    "GeneratedField",
    "JSONField",
    "OrderWrt",
    // indexes
    "Index",
    // deletion
    "CASCADE",
    "DO_NOTHING",
    "PROTECT",
    "RESTRICT",
    "SET",
    "SET_DEFAULT",
    "SET_NULL",
    "ProtectedError",
    "RestrictedError",
    // expressions
    "Case",
    "Exists",
    "Expression",
    "ExpressionList",
    "ExpressionWrapper",
    "F",
    "Func",
    "OrderBy",
    "OuterRef",
    "RowRange",
    "Subquery",
    "Value",
    "ValueRange",
    "When",
    "Window",
    "WindowFrame",
    // lookups
    "Lookup",
    "Transform",
    // querysets and managers
    "Manager",
    "Prefetch",
    "Q",
    "QuerySet",
    "prefetch_related_objects",
    "DEFERRED",
    "FilteredRelation",
    // models and relations
    "Model",
    "ObjectDoesNotExist",
    "signals",
    "ForeignKey",
    "ForeignObject",
    "OneToOneField",
    "ManyToManyField",
    "ForeignObjectRel",
    "ManyToOneRel",
    "ManyToManyRel",
    "OneToOneRel",
];

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directories to scan for tree dumps, relative to the source root.
    #[serde(default = "default_includes")]
    pub includes: Vec<String>,
    /// Glob patterns of paths to skip.
    #[serde(default)]
    pub ignores: Vec<String>,
    /// File or directory names to skip, on top of [`DEFAULT_EXCLUDED_NAMES`].
    #[serde(default)]
    pub exclude_names: Vec<String>,
    #[serde(default = "default_field_constructor_names")]
    pub field_constructors: Vec<String>,
    /// Added to `fieldConstructors` rather than replacing it.
    #[serde(default)]
    pub extra_field_constructors: Vec<String>,
    #[serde(default)]
    pub ignore_texts: Vec<String>,
    #[serde(default = "default_target_script")]
    pub target_script: String,
}

fn default_includes() -> Vec<String> {
    vec![".".to_string()]
}

fn default_field_constructor_names() -> Vec<String> {
    DJANGO_MODELS_EXPORTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_target_script() -> String {
    DEFAULT_SCRIPT_PATTERN.to_string()
}

/// The built-in field constructor catalog.
pub fn default_field_constructors() -> Vec<String> {
    default_field_constructor_names()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            includes: default_includes(),
            ignores: Vec::new(),
            exclude_names: Vec::new(),
            field_constructors: default_field_constructor_names(),
            extra_field_constructors: Vec::new(),
            ignore_texts: Vec::new(),
            target_script: default_target_script(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `ignores` or the `targetScript`
    /// regex is invalid.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        Regex::new(&self.target_script).with_context(|| {
            format!(
                "Invalid regular expression in 'targetScript': \"{}\"",
                self.target_script
            )
        })?;

        Ok(())
    }

    /// Built-in excluded names merged with `excludeNames`.
    pub fn excluded_names(&self) -> BTreeSet<String> {
        DEFAULT_EXCLUDED_NAMES
            .iter()
            .map(|s| s.to_string())
            .chain(self.exclude_names.iter().cloned())
            .collect()
    }

    /// `fieldConstructors` merged with `extraFieldConstructors`.
    pub fn all_field_constructors(&self) -> BTreeSet<String> {
        self.field_constructors
            .iter()
            .chain(&self.extra_field_constructors)
            .cloned()
            .collect()
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            config.validate()?;
            tracing::debug!(path = %path.display(), "loaded config");
            Ok(ConfigLoadResult {
                config,
                from_file: true,
            })
        }
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}
