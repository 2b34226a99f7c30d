use std::{
    cell::OnceCell,
    collections::{BTreeSet, HashMap, HashSet},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, anyhow};
use rayon::prelude::*;

use crate::{
    cli::args::CommonArgs,
    config::{CONFIG_FILE_NAME, Config, load_config},
    core::{
        ScriptPattern, TreeDocument,
        dump::parse_document,
        file_scanner::{ScanFilter, has_excluded_component, scan_files},
    },
    issues::{MissingGettextIssue, ParseErrorIssue},
    rules::{Classifier, check_document},
};

/// Everything one `check` run works on.
///
/// Configuration is merged with the following priority (highest to lowest):
/// 1. CLI arguments (e.g., `--source-root`)
/// 2. `.gettextrc.json` config file
/// 3. Built-in defaults
///
/// Dumps are read and lowered lazily, in parallel, on first access.
pub struct CheckContext {
    /// Merged configuration (CLI args > config file > defaults).
    pub config: Config,

    /// Directory the scan and config lookup started from.
    pub root_dir: PathBuf,

    /// All tree dumps to check.
    pub files: HashSet<String>,

    /// Literal texts that are never reported (from config `ignoreTexts`).
    pub ignore_texts: HashSet<String>,

    /// Built-in and configured path-component names that are never checked.
    pub excluded_names: BTreeSet<String>,

    pub verbose: bool,

    classifier: Classifier,

    /// Lowered dumps keyed by dump file path.
    documents: OnceCell<HashMap<String, TreeDocument>>,

    /// Populated alongside `documents`.
    parse_errors: OnceCell<Vec<ParseErrorIssue>>,
}

impl CheckContext {
    /// Loads configuration, builds the classifier and scans for tree dumps.
    ///
    /// # Errors
    ///
    /// Returns error if the config file is unreadable or invalid.
    pub fn new(common_args: &CommonArgs) -> Result<Self> {
        let verbose = common_args.verbose;

        let root_dir = common_args
            .source_root
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let path = root_dir
            .to_str()
            .with_context(|| anyhow!("Invalid path: {:?}", root_dir))?;

        let config_result = load_config(Path::new(path))?;
        if !config_result.from_file {
            tracing::info!("no {} found, using default configuration", CONFIG_FILE_NAME);
        }
        let config = config_result.config;

        let script = ScriptPattern::new(&config.target_script).with_context(|| {
            format!("Invalid 'targetScript' pattern: \"{}\"", config.target_script)
        })?;
        let classifier = Classifier::new(config.all_field_constructors(), Box::new(script));

        let excluded_names = config.excluded_names();
        let filter = ScanFilter {
            ignore_patterns: &config.ignores,
            excluded_names: &excluded_names,
        };
        let scan_result = scan_files(path, &config.includes, &filter, verbose);

        if scan_result.skipped_count > 0 {
            eprintln!(
                "Warning: {} path(s) skipped due to access errors{}",
                scan_result.skipped_count,
                if verbose { "" } else { " (use -v for details)" }
            );
        }
        tracing::debug!(files = scan_result.files.len(), "scanned tree dumps");

        let ignore_texts = config.ignore_texts.iter().cloned().collect();

        Ok(Self {
            config,
            root_dir,
            files: scan_result.files,
            ignore_texts,
            excluded_names,
            verbose,
            classifier,
            documents: OnceCell::new(),
            parse_errors: OnceCell::new(),
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Lowered tree dumps, read and parsed in parallel on first call.
    ///
    /// Dumps that fail to load are recorded in `parse_errors()` instead.
    pub fn documents(&self) -> &HashMap<String, TreeDocument> {
        self.documents.get_or_init(|| {
            let results: Vec<_> = self
                .files
                .par_iter()
                .map(|file_path| {
                    let result = std::fs::read_to_string(file_path)
                        .map_err(|e| anyhow!("Failed to read file: {}", e))
                        .and_then(|content| parse_document(&content).map_err(Into::into));
                    (file_path.clone(), result)
                })
                .collect();

            let mut documents = HashMap::new();
            let mut errors = Vec::new();

            for (file_path, result) in results {
                match result {
                    Ok(doc) => {
                        documents.insert(file_path, doc);
                    }
                    Err(e) => {
                        tracing::warn!(file = %file_path, error = %e, "cannot load tree dump");
                        errors.push(ParseErrorIssue {
                            file_path,
                            error: e.to_string(),
                        });
                    }
                }
            }

            let _ = self.parse_errors.set(errors);
            documents
        })
    }

    /// Dumps that could not be read or lowered.
    pub fn parse_errors(&self) -> &Vec<ParseErrorIssue> {
        self.documents();
        self.parse_errors.get_or_init(Vec::new)
    }

    /// Non-gettext-ed strings across every loaded dump.
    ///
    /// Issues point at the path the dump records for its source file, or at
    /// the dump itself when it records none. A recorded path with an excluded
    /// component skips the dump whatever the dump file is called.
    pub fn missing_gettext_issues(&self) -> Vec<MissingGettextIssue> {
        let documents = self.documents();
        let classifier = &self.classifier;
        let ignore_texts = &self.ignore_texts;
        let excluded_names = &self.excluded_names;

        documents
            .par_iter()
            .filter(|(dump_path, doc)| match doc.path.as_deref() {
                Some(source) if has_excluded_component(Path::new(source), excluded_names) => {
                    tracing::debug!(dump = %dump_path, source, "excluded source path");
                    false
                }
                _ => true,
            })
            .flat_map_iter(|(dump_path, doc)| {
                let file_path = doc.path.as_deref().unwrap_or(dump_path);
                check_document(doc, file_path, classifier, ignore_texts)
            })
            .collect()
    }
}
