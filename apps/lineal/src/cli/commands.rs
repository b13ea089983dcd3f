//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use lineal_core::{
    issues_to_csv, result_from_bytes, result_to_bytes, EnrichmentConfig, EnrichmentPipeline,
    LinealError, Person, PersonId, RunHooks, RunSummary,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for person record input (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_INPUT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum file size for configuration files (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Maximum file size for snapshot files (500 MB).
///
/// Snapshot files can be larger since they contain binary run data.
const MAX_SNAPSHOT_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), LinealError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| LinealError::IoError(format!("Cannot read file metadata: {e}")))?;

    if metadata.len() > max_size {
        return Err(LinealError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// This function:
/// 1. Canonicalizes the path to resolve symlinks and ".."
/// 2. Ensures the path exists
/// 3. Ensures the path is a file (not a directory)
fn validate_file_path(path: &Path) -> Result<PathBuf, LinealError> {
    // Canonicalize resolves "..", symlinks, and validates existence
    let canonical = path.canonicalize().map_err(|e| {
        LinealError::IoError(format!("Invalid file path '{}': {e}", path.display()))
    })?;

    if !canonical.is_file() {
        return Err(LinealError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, LinealError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        LinealError::IoError(format!(
            "Invalid output directory '{}': {e}",
            parent.display()
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(LinealError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| LinealError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// LOADING
// =============================================================================

/// Load and validate a TOML configuration file; defaults when absent.
pub fn load_config(path: Option<&Path>) -> Result<EnrichmentConfig, LinealError> {
    let Some(path) = path else {
        return Ok(EnrichmentConfig::with_defaults());
    };
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_CONFIG_FILE_SIZE)?;

    let text = std::fs::read_to_string(&path)
        .map_err(|e| LinealError::IoError(format!("Cannot read '{}': {e}", path.display())))?;
    let config: EnrichmentConfig = toml::from_str(&text)
        .map_err(|e| LinealError::InvalidConfig(format!("'{}': {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

/// Load person records from a JSON array file.
///
/// Each record is validated and ids must be unique; the parser is the
/// trust boundary between arbitrary files and the engine.
pub fn load_people(path: &Path) -> Result<BTreeMap<PersonId, Arc<Person>>, LinealError> {
    let path = validate_file_path(path)?;
    validate_file_size(&path, MAX_INPUT_FILE_SIZE)?;

    let text = std::fs::read_to_string(&path)
        .map_err(|e| LinealError::IoError(format!("Cannot read '{}': {e}", path.display())))?;
    let records: Vec<Person> = serde_json::from_str(&text)
        .map_err(|e| LinealError::DeserializationError(format!("'{}': {e}", path.display())))?;

    let mut people = BTreeMap::new();
    for person in records {
        person.validate()?;
        let id = person.id.clone();
        if people.insert(id.clone(), Arc::new(person)).is_some() {
            return Err(LinealError::DeserializationError(format!(
                "duplicate person id '{id}'"
            )));
        }
    }
    Ok(people)
}

// =============================================================================
// PROGRESS HOOKS
// =============================================================================

/// Hooks that forward pipeline progress to tracing.
struct TracingHooks;

impl RunHooks for TracingHooks {
    fn report_step(&self, info: &str, done: usize, total: usize) {
        tracing::debug!(done, total, "{info}");
    }
}

// =============================================================================
// ENRICH COMMAND
// =============================================================================

/// Run the enrichment pipeline and export the results.
pub fn cmd_enrich(
    input: &Path,
    config_path: Option<&Path>,
    issues_out: Option<&Path>,
    snapshot_out: Option<&Path>,
    json_mode: bool,
) -> Result<(), LinealError> {
    let config = load_config(config_path)?;
    let people = load_people(input)?;
    tracing::info!(people = people.len(), "Loaded person records");

    let pipeline = EnrichmentPipeline::from_config(&config)?;
    let result = pipeline.run_with_hooks(&people, &TracingHooks)?;
    let summary = RunSummary::from_result(&result);
    tracing::info!(
        iterations = result.iterations,
        termination = %result.termination,
        issues = result.issues.len(),
        "Enrichment run finished"
    );

    let csv = issues_to_csv(&result.issues);
    match issues_out {
        Some(path) => {
            let path = validate_output_path(path)?;
            std::fs::write(&path, csv).map_err(|e| {
                LinealError::IoError(format!("Cannot write '{}': {e}", path.display()))
            })?;
            tracing::info!(path = %path.display(), "Wrote issue CSV");
        }
        None => print!("{csv}"),
    }

    if let Some(path) = snapshot_out {
        let path = validate_output_path(path)?;
        let bytes = result_to_bytes(&result)?;
        std::fs::write(&path, bytes).map_err(|e| {
            LinealError::IoError(format!("Cannot write '{}': {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "Wrote run snapshot");
    }

    print_summary(&summary, json_mode);
    Ok(())
}

fn print_summary(summary: &RunSummary, json_mode: bool) {
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
        return;
    }

    println!("Lineal Enrichment Summary");
    println!("=========================");
    println!("People:          {}", summary.people);
    println!("Iterations:      {}", summary.iterations);
    println!("Termination:     {}", summary.termination);
    println!("Inferred events: {}", summary.inferred_events);
    println!("Date bounds:     {}", summary.date_bounds);
    println!("Issues:          {}", summary.issues_total);
    for (severity, count) in &summary.issues_by_severity {
        println!("  {severity:<8} {count}");
    }
    for (rule, runs) in &summary.rule_runs {
        println!("Rule {rule}: {runs} runs");
    }
}

// =============================================================================
// ISSUES COMMAND
// =============================================================================

/// Export issues from a stored run snapshot.
pub fn cmd_issues(snapshot: &Path, output: Option<&Path>) -> Result<(), LinealError> {
    let path = validate_file_path(snapshot)?;
    validate_file_size(&path, MAX_SNAPSHOT_FILE_SIZE)?;

    let bytes = std::fs::read(&path)
        .map_err(|e| LinealError::IoError(format!("Cannot read '{}': {e}", path.display())))?;
    let result = result_from_bytes(&bytes)?;
    let csv = issues_to_csv(&result.issues);

    match output {
        Some(out) => {
            let out = validate_output_path(out)?;
            std::fs::write(&out, csv).map_err(|e| {
                LinealError::IoError(format!("Cannot write '{}': {e}", out.display()))
            })?;
            tracing::info!(path = %out.display(), "Wrote issue CSV");
        }
        None => print!("{csv}"),
    }
    Ok(())
}

// =============================================================================
// CHECK-CONFIG COMMAND
// =============================================================================

/// Validate a configuration file and report the effective rule list.
pub fn cmd_check_config(config_path: &Path, json_mode: bool) -> Result<(), LinealError> {
    let config = load_config(Some(config_path))?;
    let pipeline = EnrichmentPipeline::from_config(&config)?;
    let rule_ids = pipeline.rule_ids();

    if json_mode {
        let output = serde_json::json!({
            "valid": true,
            "max_iterations": config.max_iterations,
            "rules": rule_ids,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Configuration OK");
    println!("Max iterations: {}", config.max_iterations);
    println!("Enabled rules (execution order):");
    for id in rule_ids {
        println!("  - {id}");
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn people_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(json.as_bytes()).expect("write");
        file
    }

    #[test]
    fn load_people_parses_records() {
        let file = people_file(
            r#"[
                {"id": "@I1@", "name": "Ane Jensdatter",
                 "events": {"burial": {"date": {"year": 1950, "month": 1, "day": 10},
                                        "place": "Aalborg"}}},
                {"id": "@I2@", "sex": "F"}
            ]"#,
        );
        let people = load_people(file.path()).expect("load");
        assert_eq!(people.len(), 2);
        let first = people.get(&PersonId::new("@I1@")).expect("person");
        assert_eq!(first.name.as_deref(), Some("Ane Jensdatter"));
    }

    #[test]
    fn load_people_rejects_duplicate_ids() {
        let file = people_file(r#"[{"id": "@I1@"}, {"id": "@I1@"}]"#);
        assert!(load_people(file.path()).is_err());
    }

    #[test]
    fn load_people_rejects_malformed_json() {
        let file = people_file("{not json");
        assert!(load_people(file.path()).is_err());
    }

    #[test]
    fn load_config_defaults_when_absent() {
        let config = load_config(None).expect("defaults");
        assert_eq!(config, EnrichmentConfig::with_defaults());
    }

    #[test]
    fn load_config_parses_toml_overrides() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(
            b"max_iterations = 3\n\n[death_from_burial]\nmax_days = 30\n\n[rules_enabled]\nimplausible_age = false\n",
        )
        .expect("write");

        let config = load_config(Some(file.path())).expect("load");
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.death_from_burial.max_days, 30);
        assert!(!config.rule_enabled("implausible_age"));
    }

    #[test]
    fn load_config_rejects_unknown_keys() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(b"max_iteration_typo = 3\n").expect("write");
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn load_config_rejects_invalid_thresholds() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(b"[parent_child_bounds]\nmother_age_min = 70\nmother_age_max = 66\n")
            .expect("write");
        assert!(load_config(Some(file.path())).is_err());
    }

    #[test]
    fn missing_input_file_is_reported() {
        let missing = Path::new("/definitely/not/here.json");
        assert!(matches!(
            load_people(missing),
            Err(LinealError::IoError(_))
        ));
    }

    #[test]
    fn output_path_requires_existing_parent() {
        let missing_dir = Path::new("/definitely/not/here/out.csv");
        assert!(validate_output_path(missing_dir).is_err());
    }
}
