//! # CLI Roundtrip Tests
//!
//! Drives the command implementations end to end against real files:
//! person records and configuration in, issue CSV and snapshot out,
//! then issues re-exported from the snapshot.

use lineal::cli::{cmd_check_config, cmd_enrich, cmd_issues};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const PEOPLE_JSON: &str = r#"[
    {
        "id": "@I1@",
        "name": "Ane Jensdatter",
        "sex": "F",
        "events": {
            "burial": {
                "date": {"year": 1950, "month": 1, "day": 10},
                "place": "Aalborg, Denmark"
            }
        }
    },
    {
        "id": "@I2@",
        "name": "Maren Sörensdatter",
        "sex": "F",
        "events": {
            "birth": {"date": {"year": 1966}}
        },
        "children": ["@I3@"]
    },
    {
        "id": "@I3@",
        "events": {
            "birth": {"date": {"year": 1975}}
        },
        "mother": "@I2@"
    },
    {
        "id": "@I4@",
        "events": {
            "birth": {"date": {"year": 1850}}
        }
    }
]"#;

const CONFIG_TOML: &str = r#"
max_iterations = 8

[implausible_age]
current_year = 2026
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("people.json"), PEOPLE_JSON).expect("write people");
        fs::write(dir.path().join("lineal.toml"), CONFIG_TOML).expect("write config");
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

#[test]
fn enrich_writes_issue_csv_and_snapshot() {
    let ws = Workspace::new();

    cmd_enrich(
        &ws.path("people.json"),
        Some(&ws.path("lineal.toml")),
        Some(&ws.path("issues.csv")),
        Some(&ws.path("run.lineal")),
        false,
    )
    .expect("enrich");

    let csv = fs::read_to_string(ws.path("issues.csv")).expect("read csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "person_id,severity,issue_type,message");
    // Burial-derived death, implausible age and the too-young mother.
    assert!(csv.contains("@I1@,info,inferred_death_from_burial"));
    assert!(csv.contains("@I4@,warning,implausible_age"));
    assert!(csv.contains("@I2@,warning,parent_too_young"));

    let snapshot = fs::read(ws.path("run.lineal")).expect("read snapshot");
    assert_eq!(&snapshot[4..8], b"LNEA");
}

#[test]
fn issues_command_reproduces_the_run_export() {
    let ws = Workspace::new();

    cmd_enrich(
        &ws.path("people.json"),
        Some(&ws.path("lineal.toml")),
        Some(&ws.path("issues.csv")),
        Some(&ws.path("run.lineal")),
        false,
    )
    .expect("enrich");

    cmd_issues(&ws.path("run.lineal"), Some(&ws.path("reexport.csv"))).expect("issues");

    let first = fs::read_to_string(ws.path("issues.csv")).expect("read");
    let second = fs::read_to_string(ws.path("reexport.csv")).expect("read");
    assert_eq!(first, second);
}

#[test]
fn enrich_is_deterministic_across_runs() {
    let ws = Workspace::new();

    for name in ["a.lineal", "b.lineal"] {
        cmd_enrich(
            &ws.path("people.json"),
            Some(&ws.path("lineal.toml")),
            Some(&ws.path("issues.csv")),
            Some(&ws.path(name)),
            false,
        )
        .expect("enrich");
    }

    let a = fs::read(ws.path("a.lineal")).expect("read");
    let b = fs::read(ws.path("b.lineal")).expect("read");
    assert_eq!(a, b);
}

#[test]
fn check_config_accepts_valid_and_rejects_broken() {
    let ws = Workspace::new();
    cmd_check_config(&ws.path("lineal.toml"), false).expect("valid config");

    fs::write(
        ws.path("broken.toml"),
        "[parent_child_bounds]\nmother_age_min = 70\nmother_age_max = 66\n",
    )
    .expect("write");
    assert!(cmd_check_config(&ws.path("broken.toml"), false).is_err());
}

#[test]
fn enrich_rejects_corrupt_input() {
    let ws = Workspace::new();
    fs::write(ws.path("bad.json"), "{not json").expect("write");

    let result = cmd_enrich(&ws.path("bad.json"), None, None, None, false);
    assert!(result.is_err());
}

#[test]
fn issues_rejects_corrupt_snapshot() {
    let ws = Workspace::new();
    fs::write(ws.path("bogus.lineal"), b"XXXXnot a snapshot").expect("write");

    assert!(cmd_issues(&ws.path("bogus.lineal"), None).is_err());
}
