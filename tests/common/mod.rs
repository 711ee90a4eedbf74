#![allow(dead_code)]

use assert_cmd::Command;
use chrono::Utc;
use serde_json::{Value, json};
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::info;

use tracker_metrics::fetch::{FetchCache, Request};

pub mod git;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        tracker_metrics::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

#[derive(Debug)]
pub struct TmRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
}

impl TmRun {
    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}

/// An isolated data directory plus a scratch working directory, torn
/// down with the test.
pub struct TmWorkspace {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TmWorkspace {
    pub fn new() -> Self {
        init_test_logging();
        let temp_dir = TempDir::new().expect("temp dir");
        let data_dir = temp_dir.path().join("data");
        fs::create_dir_all(&data_dir).expect("data dir");
        Self { temp_dir, data_dir }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("issue_data.sqlite")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.data_dir.join("repos")
    }

    pub fn repo_path(&self, dir_name: &str) -> PathBuf {
        self.repos_dir().join(dir_name)
    }

    /// Seed this week's full cache for every sub-query of `request`,
    /// taking the items for each key from `pages`. Keys without an
    /// entry get an empty result, so a fetch-first command still sees
    /// every sub-query as complete.
    pub fn seed_full_cache(&self, request: &dyn Request, pages: &[(&str, Vec<Value>)]) {
        let cache = FetchCache::new(&self.cache_dir());
        for (key, url) in request.urls() {
            let items = pages
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, items)| items.clone())
                .unwrap_or_default();
            cache
                .write_full(&url, &items)
                .expect("seed full cache entry");
        }
    }
}

pub fn run_tm<I, S>(workspace: &TmWorkspace, args: I) -> TmRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tm_with_env(workspace, args, std::iter::empty::<(String, String)>())
}

pub fn run_tm_with_env<I, S, E, K, V>(workspace: &TmWorkspace, args: I, env_vars: E) -> TmRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tm"));
    cmd.current_dir(workspace.temp_dir.path());
    cmd.arg("--data-dir").arg(&workspace.data_dir);
    cmd.args(args);
    // The ambient environment must not leak a real data directory in.
    cmd.env_remove("TRACKER_METRICS_DIR");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "tracker_metrics=debug");
    cmd.env("RUST_BACKTRACE", "1");

    run_command(cmd)
}

/// Run without the implicit `--data-dir` flag, for tests that exercise
/// environment and default resolution.
pub fn run_tm_bare<I, S, E, K, V>(workspace: &TmWorkspace, args: I, env_vars: E) -> TmRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tm"));
    cmd.current_dir(workspace.temp_dir.path());
    cmd.args(args);
    cmd.env_remove("TRACKER_METRICS_DIR");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "tracker_metrics=debug");
    cmd.env("RUST_BACKTRACE", "1");

    run_command(cmd)
}

fn run_command(mut cmd: Command) -> TmRun {
    let start = Instant::now();
    let output = cmd.output().expect("run tm");
    let duration = start.elapsed();

    TmRun {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status,
        duration,
    }
}

/// One issue as the list endpoint serves it, numeric fields as strings
/// included, so tests cover the lenient decoding path end to end.
pub struct IssueSeed {
    pub id: i64,
    pub title: String,
    pub component: String,
    pub category: i64,
    pub priority: i64,
    pub status: i64,
    pub version: String,
    pub created: i64,
    pub changed: i64,
    pub status_changed: i64,
    pub tags: Vec<i64>,
}

impl Default for IssueSeed {
    fn default() -> Self {
        Self {
            id: 3_000_001,
            title: "Example issue".to_string(),
            component: "base system".to_string(),
            category: 1,
            priority: 400,
            status: 1,
            version: "11.x-dev".to_string(),
            created: 1_650_000_000,
            changed: 1_655_000_000,
            status_changed: 1_655_000_000,
            tags: Vec::new(),
        }
    }
}

impl IssueSeed {
    pub fn json(&self) -> Value {
        json!({
            "nid": self.id.to_string(),
            "title": self.title,
            "field_issue_component": self.component,
            "field_issue_category": self.category.to_string(),
            "field_issue_priority": self.priority.to_string(),
            "field_issue_status": self.status.to_string(),
            "field_issue_version": self.version,
            "created": self.created.to_string(),
            "changed": self.changed.to_string(),
            "field_issue_last_status_change": self.status_changed.to_string(),
            "taxonomy_vocabulary_9": self.tags
                .iter()
                .map(|id| json!({"id": id.to_string()}))
                .collect::<Vec<_>>(),
        })
    }
}

/// This week's cache key suffix, handy when asserting on cache files.
pub fn current_week_suffix() -> String {
    tracker_metrics::util::time::week_stamp(Utc::now())
}
