//! Fixture repositories for the git-backed reports.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Create a working repository whose current branch is `branch`, ready
/// to receive commits.
pub fn init_repo(path: &Path, branch: &str) {
    fs::create_dir_all(path).expect("repo dir");
    git(path, &["init", "--quiet"], &[]);
    // Older gits lack `init -b`; pointing HEAD works everywhere.
    git(
        path,
        &["symbolic-ref", "HEAD", &format!("refs/heads/{branch}")],
        &[],
    );
    git(path, &["config", "user.name", "Fixture Author"], &[]);
    git(path, &["config", "user.email", "fixture@example.com"], &[]);
}

/// Add an empty commit with fixed author and committer dates, so log
/// date windows behave deterministically. `date` is `YYYY-MM-DD`.
pub fn commit(path: &Path, subject: &str, date: &str) {
    let stamp = format!("{date}T12:00:00+00:00");
    git(
        path,
        &["commit", "--allow-empty", "--quiet", "-m", subject],
        &[("GIT_AUTHOR_DATE", &stamp), ("GIT_COMMITTER_DATE", &stamp)],
    );
}

/// Hash of the current branch tip.
pub fn head_hash(path: &Path) -> String {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(path)
        .output()
        .expect("git rev-parse");
    assert!(
        output.status.success(),
        "git rev-parse failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn git(path: &Path, args: &[&str], envs: &[(&str, &str)]) {
    let output = Command::new("git")
        .args(args)
        .envs(envs.iter().copied())
        .current_dir(path)
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}
