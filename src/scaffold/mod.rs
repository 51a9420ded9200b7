//! Template scaffolding: copies the embedded guide documents into a repository.
//!
//! Existing files are kept unless `force` is set, in which case they are
//! moved into a timestamped backup directory before being replaced.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix of the directory holding files displaced by `force`.
pub const BACKUP_PREFIX: &str = ".adopt-backup-";

/// An embedded document and where it lands, relative to the target root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Asset {
    pub path: &'static str,
    pub contents: &'static str,
}

pub const AGENTS: Asset = Asset {
    path: "AGENTS.md",
    contents: include_str!("../../assets/AGENTS.md"),
};

pub const ARCHITECTURE: Asset = Asset {
    path: "architecture/ephemeral-app-template-plan.md",
    contents: include_str!("../../assets/architecture/ephemeral-app-template-plan.md"),
};

pub const SKILL: Asset = Asset {
    path: "codex/skills/adopt/SKILL.md",
    contents: include_str!("../../assets/codex/skills/adopt/SKILL.md"),
};

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub dir: PathBuf,
    pub force: bool,
    pub dry_run: bool,
    pub no_agents: bool,
    pub no_architecture: bool,
    pub no_skill: bool,
}

impl Options {
    /// Assets selected by the `no_*` switches, in write order.
    pub fn assets(&self) -> Vec<Asset> {
        [
            (!self.no_agents, AGENTS),
            (!self.no_architecture, ARCHITECTURE),
            (!self.no_skill, SKILL),
        ]
        .into_iter()
        .filter_map(|(wanted, asset)| wanted.then_some(asset))
        .collect()
    }
}

/// Long flags understood by the `adopt` CLI.
pub const FLAGS: &[&str] = &[
    "dir",
    "force",
    "dry-run",
    "no-agents",
    "no-architecture",
    "no-skill",
    "help",
];

/// Rewrite single-dash long flags (`-dir x`, `-dir=x`) to their `--` form.
///
/// Anything that is not a known flag name, and everything after `--`, is
/// passed through untouched.
pub fn long_flags<I, A>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = A>,
    A: Into<OsString>,
{
    let mut positional = false;
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if positional {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                positional = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                    if FLAGS.contains(&name) {
                        OsString::from(format!("-{text}"))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}

/// One reported step. `Display` gives the line printed by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Skip(String),
    Backup { path: String, backup: String },
    Write(String),
    BackupDir(PathBuf),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip(path) => write!(f, "skip (exists): {path}"),
            Action::Backup { path, backup } => write!(f, "backup: {path} -> {backup}"),
            Action::Write(path) => write!(f, "write: {path}"),
            Action::BackupDir(dir) => write!(f, "backup dir: {}", dir.display()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("target dir does not exist or is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ScaffoldError + '_ {
    move |source| ScaffoldError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy the selected assets into `options.dir`.
///
/// `timestamp` names the backup directory (`.adopt-backup-<timestamp>`).
/// Dry runs report each planned backup; real `force` runs report the
/// backup directory once at the end.
/// Each step is passed to `report` as it happens, so a failure part way
/// through still leaves an accurate account of what was done.
pub fn adopt(
    options: &Options,
    timestamp: &str,
    mut report: impl FnMut(Action),
) -> Result<(), ScaffoldError> {
    let root = fs::canonicalize(&options.dir)
        .ok()
        .filter(|path| path.is_dir())
        .ok_or_else(|| ScaffoldError::NotADirectory(options.dir.clone()))?;

    let backup_name = format!("{BACKUP_PREFIX}{timestamp}");
    let backup_root = root.join(&backup_name);

    for asset in options.assets() {
        let dest = root.join(asset.path);

        if dest.exists() {
            if !options.force {
                report(Action::Skip(asset.path.to_string()));
                continue;
            }

            let backup = backup_root.join(asset.path);
            if options.dry_run {
                report(Action::Backup {
                    path: asset.path.to_string(),
                    backup: format!("{backup_name}/{}", asset.path),
                });
            } else {
                if let Some(parent) = backup.parent() {
                    fs::create_dir_all(parent).map_err(io_error(parent))?;
                }
                fs::rename(&dest, &backup).map_err(io_error(&dest))?;
            }
        }

        if !options.dry_run {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            fs::write(&dest, asset.contents).map_err(io_error(&dest))?;
        }
        report(Action::Write(asset.path.to_string()));
    }

    if options.force && !options.dry_run {
        report(Action::BackupDir(backup_root));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(options: &Options) -> Vec<String> {
        let mut lines = Vec::new();
        adopt(options, "20260101_120000", |action| lines.push(action.to_string())).unwrap();
        lines
    }

    #[test]
    fn test_fresh_directory_gets_every_asset() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            dir: dir.path().to_path_buf(),
            ..Default::default()
        };

        assert_eq!(
            run(&options),
            vec![
                "write: AGENTS.md",
                "write: architecture/ephemeral-app-template-plan.md",
                "write: codex/skills/adopt/SKILL.md",
            ]
        );
        let written = fs::read_to_string(dir.path().join("codex/skills/adopt/SKILL.md")).unwrap();
        assert_eq!(written, SKILL.contents);
    }

    #[test]
    fn test_existing_file_is_skipped_without_force() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AGENTS.md"), "mine").unwrap();
        let options = Options {
            dir: dir.path().to_path_buf(),
            no_architecture: true,
            no_skill: true,
            ..Default::default()
        };

        assert_eq!(run(&options), vec!["skip (exists): AGENTS.md"]);
        assert_eq!(fs::read_to_string(dir.path().join("AGENTS.md")).unwrap(), "mine");
    }

    #[test]
    fn test_force_backs_up_before_overwriting() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AGENTS.md"), "mine").unwrap();
        let options = Options {
            dir: dir.path().to_path_buf(),
            force: true,
            no_architecture: true,
            no_skill: true,
            ..Default::default()
        };

        let lines = run(&options);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "write: AGENTS.md");
        assert!(lines[1].starts_with("backup dir: "));
        assert!(lines[1].ends_with(".adopt-backup-20260101_120000"));

        let backup = dir.path().join(".adopt-backup-20260101_120000/AGENTS.md");
        assert_eq!(fs::read_to_string(backup).unwrap(), "mine");
        assert_eq!(fs::read_to_string(dir.path().join("AGENTS.md")).unwrap(), AGENTS.contents);
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("AGENTS.md"), "mine").unwrap();
        let options = Options {
            dir: dir.path().to_path_buf(),
            force: true,
            dry_run: true,
            ..Default::default()
        };

        let lines = run(&options);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "backup: AGENTS.md -> .adopt-backup-20260101_120000/AGENTS.md");
        assert_eq!(lines[1], "write: AGENTS.md");
        assert!(!lines.iter().any(|line| line.starts_with("backup dir")));
        assert!(!dir.path().join("architecture").exists());
        assert_eq!(fs::read_to_string(dir.path().join("AGENTS.md")).unwrap(), "mine");
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let options = Options {
            dir: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        let err = adopt(&options, "x", |_| {}).unwrap_err();
        assert!(matches!(err, ScaffoldError::NotADirectory(_)));
        assert!(err.to_string().starts_with("target dir does not exist"));
    }

    #[test]
    fn test_single_dash_long_flags() {
        let args = long_flags(["adopt", "-dir", "repo", "-force", "-dry-run=true", "--no-skill"]);
        assert_eq!(
            args,
            vec!["adopt", "--dir", "repo", "--force", "--dry-run=true", "--no-skill"]
        );

        let args = long_flags(["adopt", "-dir=repo", "-x", "--", "-force"]);
        assert_eq!(args, vec!["adopt", "--dir=repo", "-x", "--", "-force"]);
    }
}
