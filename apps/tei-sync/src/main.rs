//! tei-sync - reconcile a Zotero export with a TEI bibliography
//!
//! Reads a CSL-JSON export and a TEI file, updates each matching
//! `biblStruct`'s imprint date and bibliographic note, and rewrites the TEI
//! file only if something changed. Failures are logged; the exit status is
//! non-zero only for unusable arguments or configuration.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use impress_tei::{logging, ConfigError, MatchPolicy, SyncConfig};

#[derive(Debug, Parser)]
#[command(name = "tei-sync", version, about)]
struct Cli {
    /// CSL-JSON bibliography export
    #[arg(long, env = "TEI_SYNC_SOURCE")]
    source: Option<PathBuf>,

    /// TEI document to update in place
    #[arg(long, env = "TEI_SYNC_TARGET")]
    target: Option<PathBuf>,

    /// TOML config file; flags given here take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// How to treat an item key that matches several entries
    #[arg(long, value_enum)]
    match_policy: Option<PolicyArg>,

    /// Skip the note too when an entry has no <imprint>
    #[arg(long, overrides_with = "no_couple_note_to_imprint")]
    couple_note_to_imprint: bool,

    /// Patch notes independently of <imprint>
    #[arg(long, overrides_with = "couple_note_to_imprint")]
    no_couple_note_to_imprint: bool,

    /// Report changes without writing the TEI file
    #[arg(long, overrides_with = "no_dry_run")]
    dry_run: bool,

    /// Write the TEI file even if the config file asks for a dry run
    #[arg(long, overrides_with = "dry_run")]
    no_dry_run: bool,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// First match in document order
    First,
    /// Abort when a key is ambiguous
    Unique,
}

impl From<PolicyArg> for MatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::First => MatchPolicy::First,
            PolicyArg::Unique => MatchPolicy::Unique,
        }
    }
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<SyncConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => SyncConfig::load(path)?,
            None => SyncConfig::default(),
        };

        if let Some(source) = &self.source {
            config.source_path = source.clone();
        }
        if let Some(target) = &self.target {
            config.target_path = target.clone();
        }
        if let Some(policy) = self.match_policy {
            config.match_policy = policy.into();
        }
        if let Some(couple) = switch(self.couple_note_to_imprint, self.no_couple_note_to_imprint) {
            config.couple_note_to_imprint = couple;
        }
        if let Some(dry_run) = switch(self.dry_run, self.no_dry_run) {
            config.dry_run = dry_run;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Value of a `--flag` / `--no-flag` pair, `None` when neither was given.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = impress_tei::run(&config) {
        tracing::error!("{}", e);
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "tei-sync",
            "--source",
            "sanders.json",
            "--target",
            "sanders.xml",
            "--match-policy",
            "unique",
            "--dry-run",
        ])
        .unwrap();

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.source_path, PathBuf::from("sanders.json"));
        assert_eq!(config.target_path, PathBuf::from("sanders.xml"));
        assert_eq!(config.match_policy, MatchPolicy::Unique);
        assert!(config.dry_run);
        assert!(!config.couple_note_to_imprint);
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tei-sync.toml");
        std::fs::write(
            &path,
            "source_path = \"file.json\"\ntarget_path = \"file.xml\"\nmatch_policy = \"unique\"\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "tei-sync",
            "--config",
            path.to_str().unwrap(),
            "--target",
            "flag.xml",
            "--couple-note-to-imprint",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.source_path, PathBuf::from("file.json"));
        assert_eq!(config.target_path, PathBuf::from("flag.xml"));
        assert_eq!(config.match_policy, MatchPolicy::Unique);
        assert!(config.couple_note_to_imprint);
    }

    #[test]
    fn test_no_flags_switch_off_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tei-sync.toml");
        std::fs::write(&path, "couple_note_to_imprint = true\ndry_run = true\n").unwrap();
        let config_arg = path.to_str().unwrap();

        let unchanged = Cli::try_parse_from(["tei-sync", "--config", config_arg])
            .unwrap()
            .resolve_config()
            .unwrap();
        assert!(unchanged.couple_note_to_imprint);
        assert!(unchanged.dry_run);

        let cli = Cli::try_parse_from([
            "tei-sync",
            "--config",
            config_arg,
            "--no-couple-note-to-imprint",
            "--no-dry-run",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();
        assert!(!config.couple_note_to_imprint);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_last_of_flag_pair_wins() {
        let cli = Cli::try_parse_from(["tei-sync", "--dry-run", "--no-dry-run"]).unwrap();
        assert!(!cli.resolve_config().unwrap().dry_run);

        let cli = Cli::try_parse_from(["tei-sync", "--no-dry-run", "--dry-run"]).unwrap();
        assert!(cli.resolve_config().unwrap().dry_run);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        assert!(Cli::try_parse_from(["tei-sync", "--match-policy", "last"]).is_err());
    }
}
