//! Verdict facade crate.
//!
//! This crate re-exports the core, flow, runtime and std crates with a single
//! entry point, plus file helpers for loading policies and exporting the
//! compiled programs for the lowering tool.

pub use verdict_core as core;
pub use verdict_flow as flow;
#[cfg(feature = "runtime")]
pub use verdict_runtime as runtime;
#[cfg(feature = "std")]
pub use verdict_std as std;

pub use verdict_core::{Expr, Schematic};
pub use verdict_flow::{AppPrograms, DecisionTable, StateBuilder};
#[cfg(feature = "runtime")]
pub use verdict_runtime::Ledger;

use ::std::path::Path;
use anyhow::Context;

pub mod prelude {
    pub use verdict_core::prelude::*;
    pub use verdict_flow::prelude::*;
    #[cfg(feature = "runtime")]
    pub use verdict_runtime::prelude::*;
    #[cfg(feature = "std")]
    pub use verdict_std::prelude::*;
}

/// Read a treasury policy file and compile the treasury programs for it.
#[cfg(feature = "std")]
pub fn load_treasury(path: impl AsRef<Path>) -> anyhow::Result<AppPrograms> {
    let path = path.as_ref();
    let source = ::std::fs::read_to_string(path)
        .with_context(|| format!("reading policy file {}", path.display()))?;
    let config = verdict_std::TreasuryConfig::from_toml_str(&source)
        .with_context(|| format!("parsing policy file {}", path.display()))?;
    let programs = verdict_std::treasury::treasury_app(config)
        .context("compiling treasury programs")?;
    tracing::info!(path = %path.display(), app = %programs.name, "policy loaded");
    Ok(programs)
}

/// Write `programs` as pretty-printed JSON.
pub fn export_programs(programs: &AppPrograms, path: impl AsRef<Path>) -> anyhow::Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(programs).context("serializing programs")?;
    ::std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Read programs written by [`export_programs`] and re-check them.
pub fn import_programs(path: impl AsRef<Path>) -> anyhow::Result<AppPrograms> {
    let path = path.as_ref();
    let source = ::std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let programs: AppPrograms = serde_json::from_str(&source)
        .with_context(|| format!("decoding programs from {}", path.display()))?;
    programs
        .validate()
        .with_context(|| format!("programs in {} failed validation", path.display()))?;
    Ok(programs)
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::{export_programs, import_programs, load_treasury};
    use ::std::io::Write;

    #[test]
    fn test_load_treasury_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "voting_duration = 30\nterm_duration = 60").unwrap();
        let programs = load_treasury(file.path()).unwrap();
        assert_eq!(programs.name, "treasury");
    }

    #[test]
    fn test_load_treasury_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "voting_duration = 0\nterm_duration = 60").unwrap();
        let err = load_treasury(file.path()).unwrap_err();
        assert!(err.to_string().contains("parsing policy file"));

        let missing = load_treasury("/nonexistent/policy.toml").unwrap_err();
        assert!(missing.to_string().contains("reading policy file"));
    }

    #[test]
    fn test_programs_survive_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("counter.json");
        let programs = verdict_std::counter::counter_app().unwrap();
        export_programs(&programs, &path).unwrap();
        assert_eq!(import_programs(&path).unwrap(), programs);
    }
}
