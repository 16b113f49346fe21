use anyhow::{Context as _, Result};
use serde::Serialize;
use std::io::Write;

use crate::cli::{OutputFormat, VersionArgs};

const APP: &str = "bulk";

/// Build metadata, stamped at compile time when the environment provides it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub app: &'static str,
    pub version: String,
    pub commit: &'static str,
    pub timestamp: &'static str,
    pub system: &'static str,
    pub arch: &'static str,
}

impl BuildInfo {
    pub fn current() -> Self {
        Self {
            app: APP,
            version: format!("v{}", env!("CARGO_PKG_VERSION")),
            commit: option_env!("BULK_COMMIT").unwrap_or("dev"),
            timestamp: option_env!("BULK_BUILD_TIMESTAMP").unwrap_or("1970-01-01T00:00:00Z"),
            system: std::env::consts::OS,
            arch: std::env::consts::ARCH,
        }
    }

    pub fn write_text(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "{} {}", self.app, self.version)?;
        writeln!(out, "  commit:    {}", self.commit)?;
        writeln!(out, "  built:     {}", self.timestamp)?;
        writeln!(out, "  platform:  {}/{}", self.system, self.arch)?;
        Ok(())
    }

    pub fn write_json(&self, out: &mut impl Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self).context("Failed to serialize build info")?;
        writeln!(out)?;
        Ok(())
    }
}

pub fn run(args: VersionArgs) -> Result<()> {
    let info = BuildInfo::current();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => info.write_text(&mut out),
        OutputFormat::Json => info.write_json(&mut out),
    }
}
