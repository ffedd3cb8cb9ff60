// nugs/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use colored::Colorize;
use tokio::sync::broadcast;
use tracing::{debug, instrument};

use nugs_common::dependency::{available_platforms, resolve, Resolution};
use nugs_common::error::{NugsError, Result};
use nugs_common::{Config, PackageSource, PackageVersion, TargetPlatform};
use nugs_core::{download_all, DownloadOptions, DownloadReport};
use nugs_net::NugetRegistry;

pub mod prompt;
pub mod render;

use prompt::FrameworkChoice;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "nugs", bin_name = "nugs")]
pub struct CliArgs {
    /// Package id, e.g. Newtonsoft.Json (prompted for when omitted)
    pub name: Option<String>,

    /// Package version, e.g. 13.0.1 (prompted for when omitted)
    #[arg(value_name = "VERSION")]
    pub package_version: Option<String>,

    /// Target framework whose dependency group is followed, e.g. net8.0
    #[arg(short, long)]
    pub framework: Option<String>,

    /// Directory the .nupkg files are written to
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Maximum number of simultaneous downloads
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Print the frameworks the package declares and exit
    #[arg(long)]
    pub list_frameworks: bool,

    /// Print the resolution and download report as JSON
    #[arg(long)]
    pub json: bool,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Root package and platform of one run.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub version: PackageVersion,
    pub platform: TargetPlatform,
}

impl CliArgs {
    /// Returns `Ok(false)` when there was something to download and every
    /// download failed.
    #[instrument(skip(self), fields(name = ?self.name, version = ?self.package_version))]
    pub async fn run(&self) -> Result<bool> {
        // With --json, stdout carries nothing but the document.
        let mut out = io::stdout();
        let mut human: Box<dyn Write> = if self.json {
            Box::new(io::stderr())
        } else {
            Box::new(io::stdout())
        };

        let name = match non_blank(self.name.as_deref()) {
            Some(name) => name,
            None => prompt::ask("Enter the package name")?,
        };
        if name.is_empty() {
            return Err(NugsError::InvalidInput("Package name cannot be empty.".into()));
        }
        let version = match non_blank(self.package_version.as_deref()) {
            Some(version) => version,
            None => prompt::ask("Enter the package version")?,
        };
        if version.is_empty() {
            return Err(NugsError::InvalidInput("Version cannot be empty.".into()));
        }
        let root_version: PackageVersion = version.parse()?;

        let mut config = Config::load()?;
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(jobs) = self.jobs {
            config.max_concurrent_downloads = jobs.max(1);
        }
        debug!("Effective configuration: {:?}", config);

        let registry: Arc<dyn PackageSource> = Arc::new(NugetRegistry::new(&config)?);

        if self.list_frameworks {
            let frameworks = available_platforms(registry.as_ref(), &name, &version).await?;
            if self.json {
                serde_json::to_writer_pretty(&mut out, &frameworks)?;
                writeln!(out)?;
            } else {
                render::print_frameworks(&mut out, &frameworks)?;
            }
            return Ok(true);
        }

        let platform = match &self.framework {
            Some(framework) => TargetPlatform::new(framework.as_str()),
            None => {
                let frameworks = available_platforms(registry.as_ref(), &name, &version).await?;
                match prompt::choose_framework(&frameworks) {
                    FrameworkChoice::NoneDeclared => {
                        writeln!(human, "No available frameworks found for this package.")?;
                        return Ok(true);
                    }
                    FrameworkChoice::Only(only) => {
                        writeln!(
                            human,
                            "Automatically selected the only available framework: {}",
                            only.bold()
                        )?;
                        TargetPlatform::new(only)
                    }
                    FrameworkChoice::Ask => match prompt::select_framework(&frameworks)? {
                        Some(selected) => TargetPlatform::new(selected),
                        None => {
                            writeln!(human, "No framework selected. Exiting program.")?;
                            return Ok(true);
                        }
                    },
                }
            }
        };

        let target = Target {
            name,
            version: root_version,
            platform,
        };
        self.execute(registry, &config, &target, &mut human, &mut out)
            .await
    }

    /// Resolves and downloads `target`. Status lines go to `human`; the final
    /// report (or the JSON document) goes to `out`.
    pub async fn execute(
        &self,
        source: Arc<dyn PackageSource>,
        config: &Config,
        target: &Target,
        human: &mut impl Write,
        out: &mut impl Write,
    ) -> Result<bool> {
        render::heading(
            human,
            &format!(
                "Collecting dependencies for {} {} ({})...",
                target.name, target.version, target.platform
            ),
        )?;
        let resolution = resolve(
            Arc::clone(&source),
            &target.name,
            &target.version.to_string(),
            &target.platform,
        )
        .await?;
        if !self.json {
            render::print_resolution(human, &resolution)?;
        }

        if resolution.resolved.is_empty() {
            writeln!(human, "Nothing to download.")?;
            if self.json {
                write_json(out, &resolution, &DownloadReport::default())?;
            }
            return Ok(false);
        }

        render::heading(
            human,
            &format!(
                "Downloading {} package(s) to {}",
                resolution.resolved.len(),
                config.output_dir().display()
            ),
        )?;
        let (event_tx, event_rx) = broadcast::channel(256);
        let progress = tokio::spawn(render::follow_events(event_rx, self.json));

        let options = DownloadOptions::from_config(config).with_events(event_tx);
        let report = download_all(source, &resolution.resolved, config.output_dir(), options).await;
        if let Err(e) = progress.await {
            debug!("Progress printer stopped early: {}", e);
        }

        if self.json {
            write_json(out, &resolution, &report)?;
        } else {
            render::print_report(out, &report)?;
        }

        Ok(!report.all_failed())
    }
}

fn write_json(out: &mut impl Write, resolution: &Resolution, report: &DownloadReport) -> Result<()> {
    let document = serde_json::json!({
        "resolution": resolution,
        "downloads": report,
    });
    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)?;
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use nugs_common::memory::MemorySource;

    const NET8: &str = "net8.0";

    fn chain_source() -> Arc<dyn PackageSource> {
        Arc::new(
            MemorySource::new()
                .package("Foo", "1.0", NET8, &[("Bar", "1.0")])
                .package("Bar", "1.0", NET8, &[]),
        )
    }

    fn foo_target() -> Target {
        Target {
            name: "Foo".to_string(),
            version: "1.0".parse().unwrap(),
            platform: TargetPlatform::new(NET8),
        }
    }

    #[test]
    fn parses_positional_and_flags() {
        let args = CliArgs::try_parse_from([
            "nugs",
            "Newtonsoft.Json",
            "13.0.1",
            "-f",
            "net8.0",
            "-o",
            "out",
            "-j",
            "4",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.name.as_deref(), Some("Newtonsoft.Json"));
        assert_eq!(args.package_version.as_deref(), Some("13.0.1"));
        assert_eq!(args.framework.as_deref(), Some("net8.0"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn version_flag_still_reports_the_tool_version() {
        let err = CliArgs::try_parse_from(["nugs", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn blank_arguments_count_as_missing() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some(" Foo ")), Some("Foo".to_string()));
        assert_eq!(non_blank(None), None);
    }

    #[tokio::test]
    async fn json_output_is_a_single_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_registration_url("https://example.test/reg", dir.path());
        let args = CliArgs::try_parse_from(["nugs", "Foo", "1.0", "--json"]).unwrap();
        let (mut human, mut out) = (Vec::new(), Vec::new());

        let ok = args
            .execute(chain_source(), &config, &foo_target(), &mut human, &mut out)
            .await
            .unwrap();

        assert!(ok);
        let document: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(document["resolution"]["resolved"]["Bar"], "1.0.0");
        assert_eq!(document["downloads"]["outcomes"].as_array().unwrap().len(), 2);
        let status = String::from_utf8(human).unwrap();
        assert!(status.contains("Collecting dependencies for Foo 1.0.0"));
        assert!(dir.path().join("bar.1.0.0.nupkg").is_file());
    }

    #[tokio::test]
    async fn plain_output_ends_with_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_registration_url("https://example.test/reg", dir.path());
        let args = CliArgs::try_parse_from(["nugs", "Foo", "1.0"]).unwrap();
        let (mut human, mut out) = (Vec::new(), Vec::new());

        let ok = args
            .execute(chain_source(), &config, &foo_target(), &mut human, &mut out)
            .await
            .unwrap();

        assert!(ok);
        assert!(String::from_utf8(human).unwrap().contains("Resolved 2 package(s):"));
        let report = String::from_utf8(out).unwrap();
        assert!(report.contains("Download completed! 2 succeeded, 0 failed."));
        assert!(serde_json::from_str::<serde_json::Value>(&report).is_err());
    }
}
