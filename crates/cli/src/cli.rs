//! Command line arguments and the top-level run.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use font_instancer::{AxisLocation, Options, Outcome, Selection, VariableFont, run_font};
use log::{LevelFilter, error, info};

use crate::{info::describe, io::FontFile, sample};

#[derive(Debug, Parser)]
#[command(name = "vfsplit", version)]
#[command(about = "Write the instances of a variable font as static fonts")]
pub struct Cli {
    /// Input variable font (TrueType outlines)
    pub font: PathBuf,

    /// Directory for the static fonts, created if missing
    #[arg(required_unless_present = "info")]
    pub output_dir: Option<PathBuf>,

    /// Build a single instance at TAG=VALUE (e.g. wght=700) instead of
    /// every named instance
    #[arg(value_name = "TAG=VALUE", value_parser = parse_location)]
    pub locations: Vec<AxisLocation>,

    /// Number of worker threads (default: all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Show axes and named instances, then exit
    #[arg(long)]
    pub info: bool,

    /// Warn when a value lies outside its axis range
    #[arg(long)]
    pub warn_clamped: bool,

    /// Copy the name table unchanged
    #[arg(long)]
    pub keep_names: bool,

    /// Do not write sample.html
    #[arg(long)]
    pub no_sample: bool,

    /// Only report errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More log output (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_location(arg: &str) -> Result<AxisLocation, String> {
    AxisLocation::parse(arg).ok_or_else(|| format!("expected TAG=VALUE with a 1-4 letter tag, got '{arg}'"))
}

impl Cli {
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    pub fn options(&self) -> Options {
        Options::new()
            .warn_on_clamp(self.warn_clamped)
            .update_names(!self.keep_names)
    }

    pub fn selection(&self) -> Selection {
        if self.locations.is_empty() {
            Selection::NamedInstances
        } else {
            Selection::Location(self.locations.clone())
        }
    }

    /// Run the command. Fails when the font cannot be used or any instance
    /// failed.
    pub fn run(self) -> Result<()> {
        if let Some(jobs) = self.jobs {
            rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build_global()
                .context("Failed to configure worker threads")?;
        }

        let input = FontFile::new(&self.font);
        let data = input.read()?;
        let font = VariableFont::load(&data)
            .with_context(|| format!("Failed to load {}", self.font.display()))?;

        if self.info {
            print!("{}", describe(&font));
            return Ok(());
        }
        let Some(output_dir) = &self.output_dir else {
            bail!("No output directory given");
        };
        FontFile::ensure_dir(output_dir)?;

        let report = run_font(&font, &self.selection(), &self.options());

        let mut written = Vec::new();
        for instance in &report.instances {
            match &instance.outcome {
                Outcome::Built(bytes) => {
                    let output = FontFile::new(output_dir.join(&instance.file_name));
                    output.write(bytes)?;
                    if !self.quiet {
                        println!("Wrote {}", output.path().display());
                    }
                    written.push(&instance.names);
                }
                Outcome::Failed(err) => error!("{}: {err}", instance.label),
                Outcome::Skipped => {}
            }
        }

        if !self.no_sample && !written.is_empty() {
            let path = output_dir.join(sample::FILE_NAME);
            FontFile::new(&path).write(sample::page(written))?;
            info!("Sample page written to {}", path.display());
        }

        let failed = report.failed().count();
        if failed > 0 {
            bail!("{failed} of {} instances failed", report.instances.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vfsplit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn named_instances_by_default() {
        let cli = parse(&["Font.ttf", "out"]);
        assert_eq!(cli.selection(), Selection::NamedInstances);
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.log_level(), LevelFilter::Warn);
    }

    #[test]
    fn locations_select_one_instance() {
        let cli = parse(&["Font.ttf", "out", "wght=700", "wdth=87.5"]);
        assert_eq!(
            cli.selection(),
            Selection::Location(vec![AxisLocation::new("wght", 700.0), AxisLocation::new("wdth", 87.5)])
        );
    }

    #[test]
    fn rejects_malformed_locations() {
        let args = ["vfsplit", "Font.ttf", "out", "weight=700"];
        assert!(Cli::try_parse_from(args).is_err());
        let args = ["vfsplit", "Font.ttf", "out", "wght"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn output_dir_is_optional_for_info() {
        let cli = parse(&["Font.ttf", "--info"]);
        assert!(cli.info);
        assert!(Cli::try_parse_from(["vfsplit", "Font.ttf"]).is_err());
    }

    #[test]
    fn flags_map_to_options() {
        let cli = parse(&["Font.ttf", "out", "--keep-names", "--warn-clamped", "-j", "2"]);
        let options = cli.options();
        assert!(!options.update_names);
        assert!(options.warn_on_clamp);
        assert_eq!(cli.jobs, Some(2));
    }

    #[test]
    fn verbosity() {
        assert_eq!(parse(&["Font.ttf", "out", "-q"]).log_level(), LevelFilter::Error);
        assert_eq!(parse(&["Font.ttf", "out", "-vv"]).log_level(), LevelFilter::Debug);
        assert!(Cli::try_parse_from(["vfsplit", "Font.ttf", "out", "-q", "-v"]).is_err());
    }
}
