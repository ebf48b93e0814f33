//! Command-line surface and exit codes

use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Name used on the command line for "read one mesh from standard input"
pub const STDIN_NAME: &str = "-";

/// vv - view surface meshes and cycle through their per-point scalars
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "vv")]
#[command(author, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Mesh files to show; `-` reads one mesh from standard input
    #[arg(value_name = "MESHFILE")]
    pub files: Vec<String>,

    /// Show one panel per scalar instead of a single view
    #[arg(short = 'e', long)]
    pub explode: bool,

    /// Print the version and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    /// Verbosity level (--verbose for info, twice for debug)
    #[arg(long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Load viewer settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the scene to the terminal instead of opening a window
    #[arg(long)]
    pub headless: bool,
}

impl Cli {
    pub fn version_line() -> String {
        format!("vv version {}", env!("CARGO_PKG_VERSION"))
    }

    /// `warn` by default, raised by each `--verbose`
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// The files this run will read.
    ///
    /// Without `--explode` only the first file is used. `-` may appear once.
    pub fn inputs(&self) -> Result<Vec<String>, CliError> {
        if self.files.is_empty() {
            return Err(CliError::Usage("no mesh file given".to_string()));
        }
        if self.files.iter().filter(|f| f.as_str() == STDIN_NAME).count() > 1 {
            return Err(CliError::Usage(
                "standard input (-) can only be read once".to_string(),
            ));
        }
        if !self.explode && self.files.len() > 1 {
            log::warn!(
                "{} files given without --explode; showing only {}",
                self.files.len(),
                self.files[0]
            );
            return Ok(self.files[..1].to_vec());
        }
        Ok(self.files.clone())
    }
}

/// Exit code for an argument error from clap: help and version requests succeed
pub fn parse_error_code(error: &clap::Error) -> u8 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

/// Everything that ends a run early, each with its own exit code
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error("File does not exist: {0}")]
    FileNotFound(String),

    #[error("No suitable parser found for file: {name}")]
    NoParser {
        name: String,
        /// Sniffed head of piped input, echoed for diagnosis
        header: Option<String>,
    },

    #[error("Failed to parse mesh: {0}")]
    ParseFailed(String),

    #[error("Failed to create temp file for stdin: {0}")]
    Staging(#[source] vv_io::IoError),

    #[error("Invalid configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("Viewer error: {0}")]
    Render(#[from] vv_core::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Usage(_) | CliError::FileNotFound(_) => 1,
            CliError::NoParser { .. } => 2,
            CliError::ParseFailed(_) => 3,
            CliError::Staging(_) => 5,
            CliError::Config(_) | CliError::Render(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags() {
        let parsed = cli(&["a.vtk", "b.vtk", "-e", "--verbose", "--verbose"]);
        assert_eq!(parsed.files, vec!["a.vtk", "b.vtk"]);
        assert!(parsed.explode);
        assert_eq!(parsed.log_level(), "debug");
        assert!(cli(&["-v"]).version);
        assert!(cli(&["--version"]).version);
        assert_eq!(cli(&["-"]).files, vec!["-"]);
    }

    #[test]
    fn test_help_is_not_a_failure() {
        let err = Cli::try_parse_from(["vv", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(parse_error_code(&err), 0);

        let err = Cli::try_parse_from(["vv", "--bogus"]).unwrap_err();
        assert_eq!(parse_error_code(&err), 1);
        let err = Cli::try_parse_from(["vv", "--config"]).unwrap_err();
        assert_eq!(parse_error_code(&err), 1);
    }

    #[test]
    fn test_inputs() {
        assert_eq!(cli(&["a", "b"]).inputs().unwrap(), vec!["a"]);
        assert_eq!(cli(&["a", "b", "--explode"]).inputs().unwrap(), vec!["a", "b"]);
        assert!(matches!(cli(&[]).inputs(), Err(CliError::Usage(_))));
        assert!(matches!(
            cli(&["-", "-", "-e"]).inputs(),
            Err(CliError::Usage(_))
        ));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage(String::new()).exit_code(), 1);
        assert_eq!(CliError::FileNotFound("x".into()).exit_code(), 1);
        assert_eq!(
            CliError::NoParser { name: "x".into(), header: None }.exit_code(),
            2
        );
        assert_eq!(CliError::ParseFailed("x".into()).exit_code(), 3);
        let staging = vv_io::IoError::Staging {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert_eq!(CliError::Staging(staging).exit_code(), 5);
        assert_eq!(Cli::version_line(), format!("vv version {}", env!("CARGO_PKG_VERSION")));
    }
}
