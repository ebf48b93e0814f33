//! vv - command-line mesh viewer
//!
//! Usage: vv <MESHFILE>... [-e|--explode] [-v|--version] [-h|--help]
//!
//! Exit codes: 0 success, 1 usage error or missing file, 2 no parser
//! matched, 3 parse failure, 5 stdin could not be staged.

use clap::Parser;
use std::process::ExitCode;

use vv::app;
use vv::cli::{self, Cli, CliError};
use vv::config::Config;
use vv_visualization::{SceneRenderer, TerminalRenderer};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // A closed stdout or stderr leaves nothing to report to
            e.print().ok();
            return ExitCode::from(cli::parse_error_code(&e));
        }
    };

    if cli.version {
        println!("{}", Cli::version_line());
        return ExitCode::SUCCESS;
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let CliError::NoParser {
                header: Some(header),
                ..
            } = &e
            {
                eprintln!("Input header:\n{}", header);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path).map_err(CliError::Config)?,
        None => Config::default(),
    };
    let mut renderer = renderer(cli, &config);
    app::run(cli, &config, std::io::stdin(), renderer.as_mut())
}

#[cfg(feature = "window")]
fn renderer(cli: &Cli, config: &Config) -> Box<dyn SceneRenderer> {
    if cli.headless {
        Box::new(TerminalRenderer::stdio())
    } else {
        Box::new(vv_visualization::WindowRenderer::new(config.viewer.clone()))
    }
}

#[cfg(not(feature = "window"))]
fn renderer(cli: &Cli, _config: &Config) -> Box<dyn SceneRenderer> {
    // reading `-` consumes stdin, so the terminal session gets no commands
    if cli.headless || cli.files.iter().any(|f| f == vv::cli::STDIN_NAME) {
        Box::new(TerminalRenderer::stdio().non_interactive())
    } else {
        Box::new(TerminalRenderer::stdio())
    }
}
