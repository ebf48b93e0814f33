//! One viewer run: stage, dispatch, parse, build the scene and present it

use crate::cli::{Cli, CliError, STDIN_NAME};
use crate::config::Config;
use std::io::Read;
use std::path::Path;
use vv_core::TriangleMesh;
use vv_io::{stage, ParserRegistry};
use vv_visualization::{build_scene, FacetLayout, Scene, SceneRenderer, ViewerSession};

/// Read every mesh in one input.
///
/// `-` stages `stdin` to a temporary file that is removed before this
/// returns, whatever the outcome.
pub fn load_input<R: Read>(
    name: &str,
    registry: &ParserRegistry,
    stdin: R,
    header_bytes: usize,
) -> Result<Vec<TriangleMesh>, CliError> {
    if name == STDIN_NAME {
        let staged = stage(stdin, header_bytes).map_err(CliError::Staging)?;
        log::info!("standard input sniffed as {}", staged.tag());
        let meshes = match registry.select(staged.path()) {
            Some(parser) => parser.parse(staged.path()),
            None => {
                return Err(CliError::NoParser {
                    name: name.to_string(),
                    header: Some(staged.header_lossy().into_owned()),
                })
            }
        };
        if let Err(e) = staged.close() {
            log::warn!("{}", e);
        }
        return non_empty(name, meshes);
    }

    let path = Path::new(name);
    if !path.exists() {
        return Err(CliError::FileNotFound(name.to_string()));
    }
    let parser = registry.select(path).ok_or_else(|| CliError::NoParser {
        name: name.to_string(),
        header: None,
    })?;
    log::info!("reading {} as {}", name, parser.format_name());
    non_empty(name, parser.parse(path))
}

fn non_empty(name: &str, meshes: Vec<TriangleMesh>) -> Result<Vec<TriangleMesh>, CliError> {
    if meshes.is_empty() {
        Err(CliError::ParseFailed(name.to_string()))
    } else {
        Ok(meshes)
    }
}

/// Load every selected input into one scene, each mesh named after its file.
///
/// Any failing input aborts the whole run.
pub fn load_scene<R: Read>(
    inputs: &[String],
    registry: &ParserRegistry,
    mut stdin: R,
    header_bytes: usize,
) -> Result<Scene, CliError> {
    let mut meshes = Vec::new();
    let mut names = Vec::new();
    for name in inputs {
        let loaded = load_input(name, registry, &mut stdin, header_bytes)?;
        names.extend(std::iter::repeat(name.clone()).take(loaded.len()));
        meshes.extend(loaded);
    }
    Ok(build_scene(meshes, names)?)
}

/// Show the scene, exploded into facets when asked and there are scalars
pub fn present(
    scene: Scene,
    explode: bool,
    config: &Config,
    renderer: &mut dyn SceneRenderer,
) -> Result<(), CliError> {
    if explode {
        match FacetLayout::build(&scene, &config.viewer) {
            Some(layout) => {
                renderer.run_facets(&scene, &layout)?;
                return Ok(());
            }
            None => log::info!("no scalars to explode; using the single view"),
        }
    }
    let mut session = ViewerSession::new(scene, config.viewer.clone());
    renderer.run(&mut session)?;
    Ok(())
}

/// Load the configured inputs and present them with `renderer`
pub fn run<R: Read>(
    cli: &Cli,
    config: &Config,
    stdin: R,
    renderer: &mut dyn SceneRenderer,
) -> Result<(), CliError> {
    let inputs = cli.inputs()?;
    let registry = ParserRegistry::with_default_parsers(config.io.header_bytes);
    let scene = load_scene(&inputs, &registry, stdin, config.io.header_bytes)?;
    log::info!(
        "loaded {} mesh(es) from {} input(s)",
        scene.len(),
        inputs.len()
    );
    present(scene, cli.explode, config, renderer)
}
