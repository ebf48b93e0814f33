//! Text renderer: reports the display state and reads commands from a line source

use crate::display::{Coloring, DisplayState, Legend};
use crate::facet::FacetLayout;
use crate::renderer::SceneRenderer;
use crate::scene::Scene;
use crate::session::{InteractionEvent, SessionControl, ViewerSession};
use std::io::{self, BufRead, Write};
use vv_core::Result;

/// Renders to a writer and takes one command per line from a reader.
///
/// An empty line, `n` or `space` advances the scalar; `q` or end of input
/// ends the session.
pub struct TerminalRenderer<R, W> {
    input: R,
    output: W,
    interactive: bool,
}

impl TerminalRenderer<io::BufReader<io::Stdin>, io::Stdout> {
    /// Commands from standard input, output to standard output.
    ///
    /// Standard input is not locked until the first command is read.
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalRenderer<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            interactive: true,
        }
    }

    /// Print once and return without reading any commands
    pub fn non_interactive(mut self) -> Self {
        self.interactive = false;
        self
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn write_scene(&mut self, scene: &Scene) -> io::Result<()> {
        writeln!(self.output, "{} mesh(es)", scene.len())?;
        for (i, entry) in scene.iter().enumerate() {
            writeln!(
                self.output,
                "  [{}] {}: {} points, {} triangles",
                i,
                entry.name,
                entry.mesh.vertex_count(),
                entry.mesh.face_count()
            )?;
        }
        let names = scene.scalar_names();
        if names.is_empty() {
            writeln!(self.output, "scalars: none")
        } else {
            writeln!(self.output, "scalars: {}", names.join(", "))
        }
    }

    fn write_display(&mut self, scene: &Scene, display: &DisplayState) -> io::Result<()> {
        writeln!(self.output, "== {}", display.title)?;
        for (entry, coloring) in scene.iter().zip(&display.meshes) {
            write!(self.output, "  {}: ", entry.name)?;
            write_coloring(&mut self.output, coloring)?;
        }
        write_legend(&mut self.output, &display.legend)
    }

    fn write_layout(&mut self, scene: &Scene, layout: &FacetLayout) -> io::Result<()> {
        writeln!(
            self.output,
            "== {} ({} x {})",
            layout.title, layout.grid.cols, layout.grid.rows
        )?;
        for panel in &layout.panels {
            let v = panel.viewport;
            writeln!(
                self.output,
                "-- {} at [{:.3}, {:.3}] x [{:.3}, {:.3}]",
                panel.scalar, v.x_min, v.x_max, v.y_min, v.y_max
            )?;
            for (entry, coloring) in scene.iter().zip(&panel.meshes) {
                write!(self.output, "  {}: ", entry.name)?;
                write_coloring(&mut self.output, coloring)?;
            }
            match &panel.legend {
                Some(legend) => write_legend(&mut self.output, legend)?,
                None => writeln!(self.output, "  legend: none")?,
            }
        }
        Ok(())
    }

    fn next_event(&mut self) -> io::Result<Option<InteractionEvent>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(InteractionEvent::from_command(&line)))
    }

    fn wait_for_quit(&mut self) -> io::Result<()> {
        while let Some(event) = self.next_event()? {
            if event == InteractionEvent::Quit {
                break;
            }
        }
        Ok(())
    }
}

fn write_coloring<W: Write>(out: &mut W, coloring: &Coloring) -> io::Result<()> {
    match coloring {
        Coloring::Base([r, g, b]) => writeln!(out, "base colour ({:.3}, {:.3}, {:.3})", r, g, b),
        Coloring::Scalar { name, range } => {
            writeln!(out, "{} over [{}, {}]", name, range.0, range.1)
        }
    }
}

fn write_legend<W: Write>(out: &mut W, legend: &Legend) -> io::Result<()> {
    if !legend.is_visible() {
        return writeln!(out, "  legend: hidden");
    }
    let labels: Vec<String> = legend
        .label_values()
        .iter()
        .map(|v| format!("{:.4}", v))
        .collect();
    writeln!(out, "  legend: {} [{}]", legend.title, labels.join(" | "))
}

impl<R: BufRead, W: Write> SceneRenderer for TerminalRenderer<R, W> {
    fn run(&mut self, session: &mut ViewerSession) -> Result<()> {
        self.write_scene(session.scene())?;
        self.write_display(session.scene(), session.display())?;
        if !self.interactive {
            return Ok(());
        }
        if !session.cycler().is_empty() {
            writeln!(self.output, "enter: next scalar, q: quit")?;
        }
        self.output.flush()?;

        while let Some(event) = self.next_event()? {
            match session.handle(event) {
                SessionControl::Exit => break,
                SessionControl::Redraw => {
                    self.write_display(session.scene(), session.display())?;
                    self.output.flush()?;
                }
                SessionControl::Continue => {}
            }
        }
        log::debug!("terminal session ended");
        Ok(())
    }

    fn run_facets(&mut self, scene: &Scene, layout: &FacetLayout) -> Result<()> {
        self.write_scene(scene)?;
        self.write_layout(scene, layout)?;
        self.output.flush()?;
        if self.interactive {
            self.wait_for_quit()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::scene::tests::triangle_with;
    use std::io::Cursor;

    fn scene() -> Scene {
        let mut scene = Scene::new();
        scene.push("heart.vtk", triangle_with(&[("A", [0.0, 1.0, 2.0]), ("B", [3.0; 3])]));
        scene
    }

    fn run_with(commands: &str) -> String {
        let mut session = ViewerSession::new(scene(), ViewerConfig::default());
        let mut renderer = TerminalRenderer::new(Cursor::new(commands.to_string()), Vec::new());
        renderer.run(&mut session).unwrap();
        String::from_utf8(renderer.into_output()).unwrap()
    }

    #[test]
    fn test_cycles_until_quit() {
        let out = run_with("\nn\n\nq\nn\n");
        let titles: Vec<&str> = out.lines().filter(|l| l.starts_with("== ")).collect();
        assert_eq!(
            titles,
            vec![
                "== VV mesh viewer - A",
                "== VV mesh viewer - B",
                "== VV mesh viewer - No Scalars",
                "== VV mesh viewer - A",
            ]
        );
        assert!(out.contains("legend: A [0.0000 | 0.5000 | 1.0000 | 1.5000 | 2.0000]"));
        assert!(out.contains("legend: hidden"));
    }

    #[test]
    fn test_stops_at_end_of_input() {
        let out = run_with("n\n");
        assert!(out.contains("heart.vtk: 3 points, 1 triangles"));
        assert!(out.contains("scalars: A, B"));
        assert_eq!(out.lines().filter(|l| l.starts_with("== ")).count(), 2);
    }

    #[test]
    fn test_ignored_commands_do_not_redraw() {
        let out = run_with("zoom\nrotate\n");
        assert_eq!(out.lines().filter(|l| l.starts_with("== ")).count(), 1);
    }

    #[test]
    fn test_facet_output() {
        let scene = scene();
        let layout = FacetLayout::build(&scene, &ViewerConfig::default()).unwrap();
        let mut renderer =
            TerminalRenderer::new(Cursor::new(String::new()), Vec::new()).non_interactive();
        renderer.run_facets(&scene, &layout).unwrap();
        let out = String::from_utf8(renderer.into_output()).unwrap();
        assert!(out.contains("== VV mesh viewer - Exploded (facet) view (2 x 1)"));
        assert!(out.contains("-- A at [0.000, 0.500] x [0.000, 1.000]"));
        assert!(out.contains("legend: A [0.0000 | 0.6667 | 1.3333 | 2.0000]"));
        assert!(out.contains("-- B at [0.500, 1.000]"));
        assert!(out.contains("legend: none"));
    }
}
