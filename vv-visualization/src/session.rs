//! Viewer session: the scene, the scalar cycle and the current display
//!
//! Renderers hold a `&mut ViewerSession` and feed it [`InteractionEvent`]s
//! instead of reaching back into meshes and windows themselves.

use crate::config::ViewerConfig;
use crate::cycler::ScalarCycler;
use crate::display::DisplayState;
use crate::scene::Scene;

/// Input after translation from keys or typed commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    AdvanceScalar,
    Quit,
    Ignored,
}

impl InteractionEvent {
    /// Terminal command line: empty, `space` or `n` advance, `q`/`quit` quit
    pub fn from_command(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "space" | "n" | "next" => InteractionEvent::AdvanceScalar,
            "q" | "quit" | "exit" => InteractionEvent::Quit,
            _ => InteractionEvent::Ignored,
        }
    }

    /// Single key as typed: space advances, `q` quits
    pub fn from_key(key: &str) -> Self {
        match key {
            " " => InteractionEvent::AdvanceScalar,
            "q" | "Q" => InteractionEvent::Quit,
            _ => InteractionEvent::Ignored,
        }
    }
}

/// What the event loop should do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    Redraw,
    Exit,
}

#[derive(Debug, Clone)]
pub struct ViewerSession {
    scene: Scene,
    cycler: ScalarCycler,
    display: DisplayState,
    config: ViewerConfig,
}

impl ViewerSession {
    /// Start showing the first scalar name, or `NoScalar` if the scene has none
    pub fn new(scene: Scene, config: ViewerConfig) -> Self {
        let cycler = ScalarCycler::new(scene.scalar_names());
        let display = DisplayState::for_scalar(&scene, cycler.current_name(), &config);
        log::debug!(
            "session started with {} mesh(es) and {} scalar name(s)",
            scene.len(),
            cycler.len()
        );
        Self {
            scene,
            cycler,
            display,
            config,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn cycler(&self) -> &ScalarCycler {
        &self.cycler
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    /// Recolour the scene with `scalar`, or revert to base colours with `None`
    pub fn recolor(&mut self, scalar: Option<&str>) -> &DisplayState {
        self.display = DisplayState::for_scalar(&self.scene, scalar, &self.config);
        &self.display
    }

    /// Advance the cycle and recolour. Returns false when there is nothing to cycle.
    pub fn advance(&mut self) -> bool {
        if !self.cycler.advance() {
            return false;
        }
        let name = self.cycler.current_name().map(str::to_string);
        log::info!("showing {}", name.as_deref().unwrap_or("no scalar"));
        self.recolor(name.as_deref());
        true
    }

    pub fn handle(&mut self, event: InteractionEvent) -> SessionControl {
        match event {
            InteractionEvent::AdvanceScalar => {
                if self.advance() {
                    SessionControl::Redraw
                } else {
                    SessionControl::Continue
                }
            }
            InteractionEvent::Quit => SessionControl::Exit,
            InteractionEvent::Ignored => SessionControl::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::tests::triangle_with;

    fn session() -> ViewerSession {
        let mut scene = Scene::new();
        scene.push("left", triangle_with(&[("B", [1.0, 2.0, 3.0])]));
        scene.push("right", triangle_with(&[("A", [0.0, 0.5, 1.0])]));
        ViewerSession::new(scene, ViewerConfig::default())
    }

    #[test]
    fn test_initial_state_shows_first_name() {
        let session = session();
        assert_eq!(session.display().active_scalar.as_deref(), Some("A"));
        assert_eq!(session.display().legend.title, "A");
        assert_eq!(session.display().legend.range, (0.0, 1.0));
    }

    #[test]
    fn test_advance_sequence() {
        let mut session = session();
        let mut seen = Vec::new();
        for _ in 0..3 {
            assert_eq!(session.handle(InteractionEvent::AdvanceScalar), SessionControl::Redraw);
            seen.push(session.display().active_scalar.clone());
        }
        assert_eq!(seen, vec![Some("B".to_string()), None, Some("A".to_string())]);
    }

    #[test]
    fn test_no_scalars_advance_is_no_op() {
        let mut scene = Scene::new();
        scene.push("plain", triangle_with(&[]));
        let mut session = ViewerSession::new(scene, ViewerConfig::default());
        let before = session.display().clone();
        assert_eq!(session.handle(InteractionEvent::AdvanceScalar), SessionControl::Continue);
        assert_eq!(session.display(), &before);
        assert_eq!(before.title, "VV mesh viewer");
    }

    #[test]
    fn test_recolor_twice_matches_once() {
        let mut session = session();
        let once = session.recolor(Some("B")).clone();
        let twice = session.recolor(Some("B")).clone();
        assert_eq!(once, twice);
        assert_eq!(twice.legend.title, "B");
    }

    #[test]
    fn test_event_translation() {
        assert_eq!(InteractionEvent::from_command(""), InteractionEvent::AdvanceScalar);
        assert_eq!(InteractionEvent::from_command(" n "), InteractionEvent::AdvanceScalar);
        assert_eq!(InteractionEvent::from_command("QUIT"), InteractionEvent::Quit);
        assert_eq!(InteractionEvent::from_command("zoom"), InteractionEvent::Ignored);
        assert_eq!(InteractionEvent::from_key(" "), InteractionEvent::AdvanceScalar);
        assert_eq!(InteractionEvent::from_key("x"), InteractionEvent::Ignored);
        let mut session = session();
        assert_eq!(session.handle(InteractionEvent::Quit), SessionControl::Exit);
    }
}
