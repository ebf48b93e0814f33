//! The seam between the viewer session and whatever draws it

use crate::facet::FacetLayout;
use crate::scene::Scene;
use crate::session::ViewerSession;
use vv_core::Result;

/// Something that can present a scene and run its interaction loop.
///
/// Both calls block until the user ends the session.
pub trait SceneRenderer {
    /// Single combined view with scalar cycling
    fn run(&mut self, session: &mut ViewerSession) -> Result<()>;

    /// Exploded view, one panel per scalar name
    fn run_facets(&mut self, scene: &Scene, layout: &FacetLayout) -> Result<()>;
}
