//! Directional label placement
//!
//! Every frame, nodes that sit roughly sideways to the view direction get a
//! cue on the screen edge they lie beyond. Candidates are ranked by how close
//! they are to coming into view, spread out along their edge so no two cues
//! overlap, and finally reconciled against the labels already on screen so an
//! existing label keeps its identity (and click binding) while it stays
//! eligible.

use glam::Vec2;
use std::collections::BTreeMap;

use crate::geometry::{Camera, SphereTransform, Viewport};
use crate::palette::{Palette, Rgb};
use crate::registry::{Node, Registry};

/// Eligibility band, degrees between view direction and node direction (exclusive)
pub const BAND_MIN: f32 = 60.0;
pub const BAND_MAX: f32 = 120.0;

/// Horizontal inset of left labels and lower bound for top/bottom labels
const INSET_X: f32 = 20.0;
/// Space reserved for a label's width at the right edge
const LABEL_WIDTH: f32 = 250.0;
/// Vertical inset for left/right labels and the row of top labels
const INSET_Y: f32 = 80.0;
/// Row of bottom labels, measured from the bottom
const BOTTOM_ROW: f32 = 60.0;
/// Top/bottom labels are shifted left so they read centered on the node
const LABEL_HALF_WIDTH: f32 = 100.0;
/// Probes per side when a preferred slot is taken
const MAX_PROBES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl Edge {
    pub fn glyph(self) -> char {
        match self {
            Edge::Left => '<',
            Edge::Right => '>',
            Edge::Top => '^',
            Edge::Bottom => 'v',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Edge::Left => "left",
            Edge::Right => "right",
            Edge::Top => "top",
            Edge::Bottom => "bottom",
        }
    }

    /// Side edges stack labels vertically
    pub fn is_side(self) -> bool {
        matches!(self, Edge::Left | Edge::Right)
    }

    /// Minimum distance between two labels along this edge
    pub fn spacing(self) -> f32 {
        if self.is_side() {
            40.0
        } else {
            150.0
        }
    }

    /// Furthest a label may be pushed from its preferred slot
    pub fn reach(self) -> f32 {
        if self.is_side() {
            200.0
        } else {
            400.0
        }
    }

    /// Valid range of the free coordinate
    pub fn free_range(self, viewport: &Viewport) -> (f32, f32) {
        if self.is_side() {
            (INSET_Y, viewport.height - INSET_Y)
        } else {
            (INSET_X, viewport.width - LABEL_WIDTH)
        }
    }

    fn free_coordinate(self, anchor: Vec2) -> f32 {
        if self.is_side() {
            anchor.y
        } else {
            anchor.x
        }
    }

    fn with_free_coordinate(self, anchor: Vec2, value: f32) -> Vec2 {
        if self.is_side() {
            Vec2::new(anchor.x, value)
        } else {
            Vec2::new(value, anchor.y)
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Clamp without panicking when the range is inverted on tiny viewports
fn clamp_lenient(value: f32, min: f32, max: f32) -> f32 {
    value.min(max).max(min)
}

pub fn is_eligible(angle: f32) -> bool {
    angle > BAND_MIN && angle < BAND_MAX
}

/// Edge and preferred anchor for a node projected at `screen`
pub fn assign_edge(screen: Vec2, viewport: &Viewport) -> (Edge, Vec2) {
    let offset = screen - viewport.center();

    if offset.x.abs() > offset.y.abs() {
        let y = clamp_lenient(screen.y, INSET_Y, viewport.height - INSET_Y);
        if offset.x > 0.0 {
            (Edge::Right, Vec2::new(viewport.width - LABEL_WIDTH, y))
        } else {
            (Edge::Left, Vec2::new(INSET_X, y))
        }
    } else {
        let x = clamp_lenient(
            screen.x - LABEL_HALF_WIDTH,
            INSET_X,
            viewport.width - LABEL_WIDTH,
        );
        if offset.y > 0.0 {
            (Edge::Bottom, Vec2::new(x, viewport.height - BOTTOM_ROW))
        } else {
            (Edge::Top, Vec2::new(x, INSET_Y))
        }
    }
}

/// A node that qualifies for a label this frame, before collision handling
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub node: &'a Node,
    pub anchor: Vec2,
    pub edge: Edge,
    pub angle: f32,
}

pub fn collect_candidates<'a>(
    registry: &'a Registry,
    sphere: &SphereTransform,
    camera: &Camera,
    viewport: &Viewport,
) -> Vec<Candidate<'a>> {
    registry
        .all_nodes()
        .iter()
        .filter_map(|node| {
            let world = sphere.to_world(node.local);
            let angle = camera.angle_to(world);
            if !is_eligible(angle) {
                return None;
            }
            let screen = camera.project_directional(world, viewport);
            let (edge, anchor) = assign_edge(screen, viewport);
            Some(Candidate {
                node,
                anchor,
                edge,
                angle,
            })
        })
        .collect()
}

/// Committed free-axis positions, one list per edge
#[derive(Debug, Default)]
struct EdgeSlots {
    used: [Vec<f32>; 4],
}

impl EdgeSlots {
    fn is_clear(&self, edge: Edge, position: f32) -> bool {
        let spacing = edge.spacing();
        self.used[edge.slot()]
            .iter()
            .all(|&p| (p - position).abs() >= spacing)
    }

    /// Nearest clear position to `preferred`, alternating outward
    fn find(&self, edge: Edge, preferred: f32, viewport: &Viewport) -> Option<f32> {
        if self.is_clear(edge, preferred) {
            return Some(preferred);
        }

        let (min, max) = edge.free_range(viewport);
        for step in 1..=MAX_PROBES {
            let offset = step as f32 * edge.spacing();
            if offset > edge.reach() {
                break;
            }
            for probe in [preferred + offset, preferred - offset] {
                if probe >= min && probe <= max && self.is_clear(edge, probe) {
                    return Some(probe);
                }
            }
        }
        None
    }

    fn commit(&mut self, edge: Edge, position: f32) {
        self.used[edge.slot()].push(position);
    }
}

/// Rank candidates and spread them along their edges.
///
/// Lower angles are placed first. A candidate with no free slot within reach
/// is dropped for this frame.
pub fn resolve_collisions<'a>(
    mut candidates: Vec<Candidate<'a>>,
    viewport: &Viewport,
) -> Vec<Candidate<'a>> {
    candidates.sort_by(|a, b| a.angle.total_cmp(&b.angle));

    let mut slots = EdgeSlots::default();
    let mut placed = Vec::with_capacity(candidates.len());

    for mut candidate in candidates {
        let edge = candidate.edge;
        let preferred = edge.free_coordinate(candidate.anchor);
        match slots.find(edge, preferred, viewport) {
            Some(position) => {
                slots.commit(edge, position);
                candidate.anchor = edge.with_free_coordinate(candidate.anchor, position);
                placed.push(candidate);
            }
            None => {
                tracing::trace!(
                    node = %candidate.node.id,
                    edge = edge.name(),
                    "No free slot; label dropped"
                );
            }
        }
    }

    placed
}

/// What a label shows
#[derive(Debug, Clone, PartialEq)]
pub struct LabelView {
    pub text: String,
    pub color: Rgb,
    pub anchor: Vec2,
    pub glyph: char,
}

/// Final label for one node this frame
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub node_id: String,
    pub edge: Edge,
    pub angle: f32,
    pub view: LabelView,
}

/// Compute this frame's labels: eligibility, edge routing, collision resolution
pub fn place_labels(
    registry: &Registry,
    palette: &Palette,
    sphere: &SphereTransform,
    camera: &Camera,
    viewport: &Viewport,
) -> Vec<Placement> {
    let candidates = collect_candidates(registry, sphere, camera, viewport);
    resolve_collisions(candidates, viewport)
        .into_iter()
        .map(|c| Placement {
            node_id: c.node.id.clone(),
            edge: c.edge,
            angle: c.angle,
            view: LabelView {
                text: c.node.primary_theme().to_string(),
                color: palette.primary_color(&c.node.themes),
                anchor: c.anchor,
                glyph: c.edge.glyph(),
            },
        })
        .collect()
}

/// What clicking a label does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelAction {
    RotateTo(String),
    OpenAbout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u64);

/// UI layer that hosts labels
pub trait LabelSurface {
    /// Mount a label and bind its click action
    fn create(&mut self, view: &LabelView, action: LabelAction) -> LabelId;
    /// Change what a mounted label shows; its action is left alone
    fn update(&mut self, id: LabelId, view: &LabelView);
    fn remove(&mut self, id: LabelId);
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

/// Owns the set of labels currently mounted on a surface
#[derive(Debug, Default)]
pub struct LabelEngine {
    live: BTreeMap<String, LabelId>,
    statics: Vec<LabelId>,
}

impl LabelEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a label that reconciliation never removes.
    ///
    /// Static ids stay out of the per-node map, so a retire pass never sees them.
    pub fn pin_static<S: LabelSurface>(
        &mut self,
        surface: &mut S,
        view: &LabelView,
        action: LabelAction,
    ) -> LabelId {
        let id = surface.create(view, action);
        self.statics.push(id);
        id
    }

    /// Bring the surface in line with this frame's placements
    pub fn reconcile<S: LabelSurface>(
        &mut self,
        placements: &[Placement],
        surface: &mut S,
    ) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut previous = std::mem::take(&mut self.live);

        for placement in placements {
            let id = match previous.remove(&placement.node_id) {
                Some(id) => {
                    surface.update(id, &placement.view);
                    stats.updated += 1;
                    id
                }
                None => {
                    stats.created += 1;
                    surface.create(
                        &placement.view,
                        LabelAction::RotateTo(placement.node_id.clone()),
                    )
                }
            };
            self.live.insert(placement.node_id.clone(), id);
        }

        for (node_id, id) in previous {
            tracing::trace!(node = %node_id, "Label retired");
            surface.remove(id);
            stats.removed += 1;
        }

        stats
    }
}

#[cfg(test)]
impl LabelEngine {
    pub(crate) fn live_count(&self) -> usize {
        self.live.len()
    }

    fn live_label(&self, node_id: &str) -> Option<LabelId> {
        self.live.get(node_id).copied()
    }

    fn static_labels(&self) -> &[LabelId] {
        &self.statics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Episode};
    use crate::episodes::builtin_episodes;
    use std::collections::HashMap;

    fn episode(id: &str, theta: f32, phi: f32, themes: &[&str]) -> Episode {
        Episode {
            id: id.to_string(),
            title: id.to_uppercase(),
            media_ref: String::new(),
            theta,
            phi,
            themes: themes.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn palette() -> Palette {
        Palette::from_config(&Config::default()).unwrap()
    }

    fn viewport() -> Viewport {
        Viewport::new(1280.0, 800.0)
    }

    /// Surface double that records every call
    #[derive(Default)]
    struct RecordingSurface {
        next: u64,
        mounted: HashMap<LabelId, (LabelView, LabelAction)>,
        created: usize,
        removed: Vec<LabelId>,
    }

    impl LabelSurface for RecordingSurface {
        fn create(&mut self, view: &LabelView, action: LabelAction) -> LabelId {
            self.next += 1;
            let id = LabelId(self.next);
            self.mounted.insert(id, (view.clone(), action));
            self.created += 1;
            id
        }

        fn update(&mut self, id: LabelId, view: &LabelView) {
            let entry = self.mounted.get_mut(&id).expect("update of unmounted label");
            entry.0 = view.clone();
        }

        fn remove(&mut self, id: LabelId) {
            assert!(self.mounted.remove(&id).is_some(), "double remove");
            self.removed.push(id);
        }
    }

    fn assert_spacing(placements: &[Placement]) {
        for (i, a) in placements.iter().enumerate() {
            for b in &placements[i + 1..] {
                if a.edge != b.edge {
                    continue;
                }
                let gap = (a.edge.free_coordinate(a.view.anchor) - b.edge.free_coordinate(b.view.anchor)).abs();
                assert!(gap >= a.edge.spacing(), "{} and {} only {}px apart", a.node_id, b.node_id, gap);
            }
        }
    }

    #[test]
    fn test_eligibility_band_is_exclusive() {
        assert!(!is_eligible(60.0));
        assert!(is_eligible(60.01));
        assert!(is_eligible(90.0));
        assert!(!is_eligible(120.0));
        assert!(!is_eligible(0.0));
        assert!(!is_eligible(180.0));
    }

    #[test]
    fn test_assign_edge() {
        let vp = viewport();

        let (edge, anchor) = assign_edge(Vec2::new(2000.0, 300.0), &vp);
        assert_eq!(edge, Edge::Right);
        assert_eq!(anchor, Vec2::new(1030.0, 300.0));

        let (edge, anchor) = assign_edge(Vec2::new(-900.0, 10.0), &vp);
        assert_eq!(edge, Edge::Left);
        assert_eq!(anchor, Vec2::new(20.0, 80.0));

        let (edge, anchor) = assign_edge(Vec2::new(700.0, 1500.0), &vp);
        assert_eq!(edge, Edge::Bottom);
        assert_eq!(anchor, Vec2::new(600.0, 740.0));

        let (edge, anchor) = assign_edge(Vec2::new(5000.0, -9000.0), &vp);
        assert_eq!(edge, Edge::Top);
        assert_eq!(anchor, Vec2::new(1030.0, 80.0));
    }

    #[test]
    fn test_tiny_viewport_does_not_panic() {
        let vp = Viewport::new(100.0, 100.0);
        let (_, anchor) = assign_edge(Vec2::new(500.0, 50.0), &vp);
        assert!(anchor.x.is_finite() && anchor.y.is_finite());
    }

    #[test]
    fn test_facing_node_gets_no_label() {
        let registry = Registry::build(&[episode("ahead", 180.0, 90.0, &["science"])], 950.0).unwrap();
        let placements = place_labels(
            &registry,
            &palette(),
            &SphereTransform::default(),
            &Camera::default(),
            &viewport(),
        );
        assert!(placements.is_empty());
    }

    #[test]
    fn test_sideways_node_gets_right_label() {
        let registry = Registry::build(&[episode("aside", 90.0, 90.0, &["health", "science"])], 950.0).unwrap();
        let vp = viewport();
        let placements = place_labels(
            &registry,
            &palette(),
            &SphereTransform::default(),
            &Camera::default(),
            &vp,
        );
        assert_eq!(placements.len(), 1);
        let label = &placements[0];
        assert_eq!(label.edge, Edge::Right);
        assert_eq!(label.view.glyph, '>');
        assert_eq!(label.view.text, "health");
        assert_eq!(label.view.color, Rgb(0x00ff00));
        assert_eq!(label.view.anchor.x, vp.width - 250.0);
        assert!(label.view.anchor.y >= 80.0 && label.view.anchor.y <= vp.height - 80.0);
        assert!((label.angle - 90.0).abs() < 0.01);
    }

    #[test]
    fn test_unknown_theme_label_uses_fallback() {
        let registry = Registry::build(&[episode("odd", 270.0, 90.0, &["astrology"])], 950.0).unwrap();
        let placements = place_labels(
            &registry,
            &palette(),
            &SphereTransform::default(),
            &Camera::default(),
            &viewport(),
        );
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].edge, Edge::Left);
        assert_eq!(placements[0].view.color, Rgb::WHITE);
    }

    fn crowded(registry: &Registry, base_y: f32) -> Vec<Candidate<'_>> {
        registry
            .all_nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| Candidate {
                node,
                anchor: Vec2::new(1030.0, base_y + i as f32 * 5.0),
                edge: Edge::Right,
                // Reverse registry order so sorting matters
                angle: 100.0 - i as f32,
            })
            .collect()
    }

    #[test]
    fn test_crowded_right_edge_spreads_out() {
        let registry = Registry::build(&builtin_episodes(), 950.0).unwrap();
        let vp = viewport();
        let placed = resolve_collisions(crowded(&registry, 300.0), &vp);

        assert!(!placed.is_empty() && placed.len() <= 8);
        // Lowest angle keeps its preferred slot
        assert_eq!(placed[0].node.id, "episode-008");
        assert_eq!(placed[0].anchor.y, 335.0);

        for (i, a) in placed.iter().enumerate() {
            assert!(a.anchor.y >= 80.0 && a.anchor.y <= vp.height - 80.0);
            for b in &placed[i + 1..] {
                assert!((a.anchor.y - b.anchor.y).abs() >= 40.0);
            }
        }
        // Placement order is priority order
        for pair in placed.windows(2) {
            assert!(pair[0].angle <= pair[1].angle);
        }
    }

    #[test]
    fn test_drops_when_edge_is_full() {
        let registry = Registry::build(&builtin_episodes(), 950.0).unwrap();
        // Side range is 80..=180: room for three labels
        let vp = Viewport::new(1280.0, 260.0);
        let candidates: Vec<Candidate> = registry
            .all_nodes()
            .iter()
            .enumerate()
            .map(|(i, node)| Candidate {
                node,
                anchor: Vec2::new(1030.0, 130.0),
                edge: Edge::Right,
                angle: 70.0 + i as f32,
            })
            .collect();

        let placed = resolve_collisions(candidates, &vp);
        let ids: Vec<&str> = placed.iter().map(|c| c.node.id.as_str()).collect();
        let ys: Vec<f32> = placed.iter().map(|c| c.anchor.y).collect();
        assert_eq!(ids, vec!["episode-001", "episode-002", "episode-003"]);
        assert_eq!(ys, vec![130.0, 170.0, 90.0]);
    }

    #[test]
    fn test_edges_resolve_independently() {
        let registry = Registry::build(&builtin_episodes(), 950.0).unwrap();
        let nodes = registry.all_nodes();
        let candidates = vec![
            Candidate { node: &nodes[0], anchor: Vec2::new(1030.0, 300.0), edge: Edge::Right, angle: 70.0 },
            Candidate { node: &nodes[1], anchor: Vec2::new(20.0, 300.0), edge: Edge::Left, angle: 71.0 },
            Candidate { node: &nodes[2], anchor: Vec2::new(400.0, 80.0), edge: Edge::Top, angle: 72.0 },
            Candidate { node: &nodes[3], anchor: Vec2::new(450.0, 80.0), edge: Edge::Top, angle: 73.0 },
        ];
        let placed = resolve_collisions(candidates, &viewport());
        assert_eq!(placed.len(), 4);
        assert_eq!(placed[0].anchor.y, 300.0);
        assert_eq!(placed[1].anchor.y, 300.0);
        // Second top label pushed one spacing to the right
        assert_eq!(placed[3].anchor.x, 600.0);
    }

    #[test]
    fn test_spacing_holds_for_any_rotation() {
        let registry = Registry::build(&builtin_episodes(), 950.0).unwrap();
        let palette = palette();
        let camera = Camera::default();
        for vp in [viewport(), Viewport::new(480.0, 640.0)] {
            for yaw in (0..360).step_by(10) {
                for pitch in [-60, -30, 0, 30, 60] {
                    let sphere = SphereTransform {
                        rotation_x: (pitch as f32).to_radians(),
                        rotation_y: (yaw as f32).to_radians(),
                    };
                    let placements = place_labels(&registry, &palette, &sphere, &camera, &vp);
                    assert_spacing(&placements);
                    for p in &placements {
                        assert!(is_eligible(p.angle));
                        let (min, max) = p.edge.free_range(&vp);
                        let free = p.edge.free_coordinate(p.view.anchor);
                        assert!(free >= min && free <= max, "{} out of range on {}", free, p.edge.name());
                    }
                }
            }
        }
    }

    fn placement(node_id: &str, y: f32) -> Placement {
        Placement {
            node_id: node_id.to_string(),
            edge: Edge::Right,
            angle: 90.0,
            view: LabelView {
                text: "science".into(),
                color: Rgb(0xff00ff),
                anchor: Vec2::new(1030.0, y),
                glyph: '>',
            },
        }
    }

    #[test]
    fn test_label_identity_survives_frames() {
        let mut engine = LabelEngine::new();
        let mut surface = RecordingSurface::default();

        let stats = engine.reconcile(&[placement("a", 100.0), placement("b", 200.0)], &mut surface);
        assert_eq!(stats, ReconcileStats { created: 2, updated: 0, removed: 0 });
        let a = engine.live_label("a").unwrap();
        let b = engine.live_label("b").unwrap();

        let stats = engine.reconcile(&[placement("a", 140.0), placement("c", 300.0)], &mut surface);
        assert_eq!(stats, ReconcileStats { created: 1, updated: 1, removed: 1 });
        assert_eq!(engine.live_label("a"), Some(a));
        assert!(engine.live_label("b").is_none());
        assert_eq!(surface.removed, vec![b]);

        // Moved in place, click binding untouched
        let (view, action) = &surface.mounted[&a];
        assert_eq!(view.anchor.y, 140.0);
        assert_eq!(action, &LabelAction::RotateTo("a".into()));
        assert_eq!(surface.created, 3);
    }

    #[test]
    fn test_identity_across_real_frames() {
        let registry = Registry::build(&builtin_episodes(), 950.0).unwrap();
        let palette = palette();
        let camera = Camera::default();
        let vp = viewport();
        let mut engine = LabelEngine::new();
        let mut surface = RecordingSurface::default();

        let mut sphere = SphereTransform::default();
        let first = place_labels(&registry, &palette, &sphere, &camera, &vp);
        engine.reconcile(&first, &mut surface);
        let before: Vec<(String, LabelId)> = first
            .iter()
            .map(|p| (p.node_id.clone(), engine.live_label(&p.node_id).unwrap()))
            .collect();

        // One auto-rotate step barely moves anything
        sphere.rotation_y += 0.0005;
        let second = place_labels(&registry, &palette, &sphere, &camera, &vp);
        engine.reconcile(&second, &mut surface);

        for (node_id, id) in before {
            if second.iter().any(|p| p.node_id == node_id) {
                assert_eq!(engine.live_label(&node_id), Some(id));
            }
        }
        assert_eq!(surface.mounted.len(), engine.live_count());
    }

    #[test]
    fn test_static_labels_are_never_removed() {
        let mut engine = LabelEngine::new();
        let mut surface = RecordingSurface::default();
        let about = engine.pin_static(
            &mut surface,
            &LabelView {
                text: "About".into(),
                color: Rgb::WHITE,
                anchor: Vec2::new(20.0, 20.0),
                glyph: '?',
            },
            LabelAction::OpenAbout,
        );

        engine.reconcile(&[placement("a", 100.0)], &mut surface);
        let stats = engine.reconcile(&[], &mut surface);
        assert_eq!(stats.removed, 1);

        assert!(surface.mounted.contains_key(&about));
        assert_eq!(surface.mounted.len(), 1);
        assert_eq!(engine.static_labels(), &[about]);
        assert_eq!(engine.live_count(), 0);
    }
}
