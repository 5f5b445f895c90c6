//! Application context: everything one frame needs, owned in one place

use glam::{Vec2, Vec3};
use std::time::Duration;

use crate::config::{Config, ConfigError, Tuning};
use crate::geometry::{Camera, SphereTransform, Viewport};
use crate::interaction::{ControllerEvent, ControllerSettings, PointerKind, RotationController};
use crate::labels::{place_labels, LabelEngine, LabelSurface, Placement, ReconcileStats};
use crate::palette::Palette;
use crate::picking::pick_node;
use crate::registry::{Node, Registry};
use crate::starfield::Starfield;

/// What happened during one frame
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FrameOutcome {
    /// Node a snap-to-node animation just reached
    pub arrived: Option<String>,
    /// `None` when labels were frozen this frame
    pub labels: Option<ReconcileStats>,
}

/// Per-node breathing effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub core_opacity: f32,
    pub glow_opacity: f32,
    pub glow_scale: f32,
}

/// Each node breathes at its own rate and phase
pub fn pulse(index: usize, seconds: f32) -> Pulse {
    let speed = 1.5 + (index as f32 * 0.1) % 1.0;
    let offset = index as f32 * 0.5;
    let wave = (seconds * speed + offset).sin() * 0.5 + 0.5;
    Pulse {
        core_opacity: 0.7 + wave * 0.3,
        glow_opacity: 0.2 + wave * 0.3,
        glow_scale: 1.0 + wave * 0.2,
    }
}

pub struct Constellation {
    pub registry: Registry,
    pub palette: Palette,
    pub starfield: Starfield,
    pub camera: Camera,
    pub sphere: SphereTransform,
    pub viewport: Viewport,
    pub controller: RotationController,
    pub labels: LabelEngine,
    pub tuning: Tuning,
}

impl Constellation {
    pub fn new(config: &Config, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        let tuning = config.tuning.clone();
        let registry = Registry::build(&config.episodes, tuning.sphere_radius)?;
        let palette = Palette::from_config(config)?;
        let starfield = Starfield::generate(tuning.star_count, tuning.backdrop_radius, tuning.star_seed);

        tracing::info!(
            "Scene ready: {} nodes, {} connections, {} stars",
            registry.len(),
            registry.all_connections().len(),
            starfield.stars().len()
        );

        Ok(Self {
            registry,
            palette,
            starfield,
            camera: Camera::default(),
            sphere: SphereTransform::default(),
            viewport,
            controller: RotationController::new(ControllerSettings::from(&tuning)),
            labels: LabelEngine::new(),
            tuning,
        })
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        let viewport = Viewport::new(width, height);
        if viewport != self.viewport {
            tracing::debug!("Viewport resized to {}x{}", viewport.width, viewport.height);
            self.viewport = viewport;
        }
    }

    /// Physics first, then labels (unless frozen)
    pub fn frame<S: LabelSurface>(&mut self, dt: Duration, surface: &mut S) -> FrameOutcome {
        let arrived = match self.controller.tick(dt, &mut self.sphere) {
            Some(ControllerEvent::Arrived(node_id)) => Some(node_id),
            None => None,
        };

        tracing::trace!(
            phase = self.controller.phase_name(),
            velocity = ?self.controller.velocity(),
            "Frame"
        );

        let labels = if self.controller.labels_suppressed() {
            None
        } else {
            let placements = self.placements();
            Some(self.labels.reconcile(&placements, surface))
        };

        FrameOutcome { arrived, labels }
    }

    /// Labels for the current transforms, without touching any surface
    pub fn placements(&self) -> Vec<Placement> {
        place_labels(
            &self.registry,
            &self.palette,
            &self.sphere,
            &self.camera,
            &self.viewport,
        )
    }

    pub fn world_position(&self, node: &Node) -> Vec3 {
        self.sphere.to_world(node.local)
    }

    /// Node whose glow is under a screen point
    pub fn pick(&self, screen: Vec2) -> Option<&Node> {
        pick_node(
            &self.registry,
            &self.sphere,
            &self.camera,
            &self.viewport,
            screen,
            self.tuning.glow_radius,
        )
    }

    pub fn press(&mut self, screen: Vec2, kind: PointerKind) {
        self.controller.pointer_down(screen, kind);
    }

    pub fn drag(&mut self, screen: Vec2) {
        self.controller.pointer_move(screen);
    }

    /// End a press; a tap on a node selects it
    pub fn release(&mut self, screen: Vec2) -> Option<&Node> {
        let tap = self.controller.pointer_up(screen)?;
        self.pick(tap.position)
    }

    /// Start rotating toward a node; false for unknown ids
    pub fn rotate_to_node(&mut self, node_id: &str) -> bool {
        match self.registry.find_node_by_id(node_id) {
            Some(node) => {
                self.controller.rotate_to(node, &self.sphere);
                true
            }
            None => {
                tracing::warn!("Rotate requested for unknown node '{}'", node_id);
                false
            }
        }
    }
}
