//! Drag-to-rotate physics and the snap-to-node animation
//!
//! Input handlers only record intent (velocity, phase changes); the per-frame
//! [`RotationController::tick`] applies it to the sphere before anything is
//! drawn.

use glam::Vec2;
use std::time::Duration;

use crate::config::Tuning;
use crate::geometry::{facing_rotation, shortest_angular_delta, SphereTransform};
use crate::registry::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
}

/// A press and release that barely moved
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tap {
    pub position: Vec2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// A snap-to-node animation finished on this node
    Arrived(String),
}

#[derive(Debug, Clone, PartialEq)]
struct Snap {
    node_id: String,
    start: SphereTransform,
    delta_x: f32,
    delta_y: f32,
    elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
enum Phase {
    Idle,
    Dragging {
        kind: PointerKind,
        origin: Vec2,
        last: Vec2,
    },
    Settling,
    Snapping(Snap),
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub auto_rotate_speed: f32,
    pub drag_scale: f32,
    pub damping: f32,
    pub velocity_epsilon: f32,
    pub snap_duration: Duration,
    pub snap_hold: Duration,
    pub mouse_click_threshold: f32,
    pub touch_tap_threshold: f32,
}

impl From<&Tuning> for ControllerSettings {
    fn from(t: &Tuning) -> Self {
        Self {
            auto_rotate_speed: t.auto_rotate_speed,
            drag_scale: t.drag_scale,
            damping: t.damping,
            velocity_epsilon: t.velocity_epsilon,
            snap_duration: Duration::from_millis(t.snap_duration_ms),
            snap_hold: Duration::from_millis(t.snap_hold_ms),
            mouse_click_threshold: t.mouse_click_threshold,
            touch_tap_threshold: t.touch_tap_threshold,
        }
    }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from(&Tuning::default())
    }
}

/// Cubic ease-in-out on [0, 1]
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct RotationController {
    settings: ControllerSettings,
    phase: Phase,
    /// Radians per frame: x around the horizontal axis, y around the vertical
    velocity: Vec2,
}

impl RotationController {
    pub fn new(settings: ControllerSettings) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            velocity: Vec2::ZERO,
        }
    }

    pub fn phase_name(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "idle",
            Phase::Dragging { .. } => "dragging",
            Phase::Settling => "settling",
            Phase::Snapping(_) => "snapping",
        }
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_snapping(&self) -> bool {
        matches!(self.phase, Phase::Snapping(_))
    }

    /// Labels are frozen while the user holds the sphere or a snap is running
    pub fn labels_suppressed(&self) -> bool {
        self.is_dragging() || self.is_snapping()
    }

    pub fn pointer_down(&mut self, position: Vec2, kind: PointerKind) {
        if self.is_snapping() {
            return;
        }
        self.phase = Phase::Dragging {
            kind,
            origin: position,
            last: position,
        };
    }

    pub fn pointer_move(&mut self, position: Vec2) {
        let scale = self.settings.drag_scale;
        if let Phase::Dragging { last, .. } = &mut self.phase {
            let delta = position - *last;
            // Vertical motion tips the sphere, horizontal motion spins it
            self.velocity = Vec2::new(delta.y * scale, delta.x * scale);
            *last = position;
        }
    }

    /// End a drag; returns the tap when the pointer barely moved
    pub fn pointer_up(&mut self, position: Vec2) -> Option<Tap> {
        let Phase::Dragging { kind, origin, .. } = self.phase else {
            return None;
        };
        self.phase = Phase::Settling;

        let threshold = match kind {
            PointerKind::Mouse => self.settings.mouse_click_threshold,
            PointerKind::Touch => self.settings.touch_tap_threshold,
        };
        (position.distance(origin) < threshold).then_some(Tap { position })
    }

    /// Start the animated rotation that brings `node` in front of the camera
    pub fn rotate_to(&mut self, node: &Node, sphere: &SphereTransform) {
        let target = facing_rotation(node.local);
        self.velocity = Vec2::ZERO;
        self.phase = Phase::Snapping(Snap {
            node_id: node.id.clone(),
            start: *sphere,
            delta_x: shortest_angular_delta(sphere.rotation_x, target.rotation_x),
            delta_y: shortest_angular_delta(sphere.rotation_y, target.rotation_y),
            elapsed: Duration::ZERO,
        });
        crate::log_node_event!("snap", node.id);
    }

    /// Advance one frame
    pub fn tick(&mut self, dt: Duration, sphere: &mut SphereTransform) -> Option<ControllerEvent> {
        match &mut self.phase {
            Phase::Idle => {
                sphere.rotation_y += self.settings.auto_rotate_speed;
                None
            }
            Phase::Dragging { .. } => {
                sphere.rotation_x += self.velocity.x;
                sphere.rotation_y += self.velocity.y;
                None
            }
            Phase::Settling => {
                sphere.rotation_x += self.velocity.x;
                sphere.rotation_y += self.velocity.y;
                self.velocity *= self.settings.damping;
                let eps = self.settings.velocity_epsilon;
                if self.velocity.x.abs() < eps && self.velocity.y.abs() < eps {
                    self.velocity = Vec2::ZERO;
                    self.phase = Phase::Idle;
                }
                None
            }
            Phase::Snapping(snap) => {
                snap.elapsed += dt;
                let duration = self.settings.snap_duration.as_secs_f32();
                let progress = if duration > 0.0 {
                    (snap.elapsed.as_secs_f32() / duration).min(1.0)
                } else {
                    1.0
                };
                let eased = ease_in_out_cubic(progress);
                sphere.rotation_x = snap.start.rotation_x + snap.delta_x * eased;
                sphere.rotation_y = snap.start.rotation_y + snap.delta_y * eased;
                self.velocity = Vec2::ZERO;

                if snap.elapsed >= self.settings.snap_duration + self.settings.snap_hold {
                    let node_id = std::mem::take(&mut snap.node_id);
                    self.phase = Phase::Idle;
                    return Some(ControllerEvent::Arrived(node_id));
                }
                None
            }
        }
    }
}

impl Default for RotationController {
    fn default() -> Self {
        Self::new(ControllerSettings::default())
    }
}
