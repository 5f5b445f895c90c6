//! Screen-space hit testing against node primitives

use glam::{Vec2, Vec3};

use crate::geometry::{Camera, SphereTransform, Viewport};
use crate::registry::{Node, PrimitiveId, Registry};

/// Distance along the ray to the first hit on a sphere, if any
fn ray_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    let near = -b - root;
    let t = if near >= 0.0 { near } else { -b + root };
    (t >= 0.0).then_some(t)
}

/// Nearest primitive under a screen point
pub fn pick_primitive(
    registry: &Registry,
    sphere: &SphereTransform,
    camera: &Camera,
    viewport: &Viewport,
    screen: Vec2,
    radius: f32,
) -> Option<PrimitiveId> {
    let (origin, dir) = camera.ray_through(screen, viewport);
    registry
        .all_nodes()
        .iter()
        .filter_map(|node| {
            ray_sphere(origin, dir, sphere.to_world(node.local), radius).map(|t| (t, node.primitive))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, primitive)| primitive)
}

/// Node under a screen point
pub fn pick_node<'a>(
    registry: &'a Registry,
    sphere: &SphereTransform,
    camera: &Camera,
    viewport: &Viewport,
    screen: Vec2,
    radius: f32,
) -> Option<&'a Node> {
    pick_primitive(registry, sphere, camera, viewport, screen, radius)
        .and_then(|primitive| registry.node_for_primitive(primitive))
}
