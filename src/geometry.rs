//! Coordinate conversions, camera projection and sphere transforms

use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Depth floor used when projecting directions that sit on or behind the camera plane
const DIRECTION_W_FLOOR: f32 = 1e-4;

/// Spherical (degrees) to Cartesian.
///
/// `theta` is the azimuth around the vertical (Y) axis measured from +Z,
/// `phi` the polar angle down from +Y.
pub fn spherical_to_cartesian(theta: f32, phi: f32, radius: f32) -> Vec3 {
    let (theta, phi) = (theta.to_radians(), phi.to_radians());
    Vec3::new(
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
        radius * phi.sin() * theta.cos(),
    )
}

/// Inverse of [`spherical_to_cartesian`]: `(theta in [0, 360), phi in [0, 180], radius)`
pub fn cartesian_to_spherical(p: Vec3) -> (f32, f32, f32) {
    let radius = p.length();
    if radius == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let phi = (p.y / radius).clamp(-1.0, 1.0).acos().to_degrees();
    let theta = p.x.atan2(p.z).to_degrees().rem_euclid(360.0);
    (theta, phi, radius)
}

/// Angle in degrees between two directions, in [0, 180]
pub fn angle_between(a: Vec3, b: Vec3) -> f32 {
    let dot = a.normalize_or_zero().dot(b.normalize_or_zero());
    dot.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Shortest signed rotation from `from` to `to`, in (-PI, PI]
pub fn shortest_angular_delta(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(TAU);
    if delta > PI {
        delta - TAU
    } else {
        delta
    }
}

/// Drawable area in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    fn ndc_to_screen(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            (x * 0.5 + 0.5) * self.width,
            (-y * 0.5 + 0.5) * self.height,
        )
    }

    fn screen_to_ndc(&self, screen: Vec2) -> Vec2 {
        Vec2::new(
            screen.x / self.width * 2.0 - 1.0,
            -(screen.y / self.height) * 2.0 + 1.0,
        )
    }
}

/// Perspective camera; looks down its local -Z
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in degrees
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            fov_y: 75.0,
            near: 0.1,
            far: 3000.0,
        }
    }
}

impl Camera {
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, viewport: &Viewport) -> Mat4 {
        self.projection_matrix(viewport.aspect()) * self.view_matrix()
    }

    /// Angle in degrees between the view direction and the direction to `world`
    pub fn angle_to(&self, world: Vec3) -> f32 {
        angle_between(self.forward(), world - self.position)
    }

    /// Pixel coordinates (origin top-left), or `None` when the point is behind the camera
    pub fn project_to_screen(&self, world: Vec3, viewport: &Viewport) -> Option<Vec2> {
        let clip = self.view_projection(viewport) * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        Some(viewport.ndc_to_screen(clip.x / clip.w, clip.y / clip.w))
    }

    /// Screen point along the on-screen direction toward `world`.
    ///
    /// Unlike [`Camera::project_to_screen`] this never mirrors points behind the
    /// camera and stays finite for points on the camera plane, so it is safe for
    /// choosing which edge an off-screen cue belongs to.
    pub fn project_directional(&self, world: Vec3, viewport: &Viewport) -> Vec2 {
        let clip = self.view_projection(viewport) * world.extend(1.0);
        let w = clip.w.abs().max(DIRECTION_W_FLOOR);
        viewport.ndc_to_screen(clip.x / w, clip.y / w)
    }

    /// Distance along the view axis; positive in front of the camera
    pub fn depth_of(&self, world: Vec3) -> f32 {
        (world - self.position).dot(self.forward())
    }

    /// Pixels per world unit at the given depth
    pub fn pixels_per_unit(&self, depth: f32, viewport: &Viewport) -> f32 {
        let focal = viewport.height / 2.0 / (self.fov_y.to_radians() / 2.0).tan();
        focal / depth.max(self.near)
    }

    /// Ray `(origin, unit direction)` through a pixel
    pub fn ray_through(&self, screen: Vec2, viewport: &Viewport) -> (Vec3, Vec3) {
        let ndc = viewport.screen_to_ndc(screen);
        let inverse = self.view_projection(viewport).inverse();
        let near = inverse.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
        let far = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        (self.position, (far - near).normalize_or_zero())
    }
}

/// Rotation of the sphere group, applied X then Y to local positions
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SphereTransform {
    pub rotation_x: f32,
    pub rotation_y: f32,
}

impl SphereTransform {
    pub fn matrix(&self) -> Mat3 {
        Mat3::from_rotation_x(self.rotation_x) * Mat3::from_rotation_y(self.rotation_y)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.matrix() * local
    }
}

/// Sphere rotation that brings a local position in front of a camera at the origin looking down -Z
pub fn facing_rotation(local: Vec3) -> SphereTransform {
    let horizontal = (local.x * local.x + local.z * local.z).sqrt();
    SphereTransform {
        rotation_x: -local.y.atan2(horizontal),
        rotation_y: PI - local.x.atan2(local.z),
    }
}
