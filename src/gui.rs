//! Native constellation viewer using egui
//!
//! Stars, connection lines and nodes are painted straight onto the central
//! panel; directional labels live in their own foreground areas so they can
//! be clicked independently of the drag surface.

use eframe::egui;
use egui::{Align2, Color32, Id, Order, Pos2, RichText, Sense, Stroke, Vec2 as EguiVec2};
use glam::Vec2;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Config, Environment};
use crate::geometry::{cartesian_to_spherical, Viewport};
use crate::interaction::PointerKind;
use crate::labels::{LabelAction, LabelId, LabelSurface, LabelView};
use crate::palette::Rgb;
use crate::scene::{pulse, Constellation};

const TITLE: &str = "Edge of Reality";

pub const FALLBACK_NOTICE: &str = "This constellation needs a working OpenGL context. \
Please update your graphics drivers or try another machine.";

const DETAIL_PLACEHOLDER: &str = "This episode is coming soon! We're still cooking up the cosmic \
conversations and interdimensional insights. Check back later to engage with the full podcast \
experience. Until then, keep exploring the constellation and stay on the edge of reality!";

#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("3D rendering is unavailable: {0}")]
    RenderingUnavailable(String),
    #[error("Viewer failed to start: {0}")]
    Startup(String),
}

impl From<eframe::Error> for ViewerError {
    fn from(e: eframe::Error) -> Self {
        match e {
            // The context came up; our own setup failed
            eframe::Error::AppCreation(err) => ViewerError::Startup(err.to_string()),
            other => ViewerError::RenderingUnavailable(other.to_string()),
        }
    }
}

type CreatorResult = Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>;

/// Run the native viewer.
///
/// The scene is only built once eframe has a working context.
pub fn run_viewer(config: &Config, env: &Environment) -> Result<(), ViewerError> {
    let [width, height] = env.window_size;
    let config = config.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_title(TITLE),
        ..Default::default()
    };

    eframe::run_native(
        TITLE,
        options,
        Box::new(move |cc: &eframe::CreationContext<'_>| -> CreatorResult {
            let scene = Constellation::new(&config, Viewport::new(width, height))?;
            Ok(Box::new(ConstellationApp::new(cc, scene)))
        }),
    )?;
    Ok(())
}

fn color32(rgb: Rgb, alpha: f32) -> Color32 {
    let [r, g, b] = rgb.channels();
    Color32::from_rgba_unmultiplied(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
}

fn to_pos(origin: Pos2, p: Vec2) -> Pos2 {
    origin + EguiVec2::new(p.x, p.y)
}

struct LabelWidget {
    area: Id,
    view: LabelView,
    action: LabelAction,
}

/// egui-backed label surface; one foreground area per label
#[derive(Default)]
struct LabelLayer {
    next: u64,
    widgets: BTreeMap<LabelId, LabelWidget>,
}

impl LabelSurface for LabelLayer {
    fn create(&mut self, view: &LabelView, action: LabelAction) -> LabelId {
        self.next += 1;
        let id = LabelId(self.next);
        self.widgets.insert(
            id,
            LabelWidget {
                area: Id::new(("directional-label", self.next)),
                view: view.clone(),
                action,
            },
        );
        id
    }

    fn update(&mut self, id: LabelId, view: &LabelView) {
        if let Some(widget) = self.widgets.get_mut(&id) {
            widget.view = view.clone();
        }
    }

    fn remove(&mut self, id: LabelId) {
        self.widgets.remove(&id);
    }
}

impl LabelLayer {
    /// Draw every label; returns the actions of clicked ones
    fn show(&self, ctx: &egui::Context, origin: Pos2) -> Vec<LabelAction> {
        let mut clicked = Vec::new();
        for widget in self.widgets.values() {
            let view = &widget.view;
            let inner = egui::Area::new(widget.area)
                .order(Order::Foreground)
                .fixed_pos(to_pos(origin, view.anchor))
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(view.glyph.to_string()).color(Color32::WHITE).strong());
                        ui.label(RichText::new(&view.text).color(color32(view.color, 1.0)));
                    })
                    .response
                })
                .inner;
            let response = inner
                .interact(Sense::click())
                .on_hover_cursor(egui::CursorIcon::PointingHand);
            if response.clicked() {
                clicked.push(widget.action.clone());
            }
        }
        clicked
    }
}

enum ModalKind {
    Detail(String),
    About,
}

struct Modal {
    id: u64,
    kind: ModalKind,
    open: bool,
}

struct Preview {
    title: String,
    position: Pos2,
}

struct ConstellationApp {
    scene: Constellation,
    layer: LabelLayer,
    modals: Vec<Modal>,
    next_modal: u64,
    preview: Option<Preview>,
    last_pointer: Option<Pos2>,
}

impl ConstellationApp {
    fn new(cc: &eframe::CreationContext<'_>, mut scene: Constellation) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let mut layer = LabelLayer::default();
        scene.labels.pin_static(
            &mut layer,
            &LabelView {
                text: "About".to_string(),
                color: Rgb::WHITE,
                anchor: Vec2::new(20.0, 20.0),
                glyph: '?',
            },
            LabelAction::OpenAbout,
        );

        Self {
            scene,
            layer,
            modals: Vec::new(),
            next_modal: 0,
            preview: None,
            last_pointer: None,
        }
    }

    fn open_modal(&mut self, kind: ModalKind) {
        if self.scene.viewport.width <= self.scene.tuning.narrow_viewport && !self.modals.is_empty() {
            debug!("Narrow viewport: closing {} open windows", self.modals.len());
            self.modals.clear();
        }
        self.next_modal += 1;
        self.modals.push(Modal {
            id: self.next_modal,
            kind,
            open: true,
        });
    }

    fn open_detail(&mut self, node_id: &str) {
        crate::log_node_event!("detail", node_id);
        self.open_modal(ModalKind::Detail(node_id.to_string()));
    }

    fn show_preview(&mut self, title: &str, position: Pos2) {
        self.preview = Some(Preview {
            title: title.to_string(),
            position: position + EguiVec2::new(15.0, -10.0),
        });
    }

    fn hide_preview(&mut self) {
        self.preview = None;
    }

    fn activate(&mut self, action: LabelAction) {
        match action {
            LabelAction::RotateTo(node_id) => {
                self.hide_preview();
                self.scene.rotate_to_node(&node_id);
            }
            LabelAction::OpenAbout => self.open_modal(ModalKind::About),
        }
    }

    /// Feed pointer input into the controller; returns a node selected by tap
    fn handle_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, origin: Pos2) -> Option<String> {
        let (pressed, released, position, touch) = ctx.input(|i| {
            (
                i.pointer.any_pressed(),
                i.pointer.any_released(),
                i.pointer.interact_pos().or(i.pointer.hover_pos()),
                i.any_touches(),
            )
        });
        if position.is_some() {
            self.last_pointer = position;
        }
        let local = |p: Pos2| Vec2::new(p.x - origin.x, p.y - origin.y);
        let kind = if touch { PointerKind::Touch } else { PointerKind::Mouse };

        if pressed && (response.hovered() || response.is_pointer_button_down_on()) {
            if let Some(p) = position {
                self.hide_preview();
                self.scene.press(local(p), kind);
            }
        }

        if self.scene.controller.is_dragging() {
            if let Some(p) = self.last_pointer {
                self.scene.drag(local(p));
                if released {
                    return self.scene.release(local(p)).map(|node| node.id.clone());
                }
            }
            return None;
        }

        // Hover preview only while nothing is being dragged or animated
        if self.scene.controller.is_snapping() || !response.hovered() {
            self.hide_preview();
            return None;
        }
        match position.and_then(|p| self.scene.pick(local(p)).map(|n| (n.title.clone(), p))) {
            Some((title, p)) => self.show_preview(&title, p),
            None => self.hide_preview(),
        }
        None
    }

    fn paint_scene(&self, painter: &egui::Painter, origin: Pos2, seconds: f32) {
        let scene = &self.scene;
        let vp = &scene.viewport;

        for star in scene.starfield.stars() {
            let world = scene.sphere.to_world(star.local);
            if let Some(p) = scene.camera.project_to_screen(world, vp) {
                painter.circle_filled(to_pos(origin, p), (star.size * 0.5).max(0.35), Color32::from_gray(220));
            }
        }

        let nodes = scene.registry.all_nodes();
        let line = Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 77));
        for connection in scene.registry.all_connections() {
            let (a, b) = connection.endpoints();
            let a = scene.camera.project_to_screen(scene.world_position(&nodes[a]), vp);
            let b = scene.camera.project_to_screen(scene.world_position(&nodes[b]), vp);
            if let (Some(a), Some(b)) = (a, b) {
                painter.line_segment([to_pos(origin, a), to_pos(origin, b)], line);
            }
        }

        // Far nodes first so near ones overlap them
        let mut visible: Vec<(usize, f32, Vec2)> = nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let world = scene.world_position(node);
                let depth = scene.camera.depth_of(world);
                if depth <= 0.0 {
                    return None;
                }
                scene
                    .camera
                    .project_to_screen(world, vp)
                    .map(|p| (index, depth, p))
            })
            .collect();
        visible.sort_by(|a, b| b.1.total_cmp(&a.1));

        for (index, depth, p) in visible {
            let node = &nodes[index];
            let color = scene.palette.primary_color(&node.themes);
            let scale = scene.camera.pixels_per_unit(depth, vp);
            let breath = pulse(index, seconds);
            let center = to_pos(origin, p);
            painter.circle_filled(
                center,
                scene.tuning.glow_radius * scale * breath.glow_scale,
                color32(color, breath.glow_opacity),
            );
            painter.circle_filled(
                center,
                scene.tuning.node_radius * scale,
                color32(color, breath.core_opacity),
            );
        }
    }

    fn show_modals(&mut self, ctx: &egui::Context) {
        let scene = &self.scene;
        let center = ctx.screen_rect().center();

        for (slot, modal) in self.modals.iter_mut().enumerate() {
            let title = match &modal.kind {
                ModalKind::Detail(node_id) => scene
                    .registry
                    .find_node_by_id(node_id)
                    .map(|n| n.title.clone())
                    .unwrap_or_else(|| node_id.clone()),
                ModalKind::About => format!("About {}", TITLE),
            };
            let offset = EguiVec2::splat(24.0 * slot as f32);

            egui::Window::new(title)
                .id(Id::new(("modal", modal.id)))
                .open(&mut modal.open)
                .collapsible(false)
                .resizable(false)
                .default_width(420.0)
                .pivot(Align2::CENTER_CENTER)
                .default_pos(center + offset)
                .show(ctx, |ui| match &modal.kind {
                    ModalKind::Detail(node_id) => {
                        ui.label(DETAIL_PLACEHOLDER);
                        ui.add_space(8.0);
                        if let Some(node) = scene.registry.find_node_by_id(node_id) {
                            ui.horizontal_wrapped(|ui| {
                                for theme in &node.themes {
                                    let color = scene.palette.color_for(theme);
                                    ui.label(RichText::new(theme).color(color32(color, 1.0)));
                                }
                            });
                            let (theta, phi, _) = cartesian_to_spherical(scene.world_position(node));
                            ui.label(
                                RichText::new(format!(
                                    "theta {:.0}, phi {:.0} (now {:.0}, {:.0})",
                                    node.theta, node.phi, theta, phi
                                ))
                                .weak()
                                .small(),
                            );

                            let neighbors = scene.registry.neighbors(node_id);
                            if !neighbors.is_empty() {
                                ui.add_space(6.0);
                                ui.strong("Related episodes:");
                                for neighbor in neighbors {
                                    ui.label(format!("- {}", neighbor.title));
                                }
                            }

                            if !node.media_ref.is_empty() {
                                ui.add_space(6.0);
                                ui.hyperlink_to("Listen", &node.media_ref);
                            }
                        }
                    }
                    ModalKind::About => {
                        ui.label(
                            "Welcome to the Edge of Reality, where researchers share their groundbreaking \
                             work and explore what excites them at the frontier of human knowledge.",
                        );
                        ui.add_space(6.0);
                        ui.label(
                            "Each glowing node is an episode, connected to others that share its themes.",
                        );
                        ui.add_space(6.0);
                        ui.strong("How to navigate:");
                        ui.label("- Drag to rotate the sphere");
                        ui.label("- Click nodes to open episodes");
                        ui.label("- Hover over nodes for episode titles");
                        ui.label("- Follow the edge labels to explore themes");
                    }
                });
        }

        self.modals.retain(|m| m.open);
    }

    fn show_preview_area(&self, ctx: &egui::Context) {
        if let Some(preview) = &self.preview {
            egui::Area::new(Id::new("node-preview"))
                .order(Order::Tooltip)
                .fixed_pos(preview.position)
                .interactable(false)
                .show(ctx, |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(&preview.title);
                    });
                });
        }
    }
}

impl eframe::App for ConstellationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Continuous repaint drives the frame loop
        ctx.request_repaint();

        let (dt, seconds) = ctx.input(|i| (i.stable_dt.clamp(0.0, 0.1), i.time as f32));
        let mut selected = None;
        let mut origin = Pos2::ZERO;

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::BLACK))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                origin = rect.min;
                self.scene.resize(rect.width(), rect.height());

                let response = ui.interact(rect, ui.id().with("sphere"), Sense::click_and_drag());
                selected = self.handle_pointer(ctx, &response, origin);

                let outcome = self.scene.frame(Duration::from_secs_f32(dt), &mut self.layer);
                if let Some(node_id) = outcome.arrived {
                    info!("Arrived at {}", node_id);
                    selected = Some(node_id);
                }

                self.paint_scene(&ui.painter_at(rect), origin, seconds);
            });

        if let Some(node_id) = selected {
            self.open_detail(&node_id);
        }

        for action in self.layer.show(ctx, origin) {
            self.activate(action);
        }

        self.show_modals(ctx);
        self.show_preview_area(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{Edge, LabelEngine, Placement};

    #[test]
    fn test_scene_setup_failure_is_not_a_rendering_failure() {
        let err = SetupError("Invalid color 'teal' for 'science'");
        let mapped = ViewerError::from(eframe::Error::AppCreation(Box::new(err)));
        assert!(matches!(mapped, ViewerError::Startup(ref msg) if msg.contains("teal")));
    }

    #[derive(Debug)]
    struct SetupError(&'static str);

    impl std::fmt::Display for SetupError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for SetupError {}

    #[test]
    fn test_label_layer_keeps_action_on_update() {
        let mut layer = LabelLayer::default();
        let mut engine = LabelEngine::new();
        let view = |y: f32| LabelView {
            text: "science".to_string(),
            color: Rgb(0xff00ff),
            anchor: Vec2::new(1030.0, y),
            glyph: '>',
        };
        let placement = |y: f32| Placement {
            node_id: "episode-001".to_string(),
            edge: Edge::Right,
            angle: 90.0,
            view: view(y),
        };

        engine.reconcile(&[placement(200.0)], &mut layer);
        engine.reconcile(&[placement(260.0)], &mut layer);

        assert_eq!(layer.widgets.len(), 1);
        let widget = layer.widgets.values().next().unwrap();
        assert_eq!(widget.view.anchor.y, 260.0);
        assert_eq!(widget.action, LabelAction::RotateTo("episode-001".to_string()));

        engine.reconcile(&[], &mut layer);
        assert!(layer.widgets.is_empty());
    }
}
