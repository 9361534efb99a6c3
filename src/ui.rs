// UI module for the kiosk application

use crate::annotate::annotate;
use crate::camera::CameraOpener;
use crate::catalog::Catalog;
use crate::kiosk::{Kiosk, Notice};
use crate::models::Frame;
use crate::perception::Perception;
use crate::presentation::{
    self, exploration_prompt, status_strip, suggestion_card, Outcome, CAMERA_OFF_HINT, INSTRUCTIONS,
};
use crate::session::Answer;
use std::path::PathBuf;
use tracing::warn;

const HEADER_GREEN: egui::Color32 = egui::Color32::from_rgb(0x2e, 0x7d, 0x32);
const SUGGESTION_BLUE: egui::Color32 = egui::Color32::from_rgb(0x15, 0x65, 0xc0);

/// Button presses collected while drawing, applied after the frame
enum UiAction {
    ToggleCamera,
    Answer(Answer),
}

/// Main application UI
pub struct KioskApp<O: CameraOpener, P: Perception> {
    kiosk: Kiosk<O, P>,
    catalog_path: PathBuf,
    camera_texture: Option<egui::TextureHandle>,
    /// Terminal display, computed once per resolved run
    outcome: Option<Outcome>,
}

impl<O: CameraOpener, P: Perception> KioskApp<O, P> {
    /// Creates the app around a kiosk; the catalog is read on a "yes" answer
    pub fn new(kiosk: Kiosk<O, P>, catalog_path: PathBuf) -> Self {
        Self {
            kiosk,
            catalog_path,
            camera_texture: None,
            outcome: None,
        }
    }

    fn apply(&mut self, action: UiAction) {
        match action {
            UiAction::ToggleCamera => {
                let starting = !self.kiosk.session().camera_active();
                // Failure is kept as a notice by the kiosk
                if self.kiosk.toggle_camera().is_ok() && starting {
                    self.outcome = None;
                    self.camera_texture = None;
                }
            }
            UiAction::Answer(answer) => {
                if let Err(e) = self.kiosk.answer(answer) {
                    warn!("Ignoring answer: {}", e);
                }
            }
        }
    }

    /// Runs one tick and refreshes the camera texture
    fn update_camera_texture(&mut self, ctx: &egui::Context) {
        let Some(report) = self.kiosk.tick() else {
            return;
        };

        let strip = status_strip(&report.observation);
        let shown = match annotate(&report.frame, &strip) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Failed to annotate frame: {}", e);
                report.frame
            }
        };
        self.camera_texture = Some(load_frame(ctx, &shown));
    }

    /// Examines the resolved flags once after the camera stops
    fn update_outcome(&mut self) {
        if self.kiosk.session().camera_active() || self.outcome.is_some() {
            return;
        }
        let path = self.catalog_path.clone();
        self.outcome = Some(presentation::outcome(self.kiosk.session(), || {
            Catalog::load(&path)
        }));
    }

    fn render_header(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading(
                    egui::RichText::new("🛒 EmotiCart: Smart Shopping Experience 🔍")
                        .color(HEADER_GREEN)
                        .size(32.0),
                );
                ui.label(
                    "Discover products that match your mood with our emotion-sensing technology!",
                );
            });
        });
        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.small("EmotiCart © 2025 | Making your shopping experience more personalized 🛒");
            });
        });
    }

    fn render_suggestions(&self, ctx: &egui::Context) {
        egui::SidePanel::right("suggestions")
            .min_width(320.0)
            .show(ctx, |ui| {
                ui.heading(egui::RichText::new("🧠 Smart Suggestions").color(SUGGESTION_BLUE));
                let card = suggestion_card(self.kiosk.session().suggestion());
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.label(egui::RichText::new(card.title).strong().size(20.0));
                    for line in card.lines {
                        ui.label(line);
                    }
                });

                ui.add_space(16.0);
                ui.label(egui::RichText::new("📝 How It Works:").strong());
                for (i, step) in INSTRUCTIONS.iter().enumerate() {
                    ui.label(format!("{}. {}", i + 1, step));
                }
            });
    }

    fn render_main(&self, ctx: &egui::Context, actions: &mut Vec<UiAction>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading(egui::RichText::new("📹 Live Camera Feed").color(HEADER_GREEN));
                    let active = self.kiosk.session().camera_active();
                    let label = if active { "⏹️ Stop Camera" } else { "▶️ Start Camera" };
                    if ui.button(label).on_hover_text("Toggle Camera").clicked() {
                        actions.push(UiAction::ToggleCamera);
                    }
                });

                match self.kiosk.notice() {
                    Some(Notice::Error(msg)) => {
                        ui.colored_label(egui::Color32::RED, format!("❌ {msg}"));
                    }
                    Some(Notice::Warning(msg)) => {
                        ui.colored_label(
                            egui::Color32::from_rgb(0xe6, 0x51, 0x00),
                            format!("⚠️ {msg}"),
                        );
                    }
                    None => {}
                }

                if self.kiosk.session().camera_active() {
                    if let Some(texture) = &self.camera_texture {
                        let size = texture.size_vec2();
                        let width = ui.available_width().min(size.x);
                        let height = width * size.y / size.x;
                        ui.add(
                            egui::Image::new(texture)
                                .fit_to_exact_size(egui::vec2(width, height)),
                        );
                    }
                } else {
                    ui.label(CAMERA_OFF_HINT);
                }

                if let Some(prompt) = exploration_prompt(self.kiosk.session()) {
                    ui.separator();
                    ui.vertical_centered(|ui| {
                        ui.heading(egui::RichText::new(&prompt.heading).color(HEADER_GREEN));
                        ui.label(&prompt.question);
                        ui.horizontal(|ui| {
                            if ui
                                .button(&prompt.yes_label)
                                .on_hover_text("Show product details")
                                .clicked()
                            {
                                actions.push(UiAction::Answer(Answer::Yes));
                            }
                            if ui
                                .button(&prompt.no_label)
                                .on_hover_text("Continue shopping")
                                .clicked()
                            {
                                actions.push(UiAction::Answer(Answer::No));
                            }
                        });
                    });
                }

                if let Some(outcome) = &self.outcome {
                    render_outcome(ui, outcome);
                }
            });
        });
    }
}

fn render_outcome(ui: &mut egui::Ui, outcome: &Outcome) {
    match outcome {
        Outcome::Nothing => {}
        Outcome::Details { header, products } => {
            ui.separator();
            ui.heading(header);
            for product in products {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(product.icon).size(50.0));
                    ui.vertical(|ui| {
                        ui.label(
                            egui::RichText::new(&product.title)
                                .color(SUGGESTION_BLUE)
                                .size(22.0),
                        );
                        ui.label(egui::RichText::new(&product.price).color(HEADER_GREEN).strong());
                        ui.label(&product.description);
                    });
                });
                ui.separator();
            }
        }
        Outcome::NoProducts(msg) | Outcome::Declined(msg) => {
            ui.separator();
            ui.label(msg);
        }
        Outcome::CatalogUnavailable(msg) => {
            ui.separator();
            ui.colored_label(egui::Color32::RED, msg);
        }
    }
}

fn load_frame(ctx: &egui::Context, frame: &Frame) -> egui::TextureHandle {
    let color_image =
        egui::ColorImage::from_rgb([frame.width as usize, frame.height as usize], &frame.data);
    ctx.load_texture("camera", color_image, egui::TextureOptions::LINEAR)
}

impl<O, P> eframe::App for KioskApp<O, P>
where
    O: CameraOpener,
    P: Perception,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.kiosk.session().camera_active() {
            ctx.request_repaint();
            self.update_camera_texture(ctx);
        }
        self.update_outcome();

        let mut actions = Vec::new();
        self.render_header(ctx);
        self.render_suggestions(ctx);
        self.render_main(ctx, &mut actions);

        for action in actions {
            self.apply(action);
        }
    }
}
