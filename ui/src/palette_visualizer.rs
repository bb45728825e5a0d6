use egui::Color32;
use std::sync::{Arc, Mutex};

use engine::Rgb;

use crate::game_thread::{GameHandle, PALETTE_ROW, PaletteRow};
use crate::ui_traits::UiTool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PaletteType {
    Background,
    Sprite,
}

pub struct PaletteVisualizer {
    handle: Arc<Mutex<GameHandle>>,
    palette_type: PaletteType,
}

impl PaletteVisualizer {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(handle: Arc<Mutex<GameHandle>>) -> Self {
        Self {
            handle,
            palette_type: PaletteType::Sprite,
        }
    }
}

const fn color32(rgb: Rgb) -> Color32 {
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

fn palette_grid(ui: &mut egui::Ui, rows: &[PaletteRow]) {
    if rows.is_empty() {
        ui.small("No palettes in use");
        return;
    }

    egui::Grid::new("palettes").striped(true).show(ui, |ui| {
        ui.strong("Palette");
        for i in 0..PALETTE_ROW {
            ui.strong(format!("{i:X}"));
        }
        ui.end_row();

        for row in rows {
            ui.label(&row.label);
            for (i, rgb) in row.colors.iter().enumerate() {
                ui.add(egui::Button::new("  ").fill(color32(*rgb)))
                    .on_hover_text(format!(
                        "{i}: #{:02X}{:02X}{:02X}",
                        rgb.red, rgb.green, rgb.blue
                    ));
            }
            ui.end_row();
        }
    });
}

impl UiTool for PaletteVisualizer {
    fn name(&self) -> &'static str {
        "Palette Visualizer"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .default_width(420.0)
            .default_height(300.0)
            .open(open)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.label("Memory type:");
        ui.horizontal(|ui| {
            ui.radio_value(&mut self.palette_type, PaletteType::Background, "BG Palette");
            ui.radio_value(&mut self.palette_type, PaletteType::Sprite, "OBJ Palette");
        });
        ui.small("First 16 colors, index 0 is transparent");
        ui.separator();

        let Ok(handle) = self.handle.lock() else {
            return;
        };
        let rows = match self.palette_type {
            PaletteType::Background => &handle.state.background_palettes,
            PaletteType::Sprite => &handle.state.sprite_palettes,
        };
        palette_grid(ui, rows);
    }
}
