//! Pause, palette and mode switches for the running game.

use std::sync::{Arc, Mutex};

use game::Mode;

use crate::game_thread::{GameCommand, GameHandle};
use crate::ui_traits::UiTool;

pub struct Controls {
    handle: Arc<Mutex<GameHandle>>,
}

impl Controls {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(handle: Arc<Mutex<GameHandle>>) -> Self {
        Self { handle }
    }
}

impl UiTool for Controls {
    fn name(&self) -> &'static str {
        "Controls"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .default_width(200.0)
            .default_pos(egui::pos2(560.0, 10.0))
            .open(open)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        let Ok(mut handle) = self.handle.lock() else {
            return;
        };
        let is_running = handle.state.is_running;
        let mut grayscale = handle.state.snapshot.grayscale;
        let mut mode = handle.state.snapshot.mode;

        ui.horizontal(|ui| {
            let label = if is_running { "⏸ Pause" } else { "▶ Resume" };
            if ui.button(label).clicked() {
                handle.send(if is_running {
                    GameCommand::Pause
                } else {
                    GameCommand::Resume
                });
            }
            if ui.button("⟲ Restart").clicked() {
                handle.send(GameCommand::Restart);
            }
        });

        if ui.checkbox(&mut grayscale, "Grayscale").changed() {
            handle.send(GameCommand::SetGrayscale(grayscale));
        }

        ui.horizontal(|ui| {
            let single = ui.radio_value(&mut mode, Mode::Single, "Single player");
            let multi = ui.radio_value(&mut mode, Mode::Multi, "Two players");
            if single.changed() || multi.changed() {
                handle.send(GameCommand::SetMode(mode));
            }
        });
    }
}
