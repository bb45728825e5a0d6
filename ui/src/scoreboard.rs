//! Score, profile and clock of the running game.

use std::sync::{Arc, Mutex};

use game::session::MAX_DAMAGE;

use crate::game_thread::GameHandle;
use crate::ui_traits::UiTool;

pub struct Scoreboard {
    handle: Arc<Mutex<GameHandle>>,
}

impl Scoreboard {
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(handle: Arc<Mutex<GameHandle>>) -> Self {
        Self { handle }
    }
}

impl UiTool for Scoreboard {
    fn name(&self) -> &'static str {
        "Scoreboard"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .default_width(220.0)
            .default_pos(egui::pos2(560.0, 120.0))
            .open(open)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        let Ok(handle) = self.handle.lock() else {
            return;
        };
        let snapshot = &handle.state.snapshot;

        ui.heading(&snapshot.player);
        if snapshot.is_birthday {
            ui.colored_label(egui::Color32::GOLD, "🎂 Happy birthday!");
        }
        ui.monospace(&snapshot.time);
        ui.separator();

        egui::Grid::new("score")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui| {
                ui.label("Phase");
                ui.label(snapshot.phase);
                ui.end_row();

                ui.label("Mode");
                ui.label(format!("{:?}", snapshot.mode));
                ui.end_row();

                ui.label("Wins");
                ui.label(snapshot.score.wins.to_string());
                ui.end_row();

                ui.label("Ties");
                ui.label(snapshot.score.ties.to_string());
                ui.end_row();

                ui.label("Damage");
                ui.label(format!("{} / {}", snapshot.score.damage, MAX_DAMAGE + 1));
                ui.end_row();

                ui.label("Frame");
                ui.monospace(snapshot.frame.to_string());
                ui.end_row();
            });

        ui.separator();
        ui.label("Achievements");
        if snapshot.unlocked.is_empty() {
            ui.small("None yet");
        }
        for achievement in &snapshot.unlocked {
            ui.label(format!(
                "🏆 {} ({} points, {})",
                achievement.title, achievement.points, achievement.unlocked
            ));
        }

        if let Some(latest) = handle.unlocked.last() {
            ui.separator();
            ui.colored_label(
                egui::Color32::LIGHT_GREEN,
                format!("Unlocked: {}", latest.title),
            );
        }
        if let Some(err) = &handle.last_error {
            ui.colored_label(egui::Color32::LIGHT_RED, err);
        }
    }
}
