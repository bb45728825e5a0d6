use crate::ui_traits::UiTool;

#[derive(Default)]
pub struct About {}

impl UiTool for About {
    fn name(&self) -> &'static str {
        "About RPSLS"
    }

    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .default_width(300.0)
            .default_pos(egui::pos2(620.0, 10.0))
            .open(open)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("✊✋✌ RPSLS");
        ui.add_space(4.0);
        ui.label(
            "Rock Paper Scissors Lizard Spock on a dual-screen\n\
             sprite and tile engine. Pick a hand on the bottom\n\
             screen, four lost rounds end the game.",
        );
        ui.add_space(8.0);
        ui.label("Scissors cuts paper, paper covers rock, rock crushes lizard,");
        ui.label("lizard poisons Spock, Spock smashes scissors, scissors");
        ui.label("decapitates lizard, lizard eats paper, paper disproves");
        ui.label("Spock, Spock vaporizes rock, rock crushes scissors.");
    }
}
