//! # RPSLS UI Application
//!
//! The main application struct that ties the tool windows to the game
//! thread.
//!
//! ## Initialization Flow
//!
//! ```text
//! App::new(game, scale)
//!     │
//!     ├─► game_thread::spawn(game)
//!     │   └─► Game moves to its own thread, ticking at the refresh rate
//!     │
//!     └─► Create UI tools:
//!         ├─► About
//!         ├─► DualScreen (both screens, touch input)
//!         ├─► Controls (pause, grayscale, mode)
//!         ├─► Scoreboard (score, profile, achievements)
//!         └─► PaletteVisualizer
//! ```
//!
//! ## Shared State
//!
//! The [`GameHandle`] is wrapped in `Arc<Mutex<_>>` and shared by every
//! tool. The app polls it once per repaint, the tools read the cached
//! state and send commands.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use game::Game;

use crate::controls::Controls;
use crate::dual_screen::DualScreen;
use crate::game_thread::{self, GameHandle};
use crate::palette_visualizer::PaletteVisualizer;
use crate::scoreboard::Scoreboard;
use crate::{about, ui_traits::UiTool};

/// The main RPSLS application.
///
/// ```ignore
/// let app = App::new(game, 2.0);
/// eframe::run_native("RPSLS", options, Box::new(|_| Ok(Box::new(app))));
/// ```
pub struct App {
    handle: Arc<Mutex<GameHandle>>,
    tools: Vec<Box<dyn UiTool>>,
    open: BTreeSet<String>,
}

impl App {
    #[must_use]
    pub fn new(game: Game, scale: f32) -> Self {
        let handle = Arc::new(Mutex::new(game_thread::spawn(game)));

        let tools: Vec<Box<dyn UiTool>> = vec![
            Box::<about::About>::default(),
            Box::new(DualScreen::new(Arc::clone(&handle), scale)),
            Box::new(Controls::new(Arc::clone(&handle))),
            Box::new(Scoreboard::new(Arc::clone(&handle))),
            Box::new(PaletteVisualizer::new(Arc::clone(&handle))),
        ];

        Self::from_tools(handle, tools)
    }

    fn from_tools(handle: Arc<Mutex<GameHandle>>, tools: Vec<Box<dyn UiTool>>) -> Self {
        // everything but the about box starts open
        let open = tools
            .iter()
            .skip(1)
            .take(3)
            .map(|tool| tool.name().to_owned())
            .collect();

        Self {
            handle,
            tools,
            open,
        }
    }

    pub fn checkboxes(&mut self, ui: &mut egui::Ui) {
        let Self { tools, open, .. } = self;
        for tool in tools {
            let mut is_open = open.contains(tool.name());
            ui.toggle_value(&mut is_open, tool.name());
            set_open(open, tool.name(), is_open);
        }
    }

    fn windows(&mut self, ctx: &egui::Context) {
        let Self { tools, open, .. } = self;
        for tool in tools {
            let mut is_open = open.contains(tool.name());
            tool.show(ctx, &mut is_open);
            set_open(open, tool.name(), is_open);
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.request_repaint();

        if let Ok(mut handle) = self.handle.lock() {
            handle.poll();
        }

        egui::SidePanel::right("RPSLS Tools")
            .resizable(false)
            .default_width(200.0)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.heading("✒ RPSLS Tools");
                });

                ui.separator();

                self.checkboxes(ui);
            });

        self.windows(ctx);
    }
}

fn set_open(open: &mut BTreeSet<String>, key: &'static str, is_open: bool) {
    if is_open {
        if !open.contains(key) {
            open.insert(key.to_owned());
        }
    } else {
        open.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_open_toggles_keys() {
        let mut open = BTreeSet::new();
        set_open(&mut open, "Screens", true);
        set_open(&mut open, "Screens", true);
        set_open(&mut open, "Controls", true);
        assert_eq!(open.len(), 2);

        set_open(&mut open, "Screens", false);
        assert_eq!(open.into_iter().collect::<Vec<_>>(), vec![String::from("Controls")]);
    }
}
