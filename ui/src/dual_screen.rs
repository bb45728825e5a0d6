use egui::{self, ColorImage, ImageSource, Response, Ui};

use eframe::epaint::textures::TextureOptions;
use egui::load::SizedTexture;
use std::sync::{Arc, Mutex};

use engine::render::{SCREEN_HEIGHT, SCREEN_WIDTH};

use crate::game_thread::{FrameBuffer, GameCommand, GameHandle};
use crate::ui_traits::UiTool;

/// Engine screen that receives touches.
const TOUCH_SCREEN: usize = 0;

/// Both screens stacked, the touch screen below unless swapped.
pub struct DualScreen {
    handle: Arc<Mutex<GameHandle>>,
    scale: f32,
    swapped: bool,
    touching: bool,
}

impl DualScreen {
    pub(crate) const fn new(handle: Arc<Mutex<GameHandle>>, scale: f32) -> Self {
        Self {
            handle,
            scale,
            swapped: false,
            touching: false,
        }
    }

    /// Screen pixel under `response`'s pointer while the primary button is
    /// held on it.
    #[allow(clippy::cast_possible_truncation)]
    fn touch_point(&self, response: &Response) -> Option<(i32, i32)> {
        if !response.is_pointer_button_down_on() {
            return None;
        }
        let pos = response.interact_pointer_pos()?;
        let local = (pos - response.rect.min) / self.scale;
        Some((local.x.floor() as i32, local.y.floor() as i32))
    }
}

#[allow(clippy::cast_precision_loss)]
fn screen_image(ui: &mut Ui, name: &str, frame: &FrameBuffer, scale: f32) -> Response {
    let image = ColorImage::from_rgb([SCREEN_WIDTH, SCREEN_HEIGHT], frame);

    let texture = ui.ctx().load_texture(name, image, TextureOptions::NEAREST);

    ui.add(
        egui::Image::new(ImageSource::Texture(SizedTexture {
            id: texture.id(),
            size: egui::vec2(SCREEN_WIDTH as f32 * scale, SCREEN_HEIGHT as f32 * scale),
        }))
        .sense(egui::Sense::click_and_drag()),
    )
}

impl UiTool for DualScreen {
    fn name(&self) -> &'static str {
        "Screens"
    }

    #[allow(clippy::cast_precision_loss)]
    fn show(&mut self, ctx: &egui::Context, open: &mut bool) {
        egui::Window::new(self.name())
            .open(open)
            .default_width(SCREEN_WIDTH as f32 * self.scale)
            .default_pos(egui::pos2(10.0, 10.0))
            .collapsible(false)
            .show(ctx, |ui| {
                self.ui(ui);
            });
    }

    fn ui(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.swapped, "Swap screens");
            ui.add(egui::Slider::new(&mut self.scale, 1.0..=4.0).text("Scale"));
        });

        let Ok(mut handle) = self.handle.lock() else {
            return;
        };
        let Some(frames) = handle.frames.as_deref() else {
            ui.label("Waiting for the first frame…");
            return;
        };

        let order = if self.swapped { [0, 1] } else { [1, 0] };
        let mut touch = None;
        for screen in order {
            let response = screen_image(ui, &format!("screen_{screen}"), &frames[screen], self.scale);
            if screen == TOUCH_SCREEN {
                touch = self.touch_point(&response);
            }
        }

        match touch {
            Some((x, y)) => {
                handle.send(GameCommand::Touch { x, y });
                self.touching = true;
            }
            None if self.touching => {
                handle.send(GameCommand::Release);
                self.touching = false;
            }
            None => {}
        }
    }
}
