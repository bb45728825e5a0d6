pub mod about;
pub mod app;
pub mod controls;
pub mod dual_screen;
pub mod game_thread;
pub mod palette_visualizer;
pub mod scoreboard;
pub mod ui_traits;
