use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use game::{Config, Game, Mode};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Rock Paper Scissors Lizard Spock on a dual-screen sprite engine.",
    long_about = None
)]
struct Args {
    /// JSON config file. `rpsls.json` is used when present.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter such as `debug` or `engine=trace`, wins over `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,

    /// Also write logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Root of the save data.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Profile to play as, created when missing.
    #[arg(short, long)]
    profile: Option<String>,

    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Seed for the computer's choices.
    #[arg(long)]
    seed: Option<u64>,

    /// Start with gray palettes.
    #[arg(long)]
    grayscale: bool,

    /// Window pixels per screen pixel.
    #[arg(long)]
    scale: Option<f32>,

    #[arg(long)]
    fps: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Single,
    Multi,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Single => Self::Single,
            ModeArg::Multi => Self::Multi,
        }
    }
}

impl Args {
    /// Flags given on the command line replace the config's values.
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.log_file {
            config.log_file = Some(path.clone());
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(profile) = &self.profile {
            config.profile = profile.clone();
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.grayscale {
            config.grayscale = true;
        }
        if let Some(scale) = self.scale {
            config.scale = scale;
        }
        if let Some(fps) = self.fps {
            config.frames_per_second = fps;
        }
    }
}

/// Installs the global subscriber. The returned guard flushes the log file
/// when dropped, keep it alive until exit.
fn init_logging(level: Option<&str>, file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?,
    };

    let (file_layer, guard) = match file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path.file_name().context("log file has no file name")?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(file_layer)
        .try_init()?;
    Ok(guard)
}

#[allow(clippy::cast_precision_loss)]
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config =
        Config::load_or_default(args.config.as_deref()).context("could not load the config")?;
    args.apply(&mut config);

    let _guard = init_logging(args.log_level.as_deref(), config.log_file.as_deref())?;
    tracing::info!("rpsls v{}", env!("CARGO_PKG_VERSION"));

    let game = Game::new(&config).context("could not start the game")?;
    let scale = config.scale;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([256.0 * scale + 560.0, 192.0 * 2.0 * scale + 120.0])
            .with_title("RPSLS"),
        ..Default::default()
    };

    eframe::run_native(
        "RPSLS",
        options,
        Box::new(move |_cc| Ok(Box::new(ui::app::App::new(game, scale)))),
    )
    .map_err(|err| anyhow::anyhow!("window closed with an error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_the_config() {
        let args = Args::try_parse_from([
            "rpsls",
            "--profile",
            "Gerald",
            "--mode",
            "multi",
            "--seed",
            "9",
            "--grayscale",
            "--fps",
            "30",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.profile, "Gerald");
        assert_eq!(config.mode, Mode::Multi);
        assert_eq!(config.seed, Some(9));
        assert!(config.grayscale);
        assert_eq!(config.frames_per_second, 30);
        assert_eq!(config.scale, Config::default().scale);
    }

    #[test]
    fn missing_flags_keep_the_config() {
        let args = Args::try_parse_from(["rpsls"]).unwrap();
        let mut config = Config {
            grayscale: true,
            seed: Some(1),
            ..Config::default()
        };
        let expected = config.clone();
        args.apply(&mut config);
        assert_eq!(config, expected);
    }
}
