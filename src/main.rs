use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use cadence_rs::logger::{self, LogLevel};
use cadence_rs::renderer::utterance_style;
use cadence_rs::{
    AdaptivePacingEngine, AnsiScreen, LagSchedule, LaggedTokenSource, PacingConfig,
    RandomChooser, Style, TokenSource, TranscriptRenderer, config, render_stream,
};
use clap::Parser;
use tracing::{debug, info};

/// First screen row used by the paced output; rows above show the raw input.
const OUTPUT_ROW: u16 = 3;

#[derive(Parser, Debug)]
#[command(name = "cadence", about = "Pace a lagging token feed into steady speech")]
struct Cli {
    /// TOML configuration file
    #[arg(long, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Text to speak instead of the configured one
    #[arg(long)]
    text: Option<String>,

    /// Lag schedule as `position:ms` pairs, e.g. `1:1000,3:2000`
    #[arg(long)]
    lag: Option<LagSchedule>,

    /// Pause after every spoken word, in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Seed for filler selection
    #[arg(long)]
    seed: Option<u64>,

    /// Viewport width in columns
    #[arg(long)]
    width: Option<u16>,

    /// Viewport height in rows
    #[arg(long)]
    height: Option<u16>,

    /// Logging verbosity level
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,
}

impl Cli {
    /// Applies command line overrides on top of `cfg`.
    fn apply(self, mut cfg: PacingConfig) -> PacingConfig {
        if let Some(text) = self.text {
            cfg.text = text;
        }
        if let Some(lag) = self.lag {
            cfg.lag = lag;
        }
        if let Some(ms) = self.interval_ms {
            cfg.speaking_interval_ms = ms;
        }
        cfg.seed = self.seed.or(cfg.seed);
        cfg.width = self.width.or(cfg.width);
        cfg.height = self.height.or(cfg.height);
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    logger::try_init(cli.log_level).map_err(|e| anyhow::anyhow!(e))?;
    let base = match cli.config.take() {
        Some(path) => config::load(&path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => PacingConfig::default(),
    };
    run(cli.apply(base)).await
}

async fn run(cfg: PacingConfig) -> anyhow::Result<()> {
    let fillers = cfg.filler_set()?;
    let source = LaggedTokenSource::new(&cfg.text, cfg.lag.clone());
    // The input rows replay their own copy so both views see every token.
    let mut input = source.clone();
    let chooser = match cfg.seed {
        Some(seed) => RandomChooser::seeded(seed),
        None => RandomChooser::new(),
    };

    let mut screen = AnsiScreen::stdout().with_size(cfg.width, cfg.height);
    screen.clear()?;
    let screen = Mutex::new(screen);

    info!(tokens = source.len(), lag_entries = cfg.lag.len(), "speaking");
    let (engine, drain) = AdaptivePacingEngine::spawn(source, cfg.engine(), fillers, chooser);

    let input_rows = render_stream(
        input.stream(),
        &screen,
        TranscriptRenderer::new(0, OUTPUT_ROW),
        "Input Stream :",
        |_| Style::Input,
    );
    let output_rows = render_stream(
        engine.into_stream(),
        &screen,
        TranscriptRenderer::new(OUTPUT_ROW, u16::MAX),
        "Output Stream:",
        utterance_style,
    );

    tokio::select! {
        rendered = async { tokio::try_join!(input_rows, output_rows) } => {
            let (input_summary, output_summary) = rendered?;
            debug!(?input_summary, ?output_summary, "rendering finished");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            drain.abort();
        }
    }

    match drain.join().await {
        Ok(stats) => info!(
            drained = stats.drained,
            spoken = stats.spoken,
            fillers = stats.fillers,
            lag_events = stats.lag_events,
            "run complete"
        ),
        Err(e) if e.is_cancelled() => debug!("drain task cancelled"),
        Err(e) => return Err(e.into()),
    }

    screen
        .into_inner()
        .map_err(|_| anyhow::anyhow!("screen lock poisoned"))?
        .finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["cadence"]).unwrap();
        assert!(matches!(cli.log_level, LogLevel::Warn));
        assert!(cli.config.is_none());
        let cfg = cli.apply(PacingConfig::default());
        assert_eq!(cfg, PacingConfig::default());
    }

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "cadence",
            "--text",
            "a b c",
            "--lag",
            "1:100",
            "--interval-ms",
            "5",
            "--seed",
            "9",
            "--height",
            "12",
        ])
        .unwrap();
        let base = PacingConfig {
            width: Some(70),
            ..PacingConfig::default()
        };
        let cfg = cli.apply(base);
        assert_eq!(cfg.text, "a b c");
        assert_eq!(cfg.lag.delay_at(1), Duration::from_millis(100));
        assert_eq!(cfg.engine().speaking_interval, Duration::from_millis(5));
        assert_eq!(cfg.seed, Some(9));
        assert_eq!((cfg.width, cfg.height), (Some(70), Some(12)));
    }

    #[test]
    fn bad_lag_flag_is_rejected() {
        assert!(Cli::try_parse_from(["cadence", "--lag", "oops"]).is_err());
    }
}
