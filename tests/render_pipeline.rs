use std::io;
use std::sync::Mutex;
use std::time::Duration;

use cadence_rs::renderer::utterance_style;
use cadence_rs::{
    AdaptivePacingEngine, BufferScreen, EngineConfig, FillerSet, LagSchedule, LaggedTokenSource,
    Screen, SequentialChooser, Style, TokenSource, TranscriptRenderer, render_stream,
};
use futures::stream;
use tracing_test::traced_test;

fn engine(text: &str, lag: LagSchedule) -> (AdaptivePacingEngine, cadence_rs::DrainHandle) {
    AdaptivePacingEngine::spawn(
        LaggedTokenSource::new(text, lag),
        EngineConfig::default().speaking_interval(Duration::from_millis(20)),
        FillerSet::new(["um"]).unwrap(),
        SequentialChooser::default(),
    )
}

#[tokio::test(start_paused = true)]
async fn input_and_output_share_one_screen() {
    let text = "paced words arrive";
    let lag = LagSchedule::new().with(1, 70);
    let mut input = LaggedTokenSource::new(text, lag.clone());
    let (engine, drain) = engine(text, lag);
    let screen = Mutex::new(BufferScreen::new(200, 6));

    let (input_summary, output_summary) = tokio::try_join!(
        render_stream(
            input.stream(),
            &screen,
            TranscriptRenderer::new(0, 3),
            "Input Stream :",
            |_| Style::Input,
        ),
        render_stream(
            engine.into_stream(),
            &screen,
            TranscriptRenderer::new(3, 6),
            "Output Stream:",
            utterance_style,
        ),
    )
    .unwrap();
    drain.join().await.unwrap();

    assert_eq!(input_summary.placed, 3);
    assert!(!output_summary.truncated);
    let screen = screen.into_inner().unwrap();
    assert_eq!(screen.row_text(0), "Input Stream : paced words arrive");

    let output = screen.row_text(3);
    assert!(output.starts_with("Output Stream: "));
    let real: Vec<&str> = output
        .trim_start_matches("Output Stream:")
        .split_whitespace()
        .filter(|w| *w != "um")
        .collect();
    assert_eq!(real, ["paced", "words", "arrive"]);

    let filler_writes = screen
        .writes()
        .iter()
        .filter(|(_, _, text, style)| *style == Style::Filler && text == "um")
        .count();
    assert!(filler_writes >= 1);
    assert!(
        screen
            .writes()
            .iter()
            .filter(|w| w.3 == Style::Spoken)
            .all(|w| w.2 != "um")
    );
}

#[tokio::test(start_paused = true)]
async fn small_viewport_truncates_output_quietly() {
    let text = "many words that will never fit inside a tiny viewport at all";
    let (engine, drain) = engine(text, LagSchedule::new());
    let screen = Mutex::new(BufferScreen::new(24, 2));

    let summary = render_stream(
        engine.into_stream(),
        &screen,
        TranscriptRenderer::new(0, 2),
        "Output Stream:",
        utterance_style,
    )
    .await
    .unwrap();

    assert!(summary.truncated);
    assert!(summary.placed > 0);
    let stats = drain.join().await.unwrap();
    assert_eq!(stats.drained, 12);
    assert!(stats.spoken < stats.drained);
}

struct UnpluggedScreen;

impl Screen for UnpluggedScreen {
    fn size(&self) -> (u16, u16) {
        (80, 4)
    }

    fn put_str(&mut self, _row: u16, _col: u16, _text: &str, _style: Style) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal went away"))
    }

    fn refresh(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[traced_test]
#[tokio::test]
async fn screen_failure_is_logged_and_returned() {
    let screen = Mutex::new(UnpluggedScreen);
    let err = render_stream(
        stream::iter(["hello"]),
        &screen,
        TranscriptRenderer::new(0, 3),
        "Input Stream :",
        |_| Style::Input,
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert!(logs_contain("render failed"));
    assert!(logs_contain("terminal went away"));
}
