use std::rc::Rc;

use tokio::sync::mpsc;

use mania::{
    AudioSource, GameSession, InputEdge, LoopConfig, LoopExit, NullRenderer, SessionCommand,
    SessionOptions, SessionState,
};
use mania_audio::SystemTime;
use mania_config::MemoryStore;

const SHORT_CHART: &str = "\
[Difficulty]
CircleSize:4

[HitObjects]
64,192,40,1,0,0:0:0:0:
448,192,80,1,0,0:0:0:0:
";

async fn session(autoplay: bool) -> GameSession {
    let mut session = GameSession::with_time(
        Box::new(MemoryStore::new()),
        Rc::new(SystemTime::new()),
        SessionOptions {
            autoplay,
            ..SessionOptions::default()
        },
    );
    session
        .init(SHORT_CHART, AudioSource::Silence)
        .await
        .unwrap();
    session
}

fn channels() -> (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionCommand>,
    mpsc::UnboundedSender<InputEdge>,
    mpsc::UnboundedReceiver<InputEdge>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (input_tx, input_rx) = mpsc::unbounded_channel();
    (command_tx, command_rx, input_tx, input_rx)
}

#[tokio::test]
async fn test_destroy_command_stops_loop() {
    let mut session = session(false).await;
    let (command_tx, command_rx, _input_tx, input_rx) = channels();
    command_tx.send(SessionCommand::Start).unwrap();
    command_tx.send(SessionCommand::Destroy).unwrap();

    let mut renderer = NullRenderer::default();
    let exit = mania::run(
        &mut session,
        &mut renderer,
        command_rx,
        input_rx,
        &LoopConfig::default(),
    )
    .await;

    assert_eq!(exit, LoopExit::Destroyed);
    assert_eq!(session.state(), SessionState::Idle);
}

#[tokio::test]
async fn test_closed_command_channel_ends_loop() {
    let mut session = session(false).await;
    let (command_tx, command_rx, _input_tx, input_rx) = channels();
    drop(command_tx);

    let exit = mania::run(
        &mut session,
        &mut NullRenderer::default(),
        command_rx,
        input_rx,
        &LoopConfig::default(),
    )
    .await;
    assert_eq!(exit, LoopExit::CommandsClosed);
}

#[tokio::test]
async fn test_commands_apply_before_ticks() {
    let mut session = session(false).await;
    let (command_tx, command_rx, input_tx, input_rx) = channels();
    command_tx.send(SessionCommand::Start).unwrap();
    command_tx.send(SessionCommand::ChangeScrollSpeed(0.2)).unwrap();
    command_tx.send(SessionCommand::SetLogicRate(500)).unwrap();
    input_tx
        .send(InputEdge::Down {
            key: "escape".to_string(),
            timestamp: 0.0,
            repeat: false,
        })
        .unwrap();
    command_tx.send(SessionCommand::Destroy).unwrap();

    let exit = mania::run(
        &mut session,
        &mut NullRenderer::default(),
        command_rx,
        input_rx,
        &LoopConfig::default(),
    )
    .await;

    // Destroy is a command, so it wins over the queued pause key
    assert_eq!(exit, LoopExit::Destroyed);
    assert_eq!(session.settings().scroll_speed, 1.0);
    assert_eq!(session.logic_rate_hz(), 500);
}

#[tokio::test]
async fn test_autoplay_runs_to_song_end() {
    let mut session = session(true).await;
    let (_command_tx, command_rx, input_tx, input_rx) = channels();
    drop(input_tx);
    session.start();

    let mut renderer = NullRenderer::default();
    let exit = mania::run(
        &mut session,
        &mut renderer,
        command_rx,
        input_rx,
        &LoopConfig::default(),
    )
    .await;

    assert_eq!(exit, LoopExit::SongEnded);
    let score = session.score();
    assert_eq!(score.perfect, 2);
    assert_eq!(score.miss, 0);
    assert!(renderer.frames > 0);
}
