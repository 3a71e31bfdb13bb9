//! Host-level scenarios
//!
//! Drives a `LiveSession` through realistic event sequences using a capture
//! device whose acquisitions only resolve when the test opens a gate, so the
//! interleaving of close/unmount and late results is under test control.

use std::collections::{HashSet, VecDeque};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use tokio::sync::{mpsc, Semaphore};

use live_session_core::config::{load_config_from_path, ConfigOverrides, ConfigSource};
use live_session_core::media::{TrackId, TrackKind};
use live_session_core::{
    AcquisitionErrorKind, CaptureConstraints, CaptureDevice, CaptureStream, ConversationConfig,
    DeviceError, HostEvent, HostMessage, LiveSession, LiveSessionConfig, MediaPhase, MediaTrack,
    NotifyLevel, OverlayPanel, Sender, SimulatedOutcome,
};

// =============================================================================
// Scripted capture device
// =============================================================================

struct ScriptedDevice {
    gate: Semaphore,
    answers: Mutex<VecDeque<DeviceError>>,
    live: Mutex<HashSet<TrackId>>,
    released: AtomicUsize,
    propagations: Mutex<Vec<(TrackKind, bool)>>,
    serial: AtomicUsize,
}

impl ScriptedDevice {
    fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            answers: Mutex::new(VecDeque::new()),
            live: Mutex::new(HashSet::new()),
            released: AtomicUsize::new(0),
            propagations: Mutex::new(Vec::new()),
            serial: AtomicUsize::new(0),
        }
    }

    fn failing_with(error: DeviceError) -> Self {
        let device = Self::new();
        device.answers.lock().push_back(error);
        device
    }

    /// Let `n` pending acquisitions resolve
    fn open_gate(&self, n: usize) {
        self.gate.add_permits(n);
    }

    fn live(&self) -> usize {
        self.live.lock().len()
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn propagations(&self) -> Vec<(TrackKind, bool)> {
        self.propagations.lock().clone()
    }
}

#[async_trait]
impl CaptureDevice for ScriptedDevice {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, DeviceError> {
        self.gate
            .acquire()
            .await
            .map_err(|_| DeviceError::Failed("gate closed".to_string()))?
            .forget();

        if let Some(error) = self.answers.lock().pop_front() {
            return Err(error);
        }

        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let mut tracks = Vec::new();
        for kind in [TrackKind::Audio, TrackKind::Video] {
            if constraints.requests(kind) {
                tracks.push(MediaTrack {
                    id: TrackId(format!("{kind}-{serial}")),
                    kind,
                    label: format!("Scripted {kind}"),
                });
            }
        }
        let mut live = self.live.lock();
        for track in &tracks {
            live.insert(track.id.clone());
        }
        Ok(CaptureStream::new(format!("scripted-{serial}"), tracks))
    }

    fn set_track_enabled(&self, track: &MediaTrack, enabled: bool) {
        self.propagations.lock().push((track.kind, enabled));
    }

    fn release_track(&self, track: &MediaTrack) {
        if self.live.lock().remove(&track.id) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Lets a test keep its own handle on a device owned by a host
struct Shared(Arc<ScriptedDevice>);

#[async_trait]
impl CaptureDevice for Shared {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<CaptureStream, DeviceError> {
        self.0.acquire(constraints).await
    }

    fn set_track_enabled(&self, track: &MediaTrack, enabled: bool) {
        self.0.set_track_enabled(track, enabled);
    }

    fn release_track(&self, track: &MediaTrack) {
        self.0.release_track(track);
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn host(device: ScriptedDevice) -> (LiveSession<ScriptedDevice>, mpsc::UnboundedReceiver<HostMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (LiveSession::new(device, LiveSessionConfig::default(), tx), rx)
}

fn drain(rx: &mut mpsc::UnboundedReceiver<HostMessage>) -> Vec<HostMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

async fn say(session: &mut LiveSession<ScriptedDevice>, text: &str) {
    session
        .handle_event(HostEvent::UserMessage {
            content: text.to_string(),
        })
        .await
        .unwrap();
}

fn transcript(session: &LiveSession<ScriptedDevice>) -> Vec<(Sender, String)> {
    session
        .snapshot()
        .messages
        .into_iter()
        .map(|m| (m.sender, m.text))
        .collect()
}

// =============================================================================
// Conversation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_hello_then_reply_after_delay() {
    let (mut session, _rx) = host(ScriptedDevice::new());

    say(&mut session, "hello").await;
    assert_eq!(transcript(&session), vec![(Sender::Local, "hello".to_string())]);

    tokio::time::sleep(Duration::from_millis(999)).await;
    session.poll().await;
    assert_eq!(session.snapshot().messages.len(), 1);

    tokio::time::sleep(Duration::from_millis(2)).await;
    session.poll().await;
    assert_eq!(
        transcript(&session),
        vec![
            (Sender::Local, "hello".to_string()),
            (
                Sender::Remote,
                "This is a simulated response from the chatbot.".to_string()
            ),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_submissions_never_change_the_log() {
    let (mut session, mut rx) = host(ScriptedDevice::new());

    say(&mut session, "one").await;
    say(&mut session, "").await;
    say(&mut session, "   ").await;
    say(&mut session, "\t\n").await;
    say(&mut session, " two ").await;

    assert_eq!(
        transcript(&session),
        vec![
            (Sender::Local, "one".to_string()),
            (Sender::Local, "two".to_string()),
        ]
    );

    let appended = drain(&mut rx)
        .into_iter()
        .filter(|m| matches!(m, HostMessage::MessageAppended { .. }))
        .count();
    assert_eq!(appended, 2);
}

#[tokio::test(start_paused = true)]
async fn test_rapid_submissions_each_get_a_reply() {
    let (mut session, _rx) = host(ScriptedDevice::new());

    for text in ["a", "b", "c"] {
        say(&mut session, text).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.poll().await;
    }
    tokio::time::sleep(Duration::from_millis(1000)).await;
    session.poll().await;

    let senders: Vec<Sender> = transcript(&session).into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        senders,
        vec![
            Sender::Local,
            Sender::Local,
            Sender::Local,
            Sender::Remote,
            Sender::Remote,
            Sender::Remote,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_every_append_is_followed_by_scroll() {
    let (mut session, mut rx) = host(ScriptedDevice::new());

    say(&mut session, "scroll me").await;
    tokio::time::sleep(Duration::from_millis(1100)).await;
    session.poll().await;

    let msgs = drain(&mut rx);
    for (i, msg) in msgs.iter().enumerate() {
        if let HostMessage::MessageAppended { message } = msg {
            assert!(
                matches!(
                    msgs.get(i + 1),
                    Some(HostMessage::ScrollToBottom { message_id }) if *message_id == message.id
                ),
                "append at {i} not followed by scroll"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_quit_before_delay_cancels_reply() {
    let (mut session, _rx) = host(ScriptedDevice::new());

    say(&mut session, "leaving").await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.handle_event(HostEvent::QuitRequested).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(!session.poll().await);
    assert_eq!(transcript(&session), vec![(Sender::Local, "leaving".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_reply_text_and_delay() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let config = LiveSessionConfig {
        conversation: ConversationConfig {
            reply_delay: Duration::from_millis(50),
            reply_text: "Noted.".to_string(),
        },
        constraints: CaptureConstraints::default(),
    };
    let mut session = LiveSession::new(ScriptedDevice::new(), config, tx);

    say(&mut session, "ping").await;
    tokio::time::sleep(Duration::from_millis(60)).await;
    session.poll().await;

    assert_eq!(
        transcript(&session).last(),
        Some(&(Sender::Remote, "Noted.".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_undrained_surface_never_stalls_submit() {
    let (mut session, mut rx) = host(ScriptedDevice::new());

    for i in 0..200 {
        session
            .handle_event(HostEvent::InputChanged {
                text: format!("draft {i}"),
            })
            .await
            .unwrap();
        let submitted = tokio::time::timeout(
            Duration::from_secs(2),
            session.handle_event(HostEvent::SubmitInput),
        )
        .await;
        assert!(submitted.is_ok(), "submit {i} stalled with undrained surface");
    }

    // Appended + ScrollToBottom + InputCleared per submit
    assert_eq!(drain(&mut rx).len(), 600);
}

#[tokio::test(start_paused = true)]
async fn test_many_replies_due_in_one_poll() {
    let (mut session, mut rx) = host(ScriptedDevice::new());

    for i in 0..60 {
        say(&mut session, &format!("m{i}")).await;
    }
    drain(&mut rx);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    let polled = tokio::time::timeout(Duration::from_secs(2), session.poll()).await;
    assert_eq!(polled.ok(), Some(true));

    let remote = transcript(&session)
        .into_iter()
        .filter(|(sender, _)| *sender == Sender::Remote)
        .count();
    assert_eq!(remote, 60);
    // Appended + ScrollToBottom per reply
    assert_eq!(drain(&mut rx).len(), 120);
}

// =============================================================================
// Media
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_close_before_acquisition_resolves_retains_nothing() {
    let (mut session, _rx) = host(ScriptedDevice::new());

    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    settle().await;
    session.handle_event(HostEvent::CloseMedia).await.unwrap();

    session.device().open_gate(1);
    settle().await;
    session.poll().await;

    assert_eq!(session.device().live(), 0);
    assert_eq!(session.device().released(), 2);
    assert!(!session.snapshot().media_visible);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_host_while_acquiring_releases_late_stream() {
    let device = Arc::new(ScriptedDevice::new());
    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(
        Shared(Arc::clone(&device)),
        LiveSessionConfig::default(),
        tx,
    );

    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    settle().await;
    drop(session);

    device.open_gate(1);
    settle().await;

    assert_eq!(device.serial.load(Ordering::SeqCst), 1);
    assert_eq!(device.live(), 0);
    assert_eq!(device.released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_result_from_previous_session_is_released() {
    let (mut session, _rx) = host(ScriptedDevice::new());

    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    settle().await;
    session.handle_event(HostEvent::CloseMedia).await.unwrap();
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    settle().await;

    session.device().open_gate(2);
    settle().await;
    session.poll().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.media.map(|m| m.phase), Some(MediaPhase::Active));
    // One stream of two tracks live, the orphan released
    assert_eq!(session.device().live(), 2);
    assert_eq!(session.device().released(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_audio_twice_restores_flag() {
    let (mut session, _rx) = host(ScriptedDevice::new());
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    session.device().open_gate(1);
    settle().await;
    session.poll().await;

    session.handle_event(HostEvent::ToggleAudio).await.unwrap();
    assert_eq!(session.snapshot().media.map(|m| m.audio_enabled), Some(false));
    session.handle_event(HostEvent::ToggleAudio).await.unwrap();
    assert_eq!(session.snapshot().media.map(|m| m.audio_enabled), Some(true));

    assert_eq!(
        session.device().propagations(),
        vec![(TrackKind::Audio, false), (TrackKind::Audio, true)]
    );
    assert_eq!(session.device().released(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggle_while_acquiring_is_a_warning() {
    let (mut session, mut rx) = host(ScriptedDevice::new());
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    drain(&mut rx);

    session.handle_event(HostEvent::ToggleVideo).await.unwrap();
    assert!(matches!(
        drain(&mut rx).as_slice(),
        [HostMessage::Notify {
            level: NotifyLevel::Warning,
            ..
        }]
    ));
    assert!(session.device().propagations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_denied_acquisition_reported_once() {
    let (mut session, mut rx) = host(ScriptedDevice::failing_with(
        DeviceError::PermissionDenied("user said no".to_string()),
    ));
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    session.device().open_gate(1);
    settle().await;
    session.poll().await;
    session.poll().await;

    let msgs = drain(&mut rx);
    let errors: Vec<AcquisitionErrorKind> = msgs
        .iter()
        .filter_map(|m| match m {
            HostMessage::MediaError { kind, .. } => Some(*kind),
            _ => None,
        })
        .collect();
    assert_eq!(errors, vec![AcquisitionErrorKind::Denied]);

    let media = session.snapshot().media.unwrap();
    assert_eq!(media.phase, MediaPhase::Closed);
    assert!(media.preview.is_none());
    assert_eq!(session.device().live(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlay_toggle_to_none() {
    let (mut session, mut rx) = host(ScriptedDevice::new());
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    drain(&mut rx);

    let select = |panel| HostEvent::SelectOverlay { panel };
    session.handle_event(select(OverlayPanel::Chat)).await.unwrap();
    session.handle_event(select(OverlayPanel::Chat)).await.unwrap();
    session.handle_event(select(OverlayPanel::Chat)).await.unwrap();
    session.handle_event(select(OverlayPanel::Settings)).await.unwrap();

    let overlays: Vec<Option<OverlayPanel>> = drain(&mut rx)
        .into_iter()
        .filter_map(|m| match m {
            HostMessage::Overlay { active } => Some(active),
            _ => None,
        })
        .collect();
    assert_eq!(
        overlays,
        vec![
            Some(OverlayPanel::Chat),
            None,
            Some(OverlayPanel::Chat),
            Some(OverlayPanel::Settings),
        ]
    );
}

// =============================================================================
// Configuration
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_config_file_drives_simulated_session() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[conversation]
reply_delay_ms = 20
reply_text = "from file"

[device]
latency_ms = 0
outcome = "deny"
"#
    )
    .unwrap();

    let mut config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.source(), ConfigSource::File);

    ConfigOverrides::new()
        .with_device_outcome(SimulatedOutcome::Grant)
        .apply(&mut config);
    assert_eq!(config.source(), ConfigSource::Cli);

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut session = LiveSession::new(config.simulated_device(), config.session_config(), tx);

    session
        .handle_event(HostEvent::UserMessage {
            content: "hi".to_string(),
        })
        .await
        .unwrap();
    session.handle_event(HostEvent::OpenMedia).await.unwrap();
    tokio::time::sleep(Duration::from_millis(25)).await;
    session.poll().await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.messages.last().map(|m| m.text.as_str()), Some("from file"));
    assert_eq!(snapshot.media.map(|m| m.phase), Some(MediaPhase::Active));
}
