//! Frame Rendering
//!
//! Draws a [`DisplayState`] into a ratatui frame: the conversation on the
//! left, the media panel (when mounted) on the right with its overlay popup,
//! the input box and a one-line status bar.
//!
//! Rendering is a pure function of display state, so it can be exercised
//! against ratatui's `TestBackend`.

use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use live_session_core::{
    AcquisitionErrorKind, MediaPhase, OverlayPanel, Sender, SessionConfigFile, TrackKind,
};

use crate::display::{DisplayMedia, DisplayState};
use crate::theme;

/// Input box height (lines) for text wrapping
pub const INPUT_HEIGHT: u16 = 5;

/// Messages shown in the chat popup
const CHAT_OVERLAY_MESSAGES: usize = 6;

/// Rows shown in the settings popup
#[derive(Clone, Debug, Default)]
pub struct SettingsSummary {
    rows: Vec<(&'static str, String)>,
}

impl SettingsSummary {
    /// Describe the effective configuration
    pub fn from_config(config: &SessionConfigFile) -> Self {
        let on_off = |b: bool| if b { "requested" } else { "off" }.to_string();
        let source = match &config.config_file_path {
            Some(path) => format!("{} ({})", config.source(), path.display()),
            None => config.source().to_string(),
        };

        Self {
            rows: vec![
                (
                    "Reply delay",
                    format!("{} ms", config.reply_delay.as_millis()),
                ),
                ("Microphone", on_off(config.constraints.audio)),
                ("Camera", on_off(config.constraints.video)),
                (
                    "Device",
                    format!(
                        "{:?}, {} ms latency",
                        config.device_outcome,
                        config.device_latency.as_millis()
                    ),
                ),
                ("Config", source),
            ],
        }
    }

    /// Label/value pairs
    pub fn rows(&self) -> &[(&'static str, String)] {
        &self.rows
    }
}

/// Layout facts the event loop needs for scrolling
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameMetrics {
    /// Wrapped conversation lines
    pub conversation_lines: usize,
    /// Visible conversation rows
    pub conversation_height: usize,
}

/// Draw one frame
pub fn draw(frame: &mut Frame, display: &DisplayState, settings: &SettingsSummary) -> FrameMetrics {
    let [main, input, status] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let metrics = if display.media.visible {
        let [conversation, media] =
            Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)])
                .areas(main);
        let metrics = render_conversation(frame, conversation, display);
        render_media(frame, media, &display.media);
        if let Some(panel) = display.media.overlay {
            render_overlay(frame, media, panel, display, settings);
        }
        metrics
    } else {
        render_conversation(frame, main, display)
    };

    render_input(frame, input, display);
    render_status(frame, status, display);
    metrics
}

fn sender_style(sender: Sender) -> Style {
    match sender {
        Sender::Local => Style::default().fg(theme::LOCAL_GREEN),
        Sender::Remote => Style::default().fg(theme::REMOTE_MAGENTA),
    }
}

fn render_conversation(frame: &mut Frame, area: Rect, display: &DisplayState) -> FrameMetrics {
    let width = area.width.saturating_sub(1) as usize;
    let height = area.height as usize;

    if width < 10 || height == 0 {
        return FrameMetrics::default();
    }

    // Build wrapped lines from display messages
    let mut all_lines: Vec<(String, Style)> = Vec::new();
    for msg in &display.messages {
        let content = format!("{}{}", msg.prefix(), msg.content);
        for line in textwrap::wrap(&content, width) {
            all_lines.push((line.into_owned(), sender_style(msg.sender)));
        }
        all_lines.push((String::new(), Style::default()));
    }

    let total_lines = all_lines.len();
    let scroll_offset = display
        .scroll_offset
        .min(total_lines.saturating_sub(height));
    let visible_end = total_lines - scroll_offset;
    let visible_start = visible_end.saturating_sub(height);

    let has_content_above = visible_start > 0;
    let has_content_below = scroll_offset > 0;
    let visible_len = visible_end - visible_start;

    let lines: Vec<Line> = all_lines[visible_start..visible_end]
        .iter()
        .enumerate()
        .map(|(i, (text, style))| {
            let from_bottom = visible_len - 1 - i;
            let style = if has_content_above && i < 2 {
                Style::default().fg(if i == 0 { theme::FADE_DARK } else { theme::FADE_LIGHT })
            } else if has_content_below && from_bottom < 2 {
                Style::default().fg(if from_bottom == 0 {
                    theme::FADE_DARK
                } else {
                    theme::FADE_LIGHT
                })
            } else {
                *style
            };
            Line::styled(text.clone(), style)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), area);

    FrameMetrics {
        conversation_lines: total_lines,
        conversation_height: height,
    }
}

fn render_media(frame: &mut Frame, area: Rect, media: &DisplayMedia) {
    let phase = media.phase();
    let block = Block::default()
        .title(format!(" Live · {} ", phase.description()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::phase_color(phase)))
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [body, controls] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(2)]).areas(inner);

    let dim = Style::default().fg(theme::DIM_GRAY);
    let mut lines: Vec<Line> = Vec::new();

    match phase {
        MediaPhase::Idle | MediaPhase::Acquiring => {
            lines.push(Line::styled(
                "Requesting camera and microphone access...",
                Style::default().fg(theme::PENDING_BLUE),
            ));
        }
        MediaPhase::Active => {
            let snapshot = media.snapshot.as_ref();
            if let Some(preview) = snapshot.and_then(|s| s.preview.as_ref()) {
                lines.push(Line::from(vec![
                    Span::styled(
                        "● LIVE",
                        Style::default()
                            .fg(theme::LIVE_RED)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(preview.device.clone(), dim),
                ]));
                lines.push(Line::raw(""));

                let camera_on = snapshot.is_some_and(|s| s.video_enabled);
                let camera = preview.tracks.iter().find(|t| t.kind == TrackKind::Video);
                match camera {
                    Some(track) if camera_on => lines.push(Line::styled(
                        format!("[ preview: {} ]", track.label),
                        Style::default().fg(Color::White),
                    )),
                    Some(_) => lines.push(Line::styled(
                        "Camera is off",
                        Style::default().fg(theme::MUTED_AMBER),
                    )),
                    None => lines.push(Line::styled("Audio only", dim)),
                }
                lines.push(Line::raw(""));

                for track in &preview.tracks {
                    let state = match (track.kind, track.enabled) {
                        (_, true) => Span::styled("on", Style::default().fg(theme::SUCCESS_GREEN)),
                        (TrackKind::Audio, false) => {
                            Span::styled("muted", Style::default().fg(theme::MUTED_AMBER))
                        }
                        (TrackKind::Video, false) => {
                            Span::styled("off", Style::default().fg(theme::MUTED_AMBER))
                        }
                    };
                    lines.push(Line::from(vec![
                        Span::styled(format!("{:<6}", track.kind.to_string()), dim),
                        Span::raw(format!("{} ", track.label)),
                        state,
                    ]));
                }
            }
        }
        MediaPhase::Closed => match &media.error {
            Some((kind, message)) => {
                let headline = match kind {
                    AcquisitionErrorKind::Denied => "Camera access was denied",
                    AcquisitionErrorKind::Unavailable => "No camera found",
                    AcquisitionErrorKind::Failed => "Camera failed to start",
                };
                lines.push(Line::styled(
                    headline,
                    Style::default()
                        .fg(theme::ERROR_RED)
                        .add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::styled(message.clone(), dim));
                lines.push(Line::raw(""));
                lines.push(Line::styled("F2 to retry · Esc to close", dim));
            }
            None => lines.push(Line::styled("Session ended", dim)),
        },
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), body);
    frame.render_widget(
        Paragraph::new(control_hints(media)).wrap(Wrap { trim: true }),
        controls,
    );
}

fn control_hints(media: &DisplayMedia) -> Line<'static> {
    let (mic, cam) = match &media.snapshot {
        Some(s) if s.phase == MediaPhase::Active => (
            if s.audio_enabled { "F3 Mute" } else { "F3 Unmute" },
            if s.video_enabled { "F4 Camera off" } else { "F4 Camera on" },
        ),
        _ => ("F3 Mute", "F4 Camera"),
    };
    let key = |text: &'static str, active: bool| {
        let style = if active {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(theme::DIM_GRAY)
        };
        Span::styled(text, style)
    };

    Line::from(vec![
        key(mic, false),
        Span::raw(" "),
        key(cam, false),
        Span::raw(" "),
        key("F5 Chat", media.overlay == Some(OverlayPanel::Chat)),
        Span::raw(" "),
        key("F6 Settings", media.overlay == Some(OverlayPanel::Settings)),
        Span::raw(" "),
        key("F7 Gift", false),
        Span::raw(" "),
        key("Esc Close", false),
    ])
}

fn popup_area(area: Rect, percent_x: u16, height: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    area
}

fn render_overlay(
    frame: &mut Frame,
    area: Rect,
    panel: OverlayPanel,
    display: &DisplayState,
    settings: &SettingsSummary,
) {
    let lines: Vec<Line> = match panel {
        OverlayPanel::Chat => {
            let skip = display.messages.len().saturating_sub(CHAT_OVERLAY_MESSAGES);
            let recent: Vec<Line> = display.messages[skip..]
                .iter()
                .map(|m| Line::styled(format!("{}{}", m.prefix(), m.content), sender_style(m.sender)))
                .collect();
            if recent.is_empty() {
                vec![Line::styled("No messages yet", Style::default().fg(theme::DIM_GRAY))]
            } else {
                recent
            }
        }
        OverlayPanel::Settings => settings
            .rows()
            .iter()
            .map(|(label, value)| {
                Line::from(vec![
                    Span::styled(
                        format!("{label:<12}"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(value.clone()),
                ])
            })
            .collect(),
    };

    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = popup_area(area, 85, height);
    let block = Block::default()
        .title(format!(" {} ", panel.title()))
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1));

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        popup,
    );
}

fn render_input(frame: &mut Frame, area: Rect, display: &DisplayState) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text_width = inner.width.saturating_sub(1) as usize;
    let text_height = inner.height as usize;
    if text_width < 5 || text_height == 0 {
        return;
    }

    let full_input = format!("You: {}_", display.input);
    let wrapped: Vec<String> = textwrap::wrap(&full_input, text_width)
        .into_iter()
        .map(|s| s.into_owned())
        .collect();
    let skip = wrapped.len().saturating_sub(text_height);
    let lines: Vec<Line> = wrapped[skip..]
        .iter()
        .map(|l| Line::styled(l.clone(), Style::default().fg(theme::LOCAL_GREEN)))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_status(frame: &mut Frame, area: Rect, display: &DisplayState) {
    let left = match &display.notification {
        Some(notification) => Span::styled(
            format!(" {}", notification.message),
            Style::default().fg(theme::notify_color(notification.level)),
        ),
        None => {
            let media = if display.media.visible {
                display.media.phase().description()
            } else {
                "Chat"
            };
            let scroll_info = if display.scroll_offset > 0 {
                format!(" [^{} lines - PgDn to scroll]", display.scroll_offset)
            } else {
                String::new()
            };
            Span::styled(
                format!(
                    " {media} | Enter send · F2 camera · PgUp/PgDn scroll · Esc quit{scroll_info}"
                ),
                Style::default().fg(theme::DIM_GRAY),
            )
        }
    };

    let mut spans = vec![left];
    if let Some(id) = &display.session_id {
        let used = spans[0].content.width();
        let label = id.to_string();
        let free = (area.width as usize).saturating_sub(used + label.width() + 1);
        if free > 0 {
            spans.push(Span::raw(" ".repeat(free)));
            spans.push(Span::styled(label, Style::default().fg(theme::FADE_DARK)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
