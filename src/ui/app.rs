use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info, warn};

use crate::backend::{ChatBackend, HttpBackend};
use crate::config::WidgetConfig;
use crate::events::{SubmitOutcome, TuiEvent};
use crate::storage::HistoryStore;
use crate::ui::composer::{Composer, ComposerResult};
use crate::ui::panel::{self, PanelView, TerminalRenderer};
use crate::widget::ChatWidget;

type Tui = Terminal<CrosstermBackend<Stdout>>;

const SCROLL_STEP: usize = 5;
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Build a widget from `config` and run it until the user quits
pub async fn run(config: WidgetConfig) -> Result<()> {
    let backend = HttpBackend::new(&config.base_url).context("Failed to create HTTP client")?;
    let store = config.history_store();
    let (renderer, view) = TerminalRenderer::new(&config.greeting);

    println!("Connecting to {}...", backend.base_url());
    let mut widget = ChatWidget::create(&config, backend, store, renderer).await;
    info!(position = %widget.position(), "Widget ready");

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut widget, &view).await;
    restore_terminal(&mut terminal)?;

    widget.dispose();
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableBracketedPaste)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

fn to_tui_event(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(TuiEvent::Key(key)),
        Event::Paste(text) => Some(TuiEvent::Paste(text)),
        Event::Resize(w, h) => Some(TuiEvent::Resize(w, h)),
        _ => None,
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn is_toggle(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('o')
}

async fn event_loop<B, S>(
    terminal: &mut Tui,
    widget: &mut ChatWidget<B, S, TerminalRenderer>,
    view: &PanelView,
) -> Result<()>
where
    B: ChatBackend,
    S: HistoryStore,
{
    let mut events = EventStream::new();
    let mut composer = Composer::new("Enter your message");

    loop {
        composer.set_enabled(view.input_enabled());
        let (position, open) = (widget.position(), widget.is_open());
        terminal
            .draw(|frame| panel::draw(frame, view, &composer, position, open))
            .context("Failed to draw widget")?;

        let Some(event) = events.next().await else {
            break;
        };
        let Some(event) = to_tui_event(event.context("Failed to read terminal event")?) else {
            continue;
        };

        match event {
            TuiEvent::Key(key) if is_quit(&key) => break,
            TuiEvent::Key(key) if is_toggle(&key) => {
                widget.toggle_open();
            }
            TuiEvent::Key(_) | TuiEvent::Paste(_) if !widget.is_open() => {}
            TuiEvent::Key(key) => match key.code {
                KeyCode::Esc => widget.close(),
                KeyCode::PageUp => view.scroll_up(SCROLL_STEP),
                KeyCode::PageDown => view.scroll_down(SCROLL_STEP),
                _ => {
                    if let ComposerResult::Submitted(text) = composer.handle_key(key) {
                        let quit =
                            submit_and_wait(terminal, widget, view, &mut composer, &mut events, &text)
                                .await?;
                        if quit {
                            break;
                        }
                    }
                }
            },
            TuiEvent::Paste(text) => composer.insert_str(&text),
            TuiEvent::Resize(width, height) => debug!(width, height, "Terminal resized"),
        }
    }

    Ok(())
}

/// Keep drawing while one message is in flight. Only quitting is accepted
/// until the exchange finishes; returns `true` if the user quit.
async fn submit_and_wait<B, S>(
    terminal: &mut Tui,
    widget: &mut ChatWidget<B, S, TerminalRenderer>,
    view: &PanelView,
    composer: &mut Composer,
    events: &mut EventStream,
    text: &str,
) -> Result<bool>
where
    B: ChatBackend,
    S: HistoryStore,
{
    let position = widget.position();
    let submit = widget.submit(text);
    tokio::pin!(submit);
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        composer.set_enabled(view.input_enabled());
        terminal
            .draw(|frame| panel::draw(frame, view, &*composer, position, true))
            .context("Failed to draw widget")?;

        tokio::select! {
            outcome = &mut submit => {
                match outcome {
                    SubmitOutcome::Failed(e) => warn!(error = %e, "Message not delivered"),
                    SubmitOutcome::Busy => warn!("Previous message still pending"),
                    SubmitOutcome::Replied(_) | SubmitOutcome::Ignored => {}
                }
                return Ok(false);
            }
            event = events.next() => match event {
                None => return Ok(true),
                Some(Ok(Event::Key(key))) if is_quit(&key) => return Ok(true),
                Some(Err(e)) => return Err(e).context("Failed to read terminal event"),
                Some(Ok(_)) => {}
            },
            _ = redraw.tick() => {}
        }
    }
}
