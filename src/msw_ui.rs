use crossterm::event::{
    self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use ratatui::Terminal;
use std::error::Error;
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use crate::msw_color::{Rgb, TermMatch};
use crate::msw_config::Config;
use crate::msw_game::{Game, InputState, MouseButtons, Triggers, BOARD_H, BOARD_W, TILE_H, TILE_W};
use crate::msw_lang::Lang;
use crate::msw_render::{draw_list, DrawList, Glyphs, TEXT_COLOR};

// Board block plus border, and the status block below it
const MIN_WIDTH: u16 = (BOARD_W as u16) * (TILE_W as u16) + 2;
const MIN_HEIGHT: u16 = (BOARD_H as u16) * (TILE_H as u16) + 2 + 3;

const KEY_FG: Rgb = Rgb(193, 156, 0);
const WIN_FG: Rgb = Rgb(22, 198, 12);
const LOSS_FG: Rgb = Rgb(231, 72, 86);
const DEBUG_FG: Rgb = Rgb(242, 242, 242);

/// Input folded from terminal events, in absolute terminal cells
#[derive(Debug, Default)]
struct HostInput {
    mouse: Option<(u16, u16)>,
    held: MouseButtons,
    pressed: Triggers,
    quit: bool,
}

impl HostInput {
    fn apply(&mut self, ev: &Event) {
        match ev {
            Event::Key(KeyEvent { code, modifiers, kind, .. }) => {
                if *kind != KeyEventKind::Press {
                    return;
                }
                match code {
                    KeyCode::F(2) => self.pressed |= Triggers::NEW_GAME,
                    KeyCode::Char('d') | KeyCode::Char('D') => self.pressed |= Triggers::TOGGLE_DEBUG,
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
                    KeyCode::Esc | KeyCode::Char('q') => self.quit = true,
                    _ => {}
                }
            }
            Event::Mouse(me) => {
                self.mouse = Some((me.column, me.row));
                match me.kind {
                    MouseEventKind::Down(MouseButton::Left) => self.held |= MouseButtons::LEFT,
                    MouseEventKind::Down(MouseButton::Right) => {
                        self.held |= MouseButtons::RIGHT;
                        self.pressed |= Triggers::RIGHT_CLICK;
                    }
                    MouseEventKind::Up(MouseButton::Left) => self.held.remove(MouseButtons::LEFT),
                    MouseEventKind::Up(MouseButton::Right) => self.held.remove(MouseButtons::RIGHT),
                    _ => {}
                }
            }
            Event::FocusLost => {
                // a release outside the window is never reported
                self.held = MouseButtons::empty();
            }
            _ => {}
        }
    }

    /// Snapshot with the cursor relative to the board's top-left cell
    fn snapshot(&self, board: Option<Rect>) -> InputState {
        let cursor = match (self.mouse, board) {
            (Some((col, row)), Some(area)) => Some((col as i32 - area.x as i32, row as i32 - area.y as i32)),
            _ => None,
        };
        InputState {
            cursor,
            held: self.held,
            pressed: self.pressed,
        }
    }

    fn end_frame(&mut self) {
        self.pressed = Triggers::empty();
    }
}

/// Updates and draws per second, measured over one-second windows
#[derive(Debug)]
struct RateMeter {
    window_start: Instant,
    updates: u32,
    draws: u32,
    tps: f64,
    fps: f64,
}

impl RateMeter {
    fn new() -> Self {
        RateMeter {
            window_start: Instant::now(),
            updates: 0,
            draws: 0,
            tps: 0.0,
            fps: 0.0,
        }
    }

    fn roll(&mut self) {
        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let secs = elapsed.as_secs_f64();
            self.tps = self.updates as f64 / secs;
            self.fps = self.draws as f64 / secs;
            self.updates = 0;
            self.draws = 0;
            self.window_start = Instant::now();
        }
    }
}

/// Composites a frame's draw list into the terminal buffer
struct BoardView<'a> {
    list: &'a DrawList,
}

fn cell_in(area: Rect, dx: i32, dy: i32) -> Option<(u16, u16)> {
    if dx < 0 || dy < 0 || dx >= area.width as i32 || dy >= area.height as i32 {
        return None;
    }
    Some((area.x + dx as u16, area.y + dy as u16))
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // closed batch first so opened tiles always paint over it
        for cmd in self.list.closed.iter().chain(self.list.opened.iter()) {
            for (i, cell) in cmd.sprite.iter().enumerate() {
                let Some((x, y)) = cell_in(area, cmd.translate.0 + i as i32, cmd.translate.1) else {
                    continue;
                };
                let (fg, bg) = match cmd.tint {
                    Some(t) => (cell.fg.tinted(t), cell.bg.tinted(t)),
                    None => (cell.fg, cell.bg),
                };
                buf.get_mut(x, y)
                    .set_symbol(cell.symbol)
                    .set_style(Style::default().fg(fg.term_match()).bg(bg.term_match()));
            }
        }
        let text_fg = TEXT_COLOR.term_match();
        for t in &self.list.texts {
            let Some((x, y)) = cell_in(area, t.at.0, t.at.1) else {
                continue;
            };
            let bg = buf.get(x, y).bg;
            buf.set_string(x, y, t.text, Style::default().fg(text_fg).bg(bg).add_modifier(Modifier::BOLD));
        }
    }
}

fn status_spans<'a>(game: &Game, lang: &Lang, meter: &RateMeter) -> Spans<'a> {
    let a = &lang.assets;
    let key_style = Style::default().fg(KEY_FG.term_match()).add_modifier(Modifier::BOLD);
    let mut spans = vec![Span::raw(Lang::fill(a.status_mines_fmt, &[&game.mines_left()]))];
    let outcome_style = |fg: Rgb| Style::default().fg(fg.term_match()).add_modifier(Modifier::BOLD);
    if game.won {
        spans.push(Span::styled(a.win_message, outcome_style(WIN_FG)));
        spans.push(Span::styled(a.new_game_hint, key_style));
    } else if game.lost {
        spans.push(Span::styled(a.loss_message, outcome_style(LOSS_FG)));
        spans.push(Span::styled(a.new_game_hint, key_style));
    } else {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(a.status_hint, key_style));
    }
    if game.show_debug {
        let tps = format!("{:0.2}", meter.tps);
        let fps = format!("{:0.2}", meter.fps);
        spans.push(Span::styled(
            Lang::fill(a.status_debug_fmt, &[&tps, &fps]),
            Style::default().fg(DEBUG_FG.term_match()),
        ));
    }
    Spans::from(spans)
}

pub fn run(cfg: &Config, lang: &Lang) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnableMouseCapture, EnableFocusChange, terminal::EnterAlternateScreen) {
        let _ = restore_terminal(&mut stdout);
        return Err(e.into());
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            let _ = restore_terminal(&mut io::stdout());
            return Err(e.into());
        }
    };

    let result = run_loop(&mut terminal, cfg, lang);

    let restored = restore_terminal(terminal.backend_mut());
    let cursor = terminal.show_cursor();
    // the loop's own error comes first
    result?;
    restored?;
    cursor?;
    Ok(())
}

/// Undo terminal setup. Every step runs even if an earlier one fails.
fn restore_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(out, DisableMouseCapture, DisableFocusChange, terminal::LeaveAlternateScreen);
    raw.and(screen)
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    cfg: &Config,
    lang: &Lang,
) -> Result<(), Box<dyn Error>> {
    let glyphs = Glyphs::new(cfg.unicode_icons);
    let mut game = Game::new();
    game.show_debug = cfg.show_debug;
    let mut input = HostInput::default();
    let mut meter = RateMeter::new();
    let mut board_rect: Option<Rect> = None;

    let tick_rate = cfg.tick();
    let mut last_tick = Instant::now();

    loop {
        let list = draw_list(&game, &glyphs);
        terminal.draw(|f| {
            let size = f.size();
            // If terminal too small, render a centered warning and skip normal UI
            if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
                let a = &lang.assets;
                let warn_lines = vec![
                    Spans::from(Span::raw(a.tsmsg_line1)),
                    Spans::from(Span::raw(Lang::fill(a.tsmsg_line2, &[&MIN_WIDTH, &MIN_HEIGHT]))),
                ];
                let warn = Paragraph::new(Text::from(warn_lines))
                    .block(Block::default().borders(Borders::ALL).title(a.tsmsg_title))
                    .alignment(Alignment::Center);
                f.render_widget(Clear, size);
                let w = 40u16.min(size.width.saturating_sub(2));
                let h = 4u16.min(size.height.saturating_sub(2));
                f.render_widget(warn, center_rect(w, h, size));
                board_rect = None;
                return;
            }

            // layout: board in the middle, status below
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .margin(0)
                .constraints([Constraint::Min(MIN_HEIGHT - 3), Constraint::Length(3)].as_ref())
                .split(size);

            let outer = center_rect(MIN_WIDTH, MIN_HEIGHT - 3, chunks[0]);
            let block = Block::default().borders(Borders::ALL).title(lang.assets.title);
            let inner = block.inner(outer);
            f.render_widget(block, outer);
            f.render_widget(BoardView { list: &list }, inner);
            board_rect = Some(inner);

            let status = Paragraph::new(Text::from(status_spans(&game, lang, &meter)))
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Left);
            f.render_widget(status, chunks[1]);
        })?;
        meter.draws += 1;

        let timeout = tick_rate.checked_sub(last_tick.elapsed()).unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            // one update per event so short clicks are never merged away
            input.apply(&event::read()?);
            step(&mut game, &mut input, board_rect, &mut meter);
            while !input.quit && event::poll(Duration::from_secs(0))? {
                input.apply(&event::read()?);
                step(&mut game, &mut input, board_rect, &mut meter);
            }
        } else {
            step(&mut game, &mut input, board_rect, &mut meter);
        }
        if input.quit {
            log::info!("Exit requested");
            break;
        }

        meter.roll();
        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn step(game: &mut Game, input: &mut HostInput, board_rect: Option<Rect>, meter: &mut RateMeter) {
    game.update(&input.snapshot(board_rect));
    input.end_frame();
    meter.updates += 1;
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
