//! 视图层模块
//!
//! `Renderer` 是引擎唯一的绘制接口：每次调用都整帧替换屏幕内容。
//! 终端实现用 ratatui 模拟 7 行的 OLED 屏。

pub mod components;

use std::cell::Cell;
use std::io;
use std::rc::Rc;

use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};

use crate::config::{DISPLAY_LINES, SLIDER_MAX};
use crate::error::Result;
use components::compose;

/// 绘制能力
pub trait Renderer {
    /// 绘制一帧：文本行、可选的选中行、可选的角标 `(列偏移, 文本)`
    fn draw(&mut self, lines: &[String], selected: Option<usize>, corner: Option<(u16, &str)>) -> Result<()>;

    /// 设置屏幕亮度 (0–100)
    fn set_brightness(&mut self, _percent: u8) -> Result<()> {
        Ok(())
    }
}

impl<T: Renderer + ?Sized> Renderer for &mut T {
    fn draw(&mut self, lines: &[String], selected: Option<usize>, corner: Option<(u16, &str)>) -> Result<()> {
        (**self).draw(lines, selected, corner)
    }

    fn set_brightness(&mut self, percent: u8) -> Result<()> {
        (**self).set_brightness(percent)
    }
}

/// 屏幕开关，由根菜单的辅助键和渲染器共享
#[derive(Debug, Clone)]
pub struct ScreenSwitch(Rc<Cell<bool>>);

impl ScreenSwitch {
    pub fn new() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn is_on(&self) -> bool {
        self.0.get()
    }

    pub fn toggle(&self) -> bool {
        let on = !self.0.get();
        self.0.set(on);
        on
    }
}

impl Default for ScreenSwitch {
    fn default() -> Self {
        Self::new()
    }
}

/// 面板宽度（21 个字符加边框）
const PANEL_WIDTH: u16 = 23;

/// 终端模拟屏
pub struct TerminalScreen {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    brightness: u8,
    screen: ScreenSwitch,
}

impl TerminalScreen {
    pub fn new(terminal: Terminal<CrosstermBackend<io::Stdout>>, brightness: u8, screen: ScreenSwitch) -> Self {
        Self {
            terminal,
            brightness,
            screen,
        }
    }

    /// 交还终端（退出时恢复终端状态用）
    pub fn into_terminal(self) -> Terminal<CrosstermBackend<io::Stdout>> {
        self.terminal
    }
}

impl Renderer for TerminalScreen {
    fn draw(&mut self, lines: &[String], selected: Option<usize>, corner: Option<(u16, &str)>) -> Result<()> {
        let rows = if self.screen.is_on() {
            compose(lines, selected, corner)
        } else {
            Vec::new()
        };
        let brightness = self.brightness;
        self.terminal.draw(|f| render(f, &rows, brightness))?;
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<()> {
        self.brightness = percent.min(SLIDER_MAX);
        Ok(())
    }
}

/// 亮度映射为灰度
fn intensity(brightness: u8) -> Color {
    let level = 55 + (200 * brightness.min(SLIDER_MAX) as u16 / SLIDER_MAX as u16) as u8;
    Color::Rgb(level, level, level)
}

/// 渲染 UI
pub fn render(frame: &mut Frame, rows: &[String], brightness: u8) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(DISPLAY_LINES as u16 + 2), // 屏幕
            Constraint::Length(3),                        // 帮助
            Constraint::Min(0),
        ])
        .split(frame.area());

    let screen_area = Rect {
        width: chunks[0].width.min(PANEL_WIDTH),
        ..chunks[0]
    };
    render_panel(frame, rows, brightness, screen_area);
    render_help(frame, chunks[1]);
}

fn render_panel(frame: &mut Frame, rows: &[String], brightness: u8, area: Rect) {
    let lines: Vec<Line> = rows
        .iter()
        .take(DISPLAY_LINES)
        .map(|row| Line::from(row.as_str()))
        .collect();

    let panel = Paragraph::new(lines)
        .style(Style::default().fg(intensity(brightness)).bg(Color::Black))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(panel, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "[↑↓] 选择  [→/Enter] 进入  [←/Esc] 返回  [1/2/3] 辅助键  [m/p/P] 媒体键  [q] 退出",
    )
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::DIM))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, area);
}
