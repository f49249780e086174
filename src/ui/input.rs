//! 输入源 (Input -> Button)
//!
//! 引擎只通过 `InputSource` 读取按键状态。硬件按键是上拉输入，按下时引脚为低电平，
//! 极性转换在 `ActiveLow` 这一层完成；终端模拟器把键盘事件映射为按键。

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use super::actions::Button;
use crate::error::{Error, Result};

/// 按键状态来源
pub trait InputSource {
    /// 锁存一份新的按键快照，每个采样周期调用一次
    fn poll(&mut self) -> Result<()> {
        Ok(())
    }

    /// 按键当前是否被按住
    fn is_pressed(&mut self, button: Button) -> Result<bool>;
}

impl<T: InputSource + ?Sized> InputSource for &mut T {
    fn poll(&mut self) -> Result<()> {
        (**self).poll()
    }

    fn is_pressed(&mut self, button: Button) -> Result<bool> {
        (**self).is_pressed(button)
    }
}

impl<T: InputSource + ?Sized> InputSource for Box<T> {
    fn poll(&mut self) -> Result<()> {
        (**self).poll()
    }

    fn is_pressed(&mut self, button: Button) -> Result<bool> {
        (**self).is_pressed(button)
    }
}

/// 原始引脚电平读取，`true` 表示高电平
pub trait PinReader {
    fn read_level(&mut self, button: Button) -> Result<bool>;
}

/// 低电平有效的按键：引脚读到低电平即视为按下
pub struct ActiveLow<P>(pub P);

impl<P: PinReader> InputSource for ActiveLow<P> {
    fn is_pressed(&mut self, button: Button) -> Result<bool> {
        Ok(!self.0.read_level(button)?)
    }
}

// ============ 终端键盘模拟 ============

/// 普通按键按下后视为"按住"的时长
const TAP_HOLD: Duration = Duration::from_millis(150);

/// 中键的按住时长，覆盖键盘自动重复的首次延迟
const SELECT_HOLD: Duration = Duration::from_millis(600);

/// 媒体键编码（与蓝牙音箱上报的一致）
pub const MEDIA_NEXT: u16 = 163;
pub const MEDIA_PLAY: u16 = 200;
pub const MEDIA_PAUSE: u16 = 201;

/// 键盘按键到物理按键的映射
pub fn button_for_key(key: KeyCode) -> Option<Button> {
    match key {
        KeyCode::Up | KeyCode::Char('k') => Some(Button::Up),
        KeyCode::Down | KeyCode::Char('j') => Some(Button::Down),
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Esc | KeyCode::Backspace => {
            Some(Button::Left)
        }
        KeyCode::Right | KeyCode::Char('l') => Some(Button::Right),
        KeyCode::Enter | KeyCode::Char(' ') => Some(Button::Select),
        KeyCode::Char('1') => Some(Button::Aux1),
        KeyCode::Char('2') => Some(Button::Aux2),
        KeyCode::Char('3') => Some(Button::Aux3),
        _ => None,
    }
}

/// 键盘上模拟的媒体键
pub fn media_code_for_key(key: KeyCode) -> Option<u16> {
    match key {
        KeyCode::Char('m') => Some(MEDIA_NEXT),
        KeyCode::Char('p') => Some(MEDIA_PLAY),
        KeyCode::Char('P') => Some(MEDIA_PAUSE),
        _ => None,
    }
}

/// 基于 crossterm 事件的输入源
///
/// 终端一般不报告按键释放，所以每次按下（或自动重复）都会把按键标记为
/// 按住一小段时间；支持释放事件的终端会立即清除。
pub struct KeyboardInput {
    held_until: [Option<Instant>; 8],
    media: Option<Sender<u16>>,
    closed: bool,
}

impl KeyboardInput {
    pub fn new() -> Self {
        Self {
            held_until: [None; 8],
            media: None,
            closed: false,
        }
    }

    /// 把媒体键转发给监听线程
    pub fn with_media_keys(mut self, tx: Sender<u16>) -> Self {
        self.media = Some(tx);
        self
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let quit = key.code == KeyCode::Char('q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if quit && key.kind == KeyEventKind::Press {
            info!("收到退出按键");
            self.closed = true;
            return;
        }

        if let Some(button) = button_for_key(key.code) {
            let slot = &mut self.held_until[button.slot()];
            match key.kind {
                KeyEventKind::Press | KeyEventKind::Repeat => {
                    let hold = if button == Button::Select {
                        SELECT_HOLD
                    } else {
                        TAP_HOLD
                    };
                    *slot = Some(now + hold);
                }
                KeyEventKind::Release => *slot = None,
            }
            return;
        }

        if key.kind != KeyEventKind::Press {
            return;
        }
        if let (Some(code), Some(tx)) = (media_code_for_key(key.code), &self.media) {
            if tx.send(code).is_err() {
                debug!(code, "媒体键监听线程已退出");
            }
        }
    }
}

impl Default for KeyboardInput {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for KeyboardInput {
    fn poll(&mut self) -> Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key, Instant::now());
            }
        }
        Ok(())
    }

    fn is_pressed(&mut self, button: Button) -> Result<bool> {
        if self.closed {
            return Err(Error::InputClosed);
        }
        Ok(self.held_until[button.slot()].is_some_and(|until| Instant::now() < until))
    }
}
