//! 导航上下文
//!
//! `Console` 把渲染器、按键边沿检测和时序参数捆在一起，由根菜单一路向下借给
//! 所有子菜单、对话框和滑块。嵌套循环共享同一个边沿检测器，返回上层时按键状态不会错乱。

use std::thread;

use super::actions::Button;
use super::input::InputSource;
use super::view::Renderer;
use crate::config::Timing;
use crate::error::Result;

/// 按键边沿检测器
///
/// 每个采样周期读取全部按键一次，从"松开"变为"按下"的按键记为一个边沿。
pub struct Buttons<I> {
    source: I,
    held: [bool; 8],
}

impl<I: InputSource> Buttons<I> {
    pub fn new(source: I) -> Self {
        Self {
            source,
            held: [false; 8],
        }
    }

    /// 采样一次，返回本周期的按下沿
    pub fn sample(&mut self) -> Result<Vec<Button>> {
        self.source.poll()?;
        let mut edges = Vec::new();
        for button in Button::ALL {
            let pressed = self.source.is_pressed(button)?;
            let slot = &mut self.held[button.slot()];
            if pressed && !*slot {
                edges.push(button);
            }
            *slot = pressed;
        }
        Ok(edges)
    }

    /// 最近一次采样时按键是否按住
    pub fn held(&self, button: Button) -> bool {
        self.held[button.slot()]
    }

    /// 采样一次，按 `wanted` 的顺序返回第一个出现按下沿的按键
    pub fn poll_edge(&mut self, wanted: &[Button]) -> Result<Option<Button>> {
        let edges = self.sample()?;
        Ok(wanted.iter().copied().find(|b| edges.contains(b)))
    }
}

/// 导航上下文
pub struct Console<R, I> {
    renderer: R,
    buttons: Buttons<I>,
    timing: Timing,
}

impl<R: Renderer, I: InputSource> Console<R, I> {
    pub fn new(renderer: R, input: I, timing: Timing) -> Self {
        Self {
            renderer,
            buttons: Buttons::new(input),
            timing,
        }
    }

    pub fn draw(&mut self, lines: &[String], selected: Option<usize>) -> Result<()> {
        self.renderer.draw(lines, selected, None)
    }

    pub fn draw_with_corner(&mut self, lines: &[String], selected: Option<usize>, corner: (u16, &str)) -> Result<()> {
        self.renderer.draw(lines, selected, Some(corner))
    }

    pub fn set_brightness(&mut self, percent: u8) -> Result<()> {
        self.renderer.set_brightness(percent)
    }

    /// 渲染后的去抖延时
    pub fn settle(&self) {
        if !self.timing.settle.is_zero() {
            thread::sleep(self.timing.settle);
        }
    }

    /// 等待一个采样周期
    pub fn tick(&self) {
        if !self.timing.poll.is_zero() {
            thread::sleep(self.timing.poll);
        }
    }

    /// 阻塞直到 `wanted` 中某个按键出现按下沿
    pub fn next_edge(&mut self, wanted: &[Button]) -> Result<Button> {
        loop {
            if let Some(button) = self.buttons.poll_edge(wanted)? {
                return Ok(button);
            }
            self.tick();
        }
    }

    pub fn buttons(&mut self) -> &mut Buttons<I> {
        &mut self.buttons
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 拆出渲染器和输入源
    pub fn into_parts(self) -> (R, I) {
        (self.renderer, self.buttons.source)
    }
}
