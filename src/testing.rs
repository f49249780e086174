//! 测试辅助：脚本化输入源和记录型渲染器

use std::collections::VecDeque;

use crate::config::Timing;
use crate::error::{Error, Result};
use crate::ui::actions::Button;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;

/// 按帧回放的输入源，每次 `poll` 前进一帧，脚本结束后报告 `InputClosed`
pub struct ScriptedInput {
    frames: VecDeque<Vec<Button>>,
    current: Option<Vec<Button>>,
}

impl ScriptedInput {
    pub fn frames(frames: Vec<Vec<Button>>) -> Self {
        Self {
            frames: frames.into(),
            current: Some(Vec::new()),
        }
    }

    /// 每次按键之后跟一帧松开
    pub fn presses(buttons: &[Button]) -> Self {
        let frames = buttons
            .iter()
            .flat_map(|b| [vec![*b], Vec::new()])
            .collect();
        Self::frames(frames)
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self) -> Result<()> {
        self.current = self.frames.pop_front();
        Ok(())
    }

    fn is_pressed(&mut self, button: Button) -> Result<bool> {
        match &self.current {
            Some(frame) => Ok(frame.contains(&button)),
            None => Err(Error::InputClosed),
        }
    }
}

/// 一次绘制调用
#[derive(Debug, Clone, PartialEq)]
pub struct Drawn {
    pub lines: Vec<String>,
    pub selected: Option<usize>,
    pub corner: Option<(u16, String)>,
}

/// 记录所有绘制调用的渲染器
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub frames: Vec<Drawn>,
    pub brightness: Vec<u8>,
}

impl RecordingRenderer {
    /// 每一帧选中行的文本
    pub fn selections(&self) -> Vec<Option<String>> {
        self.frames
            .iter()
            .map(|d| d.selected.and_then(|i| d.lines.get(i).cloned()))
            .collect()
    }

    pub fn last(&self) -> Option<&Drawn> {
        self.frames.last()
    }
}

impl Renderer for RecordingRenderer {
    fn draw(&mut self, lines: &[String], selected: Option<usize>, corner: Option<(u16, &str)>) -> Result<()> {
        self.frames.push(Drawn {
            lines: lines.to_vec(),
            selected,
            corner: corner.map(|(offset, text)| (offset, text.to_string())),
        });
        Ok(())
    }

    fn set_brightness(&mut self, percent: u8) -> Result<()> {
        self.brightness.push(percent);
        Ok(())
    }
}

pub type TestConsole = Console<RecordingRenderer, ScriptedInput>;

/// 无延时的测试上下文
pub fn scripted(input: ScriptedInput) -> TestConsole {
    Console::new(RecordingRenderer::default(), input, Timing::instant())
}

/// 按键序列的测试上下文
pub fn pressing(buttons: &[Button]) -> TestConsole {
    scripted(ScriptedInput::presses(buttons))
}
