//! 亮度滑块
//!
//! 左右键每次按下调整 5%，立即应用到屏幕亮度。用中键打开时按住中键调整、松开退出；
//! 用右键打开时再按一次中键退出。

use tracing::{debug, info};

use super::Activation;
use crate::config::{SLIDER_MAX, SLIDER_STEP};
use crate::error::Result;
use crate::ui::actions::Button;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;
use crate::ui::view::components::slider_bar;

/// 进度条内部宽度（字符）
const BAR_WIDTH: usize = 14;

type PersistFn = Box<dyn FnMut(u8) -> anyhow::Result<()>>;

/// 0–100 的数值滑块
pub struct ValueSlider {
    title: String,
    heading: String,
    value: u8,
    saved: u8,
    on_exit: Option<PersistFn>,
}

impl ValueSlider {
    pub fn new(title: impl Into<String>, value: u8) -> Self {
        let value = value.min(SLIDER_MAX);
        Self {
            title: title.into(),
            heading: "Set the brightness".to_string(),
            value,
            saved: value,
            on_exit: None,
        }
    }

    /// 退出时数值有变化才调用的保存回调
    pub fn on_exit(mut self, persist: impl FnMut(u8) -> anyhow::Result<()> + 'static) -> Self {
        self.on_exit = Some(Box::new(persist));
        self
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn label(&self) -> String {
        self.title.clone()
    }

    fn draw<R: Renderer, I: InputSource>(&self, console: &mut Console<R, I>) -> Result<()> {
        let lines = [
            self.heading.clone(),
            String::new(),
            slider_bar(self.value, BAR_WIDTH),
            format!("{:>9}%", self.value),
        ];
        console.draw(&lines, None)
    }

    fn step(&mut self, button: Button) -> bool {
        let next = match button {
            Button::Left => self.value.saturating_sub(SLIDER_STEP),
            Button::Right => self.value.saturating_add(SLIDER_STEP).min(SLIDER_MAX),
            _ => self.value,
        };
        let changed = next != self.value;
        self.value = next;
        changed
    }

    pub fn activate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<Activation> {
        console.set_brightness(self.value)?;
        self.draw(console)?;
        // 打开滑块的那次按键决定退出方式
        let hold_mode = console.buttons().held(Button::Select);
        console.settle();

        loop {
            let edges = console.buttons().sample()?;
            if hold_mode && !console.buttons().held(Button::Select) {
                break;
            }
            if !hold_mode && edges.contains(&Button::Select) {
                break;
            }
            let pressed = [Button::Left, Button::Right]
                .into_iter()
                .find(|b| edges.contains(b));
            if let Some(button) = pressed {
                if self.step(button) {
                    info!(value = self.value, "亮度已调整");
                    console.set_brightness(self.value)?;
                }
                self.draw(console)?;
            }
            console.tick();
        }

        if self.value != self.saved {
            if let Some(persist) = &mut self.on_exit {
                persist(self.value)?;
            }
            self.saved = self.value;
        } else {
            debug!(value = self.value, "亮度未变化，不保存");
        }
        Ok(Activation::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedInput, TestConsole, scripted};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// 中键打开，按住中键的同时依次按下 `presses`，最后松开中键
    fn holding_select(presses: &[Button]) -> TestConsole {
        let mut frames = vec![vec![Button::Select]];
        for b in presses {
            frames.push(vec![Button::Select, *b]);
            frames.push(vec![Button::Select]);
        }
        frames.push(vec![]);
        opened(frames)
    }

    /// 右键打开，依次按下 `presses`，最后按中键退出
    fn opened_with_right(presses: &[Button]) -> TestConsole {
        let mut frames = vec![vec![Button::Right], vec![]];
        for b in presses {
            frames.push(vec![*b]);
            frames.push(vec![]);
        }
        frames.push(vec![Button::Select]);
        opened(frames)
    }

    /// 先采样打开滑块的那一帧，和菜单里激活时的按键状态一致
    fn opened(frames: Vec<Vec<Button>>) -> TestConsole {
        let mut console = scripted(ScriptedInput::frames(frames));
        console.buttons().sample().unwrap();
        console
    }

    fn make_slider(start: u8) -> (ValueSlider, Rc<RefCell<Vec<u8>>>) {
        let saved = Rc::new(RefCell::new(Vec::new()));
        let s = saved.clone();
        let slider = ValueSlider::new("  Brightness", start).on_exit(move |v| {
            s.borrow_mut().push(v);
            Ok(())
        });
        (slider, saved)
    }

    #[test]
    fn test_three_right_one_left() {
        let (mut slider, saved) = make_slider(50);
        let mut console = holding_select(&[
            Button::Right,
            Button::Right,
            Button::Right,
            Button::Left,
        ]);
        assert_eq!(slider.activate(&mut console).unwrap(), Activation::Close);
        assert_eq!(slider.value(), 60);
        assert_eq!(*saved.borrow(), vec![60]);
        assert_eq!(console.renderer().brightness, vec![50, 55, 60, 65, 60]);
    }

    #[test]
    fn test_clamps_at_both_ends() {
        let (mut slider, _) = make_slider(90);
        let mut console = holding_select(&[Button::Right; 5]);
        slider.activate(&mut console).unwrap();
        assert_eq!(slider.value(), 100);

        let (mut slider, _) = make_slider(10);
        let mut console = holding_select(&[Button::Left; 5]);
        slider.activate(&mut console).unwrap();
        assert_eq!(slider.value(), 0);
    }

    #[test]
    fn test_unchanged_value_is_not_persisted() {
        let (mut slider, saved) = make_slider(50);
        let mut console = holding_select(&[Button::Right, Button::Left]);
        slider.activate(&mut console).unwrap();
        assert!(saved.borrow().is_empty());
    }

    #[test]
    fn test_opened_with_right_exits_on_select() {
        let (mut slider, saved) = make_slider(40);
        let mut console = opened_with_right(&[Button::Right, Button::Right, Button::Left]);
        assert_eq!(slider.activate(&mut console).unwrap(), Activation::Close);
        assert_eq!(slider.value(), 45);
        assert_eq!(*saved.borrow(), vec![45]);
        assert_eq!(console.renderer().brightness, vec![40, 45, 50, 45]);
    }

    #[test]
    fn test_release_of_select_exits_hold_mode() {
        let (mut slider, saved) = make_slider(40);
        let mut console = holding_select(&[]);
        slider.activate(&mut console).unwrap();
        assert_eq!(slider.value(), 40);
        assert!(saved.borrow().is_empty());
    }

    #[test]
    fn test_redraws_bar_on_change() {
        let (mut slider, _) = make_slider(50);
        let mut console = holding_select(&[Button::Right]);
        slider.activate(&mut console).unwrap();
        let last = console.renderer().last().unwrap();
        assert_eq!(last.lines[0], "Set the brightness");
        assert!(last.lines[3].trim_start().starts_with("55%"));
    }
}
