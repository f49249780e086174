//! 确认对话框

use tracing::debug;

use super::{Activation, Callback};
use crate::error::Result;
use crate::ui::actions::Button;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;

/// 对话框中 "Yes" 所在的行
const YES_LINE: usize = 1;
/// 对话框中 "No" 所在的行
const NO_LINE: usize = 2;
const QUESTION: &str = "Are you sure?";

/// 二选一确认框，默认选中 "No"
pub struct ConfirmPrompt {
    title: String,
    on_confirm: Option<Callback>,
}

impl ConfirmPrompt {
    pub fn new(title: impl Into<String>, on_confirm: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        Self {
            title: title.into(),
            on_confirm: Some(Box::new(on_confirm)),
        }
    }

    /// 没有绑定动作的确认框，选择 "Yes" 也不会执行任何操作
    pub fn unbound(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            on_confirm: None,
        }
    }

    pub fn label(&self) -> String {
        self.title.clone()
    }

    pub fn activate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<Activation> {
        let lines = [QUESTION.to_string(), "  Yes".to_string(), "  No".to_string()];
        let mut choice = NO_LINE;

        loop {
            console.draw(&lines, Some(choice))?;
            console.settle();

            match console.next_edge(&Button::PROMPT)? {
                Button::Up | Button::Down => {
                    // 只有两个选项，上下都是切换
                    choice = if choice == YES_LINE { NO_LINE } else { YES_LINE };
                }
                b if b.activates() => {
                    if choice == YES_LINE {
                        debug!(title = %self.title, "确认执行");
                        if let Some(action) = &mut self.on_confirm {
                            action()?;
                        }
                    }
                    return Ok(Activation::Close);
                }
                _ => return Ok(Activation::Close),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pressing;
    use std::cell::Cell;
    use std::rc::Rc;

    fn prompt() -> (ConfirmPrompt, Rc<Cell<u32>>) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let prompt = ConfirmPrompt::new("  Reboot", move || {
            c.set(c.get() + 1);
            Ok(())
        });
        (prompt, count)
    }

    #[test]
    fn test_defaults_to_no() {
        let (mut prompt, count) = prompt();
        let mut console = pressing(&[Button::Right]);
        assert_eq!(prompt.activate(&mut console).unwrap(), Activation::Close);
        assert_eq!(count.get(), 0);

        let first = &console.renderer().frames[0];
        assert_eq!(first.lines, vec!["Are you sure?", "  Yes", "  No"]);
        assert_eq!(first.selected, Some(NO_LINE));
    }

    #[test]
    fn test_yes_runs_action() {
        let (mut prompt, count) = prompt();
        let mut console = pressing(&[Button::Up, Button::Select]);
        prompt.activate(&mut console).unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(console.renderer().frames[1].selected, Some(YES_LINE));
    }

    #[test]
    fn test_selection_wraps_between_two_options() {
        let (mut prompt, count) = prompt();
        let mut console = pressing(&[Button::Down, Button::Down, Button::Down, Button::Right]);
        prompt.activate(&mut console).unwrap();
        // No -> Yes -> No -> Yes
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_back_cancels() {
        let (mut prompt, count) = prompt();
        let mut console = pressing(&[Button::Up, Button::Left]);
        assert_eq!(prompt.activate(&mut console).unwrap(), Activation::Close);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_unbound_prompt_is_harmless() {
        let mut prompt = ConfirmPrompt::unbound("  Disable WiFi");
        let mut console = pressing(&[Button::Up, Button::Right]);
        assert_eq!(prompt.activate(&mut console).unwrap(), Activation::Close);
    }
}
