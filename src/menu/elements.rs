//! 简单元素：文本、按钮、开关

use tracing::debug;

use super::{Activation, Callback};
use crate::error::Result;

/// 显示文本，可附带一个每次渲染时调用的补全函数
pub struct Label {
    text: String,
    filler: Option<Box<dyn Fn() -> String>>,
}

impl Label {
    pub fn fixed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            filler: None,
        }
    }

    /// 文本后接 `filler()` 的结果，例如 `Now: <当前歌曲>`
    pub fn dynamic(text: impl Into<String>, filler: impl Fn() -> String + 'static) -> Self {
        Self {
            text: text.into(),
            filler: Some(Box::new(filler)),
        }
    }

    pub fn render(&self) -> String {
        match &self.filler {
            Some(filler) => format!("{}{}", self.text, filler()),
            None => self.text.clone(),
        }
    }
}

impl From<&str> for Label {
    fn from(text: &str) -> Self {
        Label::fixed(text)
    }
}

impl From<String> for Label {
    fn from(text: String) -> Self {
        Label::fixed(text)
    }
}

/// 不可交互的一行文本
pub struct StaticText {
    label: Label,
}

impl StaticText {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> String {
        self.label.render()
    }

    pub fn activate(&self) -> Activation {
        Activation::Ignored
    }
}

/// 执行回调的按钮
pub struct ActionButton {
    label: Label,
    action: Option<Callback>,
}

impl ActionButton {
    pub fn new(label: impl Into<Label>, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        Self {
            label: label.into(),
            action: Some(Box::new(action)),
        }
    }

    /// 带一个参数的回调；参数在构造时绑定，需要多个具名参数时传一个结构体
    pub fn with_arg<T: 'static>(
        label: impl Into<Label>,
        arg: T,
        mut action: impl FnMut(&T) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            action: Some(Box::new(move || action(&arg))),
        }
    }

    /// 没有绑定动作的占位按钮
    pub fn placeholder(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            action: None,
        }
    }

    pub fn label(&self) -> String {
        self.label.render()
    }

    pub fn activate(&mut self) -> Result<Activation> {
        match &mut self.action {
            Some(action) => action()?,
            None => debug!(label = %self.label.render(), "按钮未绑定动作"),
        }
        Ok(Activation::Consumed)
    }
}

/// 布尔开关
pub struct ToggleSwitch {
    name: String,
    enabled: bool,
    /// 外部状态，设置后标签和切换都以它为准
    state: Option<Box<dyn Fn() -> bool>>,
    action: Box<dyn FnMut(bool) -> anyhow::Result<()>>,
}

impl ToggleSwitch {
    pub fn new(
        name: impl Into<String>,
        enabled: bool,
        action: impl FnMut(bool) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            enabled,
            state: None,
            action: Box::new(action),
        }
    }

    /// 跟随外部状态，别处关掉时标签同步显示
    pub fn tracking(mut self, state: impl Fn() -> bool + 'static) -> Self {
        self.state = Some(Box::new(state));
        self
    }

    pub fn enabled(&self) -> bool {
        self.state.as_ref().map_or(self.enabled, |state| state())
    }

    pub fn label(&self) -> String {
        format!("{}: {}", self.name, if self.enabled() { "On" } else { "Off" })
    }

    pub fn activate(&mut self) -> Result<Activation> {
        self.enabled = !self.enabled();
        (self.action)(self.enabled)?;
        Ok(Activation::Consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn test_dynamic_label_renders_each_time() {
        let counter = Rc::new(Cell::new(0));
        let c = counter.clone();
        let text = StaticText::new(Label::dynamic("Now: ", move || {
            c.set(c.get() + 1);
            format!("song {}", c.get())
        }));
        assert_eq!(text.label(), "Now: song 1");
        assert_eq!(text.label(), "Now: song 2");
        assert_eq!(text.activate(), Activation::Ignored);
    }

    #[test]
    fn test_button_with_arg() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut button = ActionButton::with_arg("  Rock", "Rock".to_string(), move |name| {
            s.borrow_mut().push(name.clone());
            Ok(())
        });
        assert_eq!(button.activate().unwrap(), Activation::Consumed);
        assert_eq!(*seen.borrow(), vec!["Rock".to_string()]);
    }

    #[test]
    fn test_button_failure_propagates() {
        let mut button = ActionButton::new("  Boom", || Err(anyhow::anyhow!("no player")));
        assert!(button.activate().is_err());
    }

    #[test]
    fn test_placeholder_button_is_consumed() {
        let mut button = ActionButton::placeholder("  Disable WiFi");
        assert_eq!(button.activate().unwrap(), Activation::Consumed);
    }

    #[test]
    fn test_toggle_flips_and_reports() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let mut toggle = ToggleSwitch::new("  Scan", false, move |on| {
            s.borrow_mut().push(on);
            Ok(())
        });
        toggle.activate().unwrap();
        assert_eq!(toggle.label(), "  Scan: On");
        toggle.activate().unwrap();
        assert!(!toggle.enabled());
        assert_eq!(*seen.borrow(), vec![true, false]);
    }

    #[test]
    fn test_tracking_toggle_follows_outside_state() {
        let running = Rc::new(Cell::new(false));
        let (r1, r2) = (running.clone(), running.clone());
        let mut toggle = ToggleSwitch::new("  Scan", false, move |on| {
            r1.set(on);
            Ok(())
        })
        .tracking(move || r2.get());
        toggle.activate().unwrap();
        assert_eq!(toggle.label(), "  Scan: On");

        // 别处停止了扫描
        running.set(false);
        assert_eq!(toggle.label(), "  Scan: Off");
        toggle.activate().unwrap();
        assert!(running.get());
    }
}
