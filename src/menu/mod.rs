//! 菜单元素
//!
//! 所有可显示、可激活的条目都是 `Element` 的一个变体。菜单本身也是元素，
//! 因此可以任意嵌套；激活子菜单时父菜单的循环被阻塞，直到子菜单返回。

pub mod elements;
pub mod feed;
pub mod navigator;
pub mod prompt;
pub mod selection;
pub mod slider;

pub use elements::{ActionButton, Label, StaticText, ToggleSwitch};
pub use feed::{FeedUpdate, Producer, ProgressiveFeed};
pub use navigator::Menu;
pub use prompt::ConfirmPrompt;
pub use selection::{SelectionBounds, SortMode};
pub use slider::ValueSlider;

use crate::error::Result;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;

/// 无参回调
pub type Callback = Box<dyn FnMut() -> anyhow::Result<()>>;

/// 重新生成子元素列表的回调
pub type Updater = Box<dyn FnMut() -> anyhow::Result<Vec<Element>>>;

/// 激活结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// 不可交互的条目，什么也没发生
    Ignored,
    /// 已处理，调用方继续循环
    Consumed,
    /// 内部循环已退出，请求所在子菜单关闭
    Close,
}

impl Activation {
    /// 元素是否完成了一次激活（会触发子菜单的自动关闭）
    pub fn finished(self) -> bool {
        !matches!(self, Activation::Ignored)
    }
}

/// 菜单元素
pub enum Element {
    Text(StaticText),
    Button(ActionButton),
    Toggle(ToggleSwitch),
    Slider(ValueSlider),
    Prompt(ConfirmPrompt),
    Feed(ProgressiveFeed),
    Menu(Menu),
}

impl Element {
    /// 菜单中显示的文本
    pub fn label(&self) -> String {
        match self {
            Element::Text(e) => e.label(),
            Element::Button(e) => e.label(),
            Element::Toggle(e) => e.label(),
            Element::Slider(e) => e.label(),
            Element::Prompt(e) => e.label(),
            Element::Feed(e) => e.label(),
            Element::Menu(e) => e.label(),
        }
    }

    pub fn activate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<Activation> {
        match self {
            Element::Text(e) => Ok(e.activate()),
            Element::Button(e) => e.activate(),
            Element::Toggle(e) => e.activate(),
            Element::Slider(e) => e.activate(console),
            Element::Prompt(e) => e.activate(console),
            Element::Feed(e) => e.activate(console),
            Element::Menu(e) => e.activate(console),
        }
    }
}

macro_rules! impl_from_variant {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Element {
                fn from(e: $ty) -> Self {
                    Element::$variant(e)
                }
            }
        )*
    };
}

impl_from_variant! {
    Text => StaticText,
    Button => ActionButton,
    Toggle => ToggleSwitch,
    Slider => ValueSlider,
    Prompt => ConfirmPrompt,
    Feed => ProgressiveFeed,
    Menu => Menu,
}
