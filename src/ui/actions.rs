//! 按键定义
//!
//! 摇杆四向 + 中键，加上三个辅助键

/// 物理按键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Up,
    Down,
    Left,   // 返回
    Right,  // 进入 / 确认
    Select, // 摇杆中键
    Aux1,
    Aux2,
    Aux3,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::Select,
        Button::Aux1,
        Button::Aux2,
        Button::Aux3,
    ];

    /// 菜单导航的优先级顺序，同时按下时靠前者生效
    pub const NAVIGATION: [Button; 8] = [
        Button::Up,
        Button::Down,
        Button::Right,
        Button::Select,
        Button::Left,
        Button::Aux1,
        Button::Aux2,
        Button::Aux3,
    ];

    /// 对话框只关心的按键
    pub const PROMPT: [Button; 5] = [
        Button::Up,
        Button::Down,
        Button::Right,
        Button::Select,
        Button::Left,
    ];

    pub(crate) fn slot(self) -> usize {
        self as usize
    }

    /// 是否为激活键
    pub fn activates(self) -> bool {
        matches!(self, Button::Right | Button::Select)
    }
}
