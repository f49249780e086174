//! UI 模块
//!
//! - 输入 (input.rs): 按键来源，硬件引擎与终端键盘模拟
//! - 语义 (actions.rs): 八个逻辑按键
//! - 上下文 (console.rs): 渲染器 + 边沿检测 + 时序
//! - 视图 (view/): 把行文本映射到屏幕

pub mod actions;
pub mod console;
pub mod input;
pub mod view;

pub use actions::Button;
pub use console::Console;
pub use input::{ActiveLow, InputSource, KeyboardInput, PinReader};
pub use view::{Renderer, ScreenSwitch, TerminalScreen};
