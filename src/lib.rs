//! 摇杆菜单导航引擎
//!
//! 小屏幕（7 行）+ 五向摇杆 + 三个辅助键的嵌套菜单系统，以及运行在其上的音乐播放器与蓝牙管理页面。

pub mod bluetooth;
pub mod config;
pub mod error;
pub mod menu;
pub mod pages;
pub mod player;
pub mod settings;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Error, Result};
