//! 统一错误类型
//!
//! 回调（动作、更新函数、进度生产者）的失败原样向上传播，导航循环不会吞掉它们。

use std::io;

use thiserror::Error;

/// 全局错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// 元素回调返回了错误
    #[error("回调执行失败: {0}")]
    Callback(#[from] anyhow::Error),

    /// 输入源已关闭（用户退出或脚本耗尽）
    #[error("输入源已关闭")]
    InputClosed,

    /// 终端、显示或文件 I/O 失败
    #[error(transparent)]
    Io(#[from] io::Error),

    /// 设置文件解析失败
    #[error("设置文件格式错误: {0}")]
    SettingsFormat(#[from] toml::de::Error),

    /// 设置序列化失败
    #[error("设置序列化失败: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    /// 播放器所有者线程已退出
    #[error("播放器线程不可用")]
    PlayerGone,
}

pub type Result<T> = std::result::Result<T, Error>;
