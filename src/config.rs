//! 编译期常量与时序配置
//!
//! 所有时序参数、分页和滑块步长集中在这里，方便统一调整。

use std::time::Duration;

/// 每次渲染后的稳定延时，用于机械按键去抖 (ms)
pub const SETTLE_DELAY_MS: u64 = 500;

/// 等待按键时的轮询间隔 (ms)
pub const POLL_INTERVAL_MS: u64 = 10;

/// 屏幕可显示的行数
pub const DISPLAY_LINES: usize = 7;

/// 分页菜单每页的条目数
pub const PAGE_SIZE: usize = DISPLAY_LINES;

/// 滑块每次按键的步长
pub const SLIDER_STEP: u8 = 5;

/// 滑块最大值
pub const SLIDER_MAX: u8 = 100;

/// 媒体键重复事件的屏蔽窗口
pub const MEDIA_SPAM_WINDOW: Duration = Duration::from_secs(2);

/// 连按判定窗口（双击跳过、三击切换歌单）
pub const MEDIA_REPEAT_WINDOW: Duration = Duration::from_secs(4);

/// 导航循环的时序参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub settle: Duration,
    pub poll: Duration,
}

impl Timing {
    /// 无延时（测试和脚本输入使用）
    pub const fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            poll: Duration::ZERO,
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(SETTLE_DELAY_MS),
            poll: Duration::from_millis(POLL_INTERVAL_MS),
        }
    }
}

/// 进度流中状态文字的停留时间，给用户阅读
pub const FEED_MESSAGE_DELAY: Duration = Duration::from_secs(2);

/// 蓝牙配对的最大尝试次数
pub const PAIR_ATTEMPTS: usize = 3;
