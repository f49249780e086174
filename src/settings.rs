//! 用户设置持久化
//!
//! 设置保存在 `<数据目录>/stickmenu/settings.toml`，文件不存在时以默认值创建。
//! 只有数值真正变化时才写回磁盘。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// 设置文件内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// 屏幕亮度 (0-100)
    #[serde(default = "default_brightness")]
    pub brightness: u8,
    /// 息屏延时（分钟）
    #[serde(default = "default_sleep_delay")]
    pub sleep_delay: u32,
    /// 重新选择当前歌单时是否重新洗牌 (0|1)
    #[serde(default = "default_reshuffle")]
    pub reshuffle: u8,
}

fn default_brightness() -> u8 {
    50
}

fn default_sleep_delay() -> u32 {
    10
}

fn default_reshuffle() -> u8 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: default_brightness(),
            sleep_delay: default_sleep_delay(),
            reshuffle: default_reshuffle(),
        }
    }
}

/// 设置及其文件位置
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    settings: Settings,
    dirty: bool,
}

/// 获取数据目录路径 (~/.local/share/stickmenu/)
pub fn data_dir() -> io::Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "无法获取用户数据目录"))?
        .join("stickmenu");

    fs::create_dir_all(&dir)?;

    Ok(dir)
}

impl SettingsStore {
    /// 从文件加载设置，文件不存在时写入默认值
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let mut store = Self {
                path: path.to_path_buf(),
                settings: Settings::default(),
                dirty: true,
            };
            store.save()?;
            info!(path = %path.display(), "已创建默认设置文件");
            return Ok(store);
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        debug!(?settings, "已加载设置");

        Ok(Self {
            path: path.to_path_buf(),
            settings,
            dirty: false,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn brightness(&self) -> u8 {
        self.settings.brightness
    }

    pub fn reshuffle(&self) -> bool {
        self.settings.reshuffle == 1
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_brightness(&mut self, brightness: u8) {
        if self.settings.brightness != brightness {
            self.settings.brightness = brightness;
            self.dirty = true;
        }
    }

    pub fn set_reshuffle(&mut self, reshuffle: bool) {
        let value = u8::from(reshuffle);
        if self.settings.reshuffle != value {
            self.settings.reshuffle = value;
            self.dirty = true;
        }
    }

    /// 有改动时写回文件
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        let content = toml::to_string_pretty(&self.settings)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, content)?;

        self.dirty = false;
        info!(path = %self.path.display(), "设置已保存");
        Ok(())
    }
}
