//! 播放器
//!
//! 歌单、播放队列、暂停状态和当前连接的设备只由一个所有者线程持有。
//! 菜单回调、媒体键监听和蓝牙进度流都通过 `PlayerHandle` 发送命令，查询时带一个回复通道。

use std::collections::hash_map::RandomState;
use std::fs;
use std::hash::BuildHasher;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::bluetooth::Device;
use crate::config::{MEDIA_REPEAT_WINDOW, MEDIA_SPAM_WINDOW};
use crate::error::{Error, Result};
use crate::ui::input::{MEDIA_NEXT, MEDIA_PAUSE, MEDIA_PLAY};

/// 去掉扩展名后的歌曲名
pub fn song_name(track: &str) -> String {
    Path::new(track)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| track.to_string())
}

fn shuffle(tracks: &mut [String]) {
    let state = RandomState::new();
    tracks.sort_by_cached_key(|t| state.hash_one(t));
}

// ============ 歌单 ============

/// 一个歌单：音乐目录下的一个子目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    pub name: String,
    /// 待播放队列，队首为当前曲目
    pub tracks: Vec<String>,
    source: Vec<String>,
    dir: Option<PathBuf>,
}

impl Playlist {
    /// 固定曲目的歌单，不洗牌
    pub fn new(name: impl Into<String>, tracks: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tracks: tracks.clone(),
            source: tracks,
            dir: None,
        }
    }

    /// 读取目录中的文件名并洗牌
    pub fn load(dir: &Path) -> io::Result<Self> {
        let name = dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut playlist = Self {
            name,
            tracks: Vec::new(),
            source: Vec::new(),
            dir: Some(dir.to_path_buf()),
        };
        playlist.reload()?;
        Ok(playlist)
    }

    /// 重新装满队列；从目录加载的歌单会重新读目录并洗牌
    pub fn reload(&mut self) -> io::Result<()> {
        if let Some(dir) = &self.dir {
            let mut tracks = Vec::new();
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    tracks.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
            shuffle(&mut tracks);
            self.source = tracks;
        }
        self.tracks = self.source.clone();
        info!(playlist = %self.name, tracks = self.tracks.len(), "歌单已加载");
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.source.len()
    }
}

/// 所有歌单
#[derive(Debug, Clone, Default)]
pub struct Library {
    playlists: Vec<Playlist>,
}

impl Library {
    pub fn new(playlists: Vec<Playlist>) -> Self {
        Self { playlists }
    }

    /// 音乐目录的每个子目录是一个歌单，按名称排序
    pub fn scan(root: &Path) -> io::Result<Self> {
        let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        dirs.sort();

        let playlists = dirs
            .iter()
            .map(|d| Playlist::load(d))
            .collect::<io::Result<Vec<_>>>()?;
        info!(root = %root.display(), count = playlists.len(), "音乐库扫描完成");
        Ok(Self { playlists })
    }

    pub fn playlists(&self) -> &[Playlist] {
        &self.playlists
    }
}

// ============ 命令与快照 ============

/// 发给播放器线程的命令
#[derive(Debug)]
pub enum Command {
    Play,
    /// 没有连接设备时忽略；未在播放时开始播放
    TogglePause,
    Skip,
    /// 切换到下一个歌单
    SwitchPlaylist,
    /// 按名称选择歌单；选中当前歌单时按设置重新洗牌
    SelectPlaylist(String),
    /// 把队列中的歌曲移到下一首
    PlayNext(usize),
    /// 把队列中的歌曲移到末尾
    PlayLast(usize),
    /// 从队列移除（队首受保护）
    Remove(usize),
    SetReshuffle(bool),
    Connect(Device),
    Disconnect,
    Snapshot(Sender<Snapshot>),
}

/// 播放器状态的只读副本
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub now: Option<String>,
    pub playlist: Option<String>,
    pub playlists: Vec<String>,
    /// 队列中的歌曲名（无扩展名）
    pub queue: Vec<String>,
    pub playing: bool,
    pub paused: bool,
    pub device: Option<Device>,
}

impl Snapshot {
    /// 播放/暂停按钮上显示的文字
    pub fn play_status(&self) -> &'static str {
        if self.playing && !self.paused && self.now.is_some() {
            "Pause"
        } else {
            "Play"
        }
    }
}

// ============ 所有者线程 ============

/// 播放器状态，只在所有者线程中访问
#[derive(Debug)]
pub struct PlayerState {
    library: Library,
    index: usize,
    playing: bool,
    paused: bool,
    now: Option<String>,
    device: Option<Device>,
    reshuffle: bool,
}

impl PlayerState {
    pub fn new(library: Library, reshuffle: bool) -> Self {
        Self {
            library,
            index: 0,
            playing: false,
            paused: false,
            now: None,
            device: None,
            reshuffle,
        }
    }

    fn current(&self) -> Option<&Playlist> {
        self.library.playlists.get(self.index)
    }

    fn queue_mut(&mut self) -> Option<&mut Vec<String>> {
        self.library.playlists.get_mut(self.index).map(|p| &mut p.tracks)
    }

    fn start_head(&mut self) {
        self.now = self
            .current()
            .and_then(|p| p.tracks.first())
            .map(|t| song_name(t));
        self.playing = self.now.is_some();
        self.paused = false;
        if let (Some(now), Some(playlist)) = (&self.now, self.current()) {
            let position = playlist.total() - playlist.tracks.len() + 1;
            info!(song = %now, playlist = %playlist.name, position, total = playlist.total(), "正在播放");
        }
    }

    pub fn apply(&mut self, command: Command) -> io::Result<()> {
        debug!(?command, "播放器命令");
        match command {
            Command::Play => {
                if !self.playing {
                    self.start_head();
                }
            }
            Command::TogglePause => {
                if self.device.is_none() {
                    debug!("没有连接设备，忽略播放/暂停");
                } else if self.playing {
                    self.paused = !self.paused;
                } else {
                    self.start_head();
                }
            }
            Command::Skip => self.skip()?,
            Command::SwitchPlaylist => {
                let count = self.library.playlists.len();
                if count > 1 {
                    self.index = (self.index + 1) % count;
                    info!(playlist = ?self.current().map(|p| &p.name), "切换歌单");
                    if self.playing {
                        self.start_head();
                    }
                }
            }
            Command::SelectPlaylist(name) => self.select(&name)?,
            Command::PlayNext(i) => {
                let head = usize::from(self.playing);
                if let Some(queue) = self.queue_mut()
                    && i != 0
                    && i < queue.len()
                {
                    let track = queue.remove(i);
                    queue.insert(head.min(queue.len()), track);
                }
            }
            Command::PlayLast(i) => {
                let protected = self.playing && i == 0;
                if let Some(queue) = self.queue_mut()
                    && !protected
                    && i < queue.len()
                {
                    let track = queue.remove(i);
                    queue.push(track);
                }
            }
            Command::Remove(i) => {
                if let Some(queue) = self.queue_mut()
                    && i != 0
                    && i < queue.len()
                {
                    queue.remove(i);
                }
            }
            Command::SetReshuffle(reshuffle) => self.reshuffle = reshuffle,
            Command::Connect(device) => {
                info!(device = %device.name, mac = %device.mac, "设备已连接");
                self.device = Some(device);
            }
            Command::Disconnect => {
                if self.playing {
                    self.paused = true;
                }
                self.device = None;
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
        Ok(())
    }

    fn skip(&mut self) -> io::Result<()> {
        if !self.playing {
            debug!("没有正在播放的歌曲");
            return Ok(());
        }
        if let Some(queue) = self.queue_mut()
            && !queue.is_empty()
        {
            let ended = queue.remove(0);
            debug!(track = %ended, "跳过");
        }
        if let Some(playlist) = self.library.playlists.get_mut(self.index)
            && playlist.tracks.is_empty()
        {
            info!(playlist = %playlist.name, "歌单播放完毕");
            playlist.reload()?;
        }
        self.start_head();
        Ok(())
    }

    fn select(&mut self, name: &str) -> io::Result<()> {
        let Some(index) = self.library.playlists.iter().position(|p| p.name == name) else {
            warn!(playlist = %name, "歌单不存在");
            return Ok(());
        };
        if index == self.index {
            if self.reshuffle {
                self.library.playlists[index].reload()?;
                info!(playlist = %name, "重新洗牌");
            }
        } else {
            self.index = index;
            info!(playlist = %name, "选择歌单");
        }
        if self.playing {
            self.start_head();
        }
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            now: self.now.clone(),
            playlist: self.current().map(|p| p.name.clone()),
            playlists: self.library.playlists.iter().map(|p| p.name.clone()).collect(),
            queue: self
                .current()
                .map(|p| p.tracks.iter().map(|t| song_name(t)).collect())
                .unwrap_or_default(),
            playing: self.playing,
            paused: self.paused,
            device: self.device.clone(),
        }
    }
}

/// 播放器线程的发送端，可自由克隆
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    tx: Sender<Command>,
}

impl PlayerHandle {
    /// 启动所有者线程；所有句柄被丢弃后线程退出
    pub fn spawn(state: PlayerState) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel::<Command>();
        let join = thread::spawn(move || {
            let mut state = state;
            for command in rx {
                if let Err(e) = state.apply(command) {
                    warn!("播放器命令失败: {}", e);
                }
            }
            info!("播放器线程退出");
        });
        (Self { tx }, join)
    }

    pub fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).map_err(|_| Error::PlayerGone)
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        let (reply, rx) = mpsc::channel();
        self.send(Command::Snapshot(reply))?;
        rx.recv().map_err(|_| Error::PlayerGone)
    }
}

// ============ 媒体键 ============

/// 把蓝牙音箱的媒体键码翻译成播放器命令
#[derive(Debug, Default)]
pub struct MediaKeys {
    /// 音箱模式：单键 = 暂停，双击 = 下一首，三击 = 切换歌单
    speaker_mode: bool,
    last_accepted: Option<Instant>,
    skip_at: Option<Instant>,
    switch_at: Option<Instant>,
}

fn within(mark: Option<Instant>, now: Instant, window: std::time::Duration) -> bool {
    mark.is_some_and(|t| now.saturating_duration_since(t) <= window)
}

impl MediaKeys {
    pub fn new(speaker_mode: bool) -> Self {
        Self {
            speaker_mode,
            ..Self::default()
        }
    }

    pub fn decode(&mut self, code: u16, now: Instant) -> Option<Command> {
        // 音箱会重复上报同一次按键
        if within(self.last_accepted, now, MEDIA_SPAM_WINDOW) {
            return None;
        }
        self.last_accepted = Some(now);

        match code {
            MEDIA_NEXT if self.speaker_mode => {
                if within(self.switch_at, now, MEDIA_REPEAT_WINDOW) {
                    self.skip_at = None;
                    self.switch_at = None;
                    Some(Command::SwitchPlaylist)
                } else if within(self.skip_at, now, MEDIA_REPEAT_WINDOW) {
                    self.skip_at = None;
                    self.switch_at = Some(now);
                    Some(Command::Skip)
                } else {
                    self.skip_at = Some(now);
                    Some(Command::TogglePause)
                }
            }
            MEDIA_NEXT => Some(Command::Skip),
            MEDIA_PLAY => Some(Command::Play),
            MEDIA_PAUSE => Some(Command::TogglePause),
            other => {
                warn!(code = other, "未知的媒体键码");
                None
            }
        }
    }
}

/// 在独立线程中消费媒体键码，通道关闭或播放器退出时结束
pub fn spawn_listener(codes: Receiver<u16>, player: PlayerHandle, speaker_mode: bool) -> JoinHandle<()> {
    thread::spawn(move || {
        info!(speaker_mode, "媒体键监听已启动");
        let mut keys = MediaKeys::new(speaker_mode);
        for code in codes {
            if let Some(command) = keys.decode(code, Instant::now())
                && player.send(command).is_err()
            {
                break;
            }
        }
        info!("媒体键监听已停止");
    })
}
