use std::cell::RefCell;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex, mpsc};

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stickmenu::bluetooth::{Bluetooth, SystemRunner};
use stickmenu::config::Timing;
use stickmenu::error::{Error, Result};
use stickmenu::pages::{self, Host};
use stickmenu::player::{self, Library, PlayerHandle, PlayerState};
use stickmenu::settings::{self, SettingsStore};
use stickmenu::ui::{Console, KeyboardInput, ScreenSwitch, TerminalScreen};

/// 日志写入数据目录下的文件，终端被菜单占用
fn init_logging(data_dir: &std::path::Path) -> io::Result<()> {
    let file = File::create(data_dir.join("stickmenu.log"))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// 音乐目录：第一个非选项参数，默认 ~/Music/playlists
fn music_dir() -> PathBuf {
    std::env::args()
        .skip(1)
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .or_else(|| dirs::audio_dir().map(|d| d.join("playlists")))
        .unwrap_or_else(|| PathBuf::from("playlists"))
}

fn main() -> Result<()> {
    let data_dir = settings::data_dir()?;
    init_logging(&data_dir)?;

    // 加载设置
    let settings_path = data_dir.join("settings.toml");
    let settings = Rc::new(RefCell::new(SettingsStore::load(&settings_path)?));

    // 音乐库与播放器线程
    let dir = music_dir();
    let library = Library::scan(&dir).unwrap_or_else(|e| {
        error!(dir = %dir.display(), "无法读取音乐目录: {}", e);
        Library::default()
    });
    let (player, player_thread) = PlayerHandle::spawn(PlayerState::new(library, settings.borrow().reshuffle()));

    // 媒体键监听
    let speaker_mode = std::env::args().any(|a| a == "--speaker");
    let (media_tx, media_rx) = mpsc::channel();
    let listener = player::spawn_listener(media_rx, player.clone(), speaker_mode);

    let screen = ScreenSwitch::new();
    let bluetooth = Bluetooth::new(Arc::new(SystemRunner::default()), player.clone());
    let host = Host {
        bluetooth: bluetooth.clone(),
        player,
        settings: settings.clone(),
        screen: screen.clone(),
        media_keys: true,
    };
    let mut root = pages::root(&host);
    drop(host);

    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;

    let renderer = TerminalScreen::new(terminal, settings.borrow().brightness(), screen);
    let input = KeyboardInput::new().with_media_keys(media_tx);
    let mut console = Console::new(renderer, input, Timing::default());

    // 主循环，用户退出时输入源关闭
    info!("进入根菜单");
    let result = match root.activate(&mut console) {
        Ok(_) | Err(Error::InputClosed) => Ok(()),
        Err(e) => Err(e),
    };

    // 恢复终端
    let (renderer, input) = console.into_parts();
    let mut terminal = renderer.into_terminal();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // 结束扫描进程，关闭通道，等待后台线程退出
    bluetooth.shutdown();
    drop(bluetooth);
    drop(input);
    drop(root);
    if listener.join().is_err() {
        error!("媒体键监听线程异常退出");
    }
    if player_thread.join().is_err() {
        error!("播放器线程异常退出");
    }

    // 保存设置
    settings.borrow_mut().save()?;
    println!("设置已保存到 {}", settings_path.display());

    if let Err(e) = &result {
        error!("退出: {}", e);
    }
    result
}
