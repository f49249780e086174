//! 页面树
//!
//! 根菜单下挂四个页面：音乐、蓝牙、系统、设置。所有动态文本和回调都通过句柄访问
//! 播放器线程、蓝牙控制器和设置存储。

use std::cell::RefCell;
use std::process::Command as Process;
use std::rc::Rc;

use anyhow::{Context, bail};
use chrono::Local;
use tracing::info;

use crate::bluetooth::Bluetooth;
use crate::menu::{
    ActionButton, ConfirmPrompt, Element, Label, Menu, ProgressiveFeed, StaticText, ToggleSwitch, ValueSlider,
};
use crate::player::{Command, PlayerHandle};
use crate::settings::SettingsStore;
use crate::ui::view::ScreenSwitch;

/// 页面回调需要的所有共享资源
#[derive(Clone)]
pub struct Host {
    pub player: PlayerHandle,
    pub bluetooth: Bluetooth,
    pub settings: Rc<RefCell<SettingsStore>>,
    pub screen: ScreenSwitch,
    /// 是否接入了媒体键监听
    pub media_keys: bool,
}

/// 根菜单：辅助键 1 开关屏幕
pub fn root(host: &Host) -> Menu {
    let screen = host.screen.clone();
    Menu::new(
        "Main",
        vec![
            StaticText::new("Stick MP3 Player").into(),
            music(host).into(),
            bluetooth(host).into(),
            system().into(),
            settings(host).into(),
        ],
    )
    .bounds(1)
    .on_aux1(move || {
        let on = screen.toggle();
        info!(on, "切换屏幕");
        Ok(())
    })
}

fn send(player: &PlayerHandle, command: Command) -> anyhow::Result<()> {
    Ok(player.send(command)?)
}

/// 播放器快照中的一个字段，线程不可用时显示 "None"
fn snapshot_text(player: &PlayerHandle, field: fn(crate::player::Snapshot) -> Option<String>) -> String {
    player
        .snapshot()
        .ok()
        .and_then(field)
        .unwrap_or_else(|| "None".to_string())
}

// ============ 音乐 ============

fn music(host: &Host) -> Menu {
    let (p1, p2, p3, p4) = (
        host.player.clone(),
        host.player.clone(),
        host.player.clone(),
        host.player.clone(),
    );
    let media_keys = if host.media_keys { "True" } else { "False" };

    let now = StaticText::new(Label::dynamic("Now: ", move || snapshot_text(&p1, |s| s.now)));
    let from = StaticText::new(Label::dynamic("From: ", move || snapshot_text(&p2, |s| s.playlist)));
    let play_label = {
        let player = host.player.clone();
        Label::dynamic("  ", move || {
            player
                .snapshot()
                .map(|s| s.play_status())
                .unwrap_or("Play")
                .to_string()
        })
    };

    let playlists = {
        let player = host.player.clone();
        Menu::lazy("Playlists", move || {
            let names = player.snapshot()?.playlists;
            Ok(names
                .into_iter()
                .map(|name| {
                    let player = player.clone();
                    ActionButton::with_arg(format!(" {}", name), name, move |name: &String| {
                        send(&player, Command::SelectPlaylist(name.clone()))
                    })
                    .into()
                })
                .collect())
        })
        .autoclose()
    };

    let queue = {
        let player = host.player.clone();
        Menu::lazy("Queue", move || queue_list(&player))
            .refresh_after_activation()
            .paginated()
            .sortable()
    };

    Menu::new(
        "Music",
        vec![
            now.into(),
            from.into(),
            StaticText::new(format!("Media Keys: {}", media_keys)).into(),
            ActionButton::new(play_label, move || send(&p3, Command::TogglePause)).into(),
            ActionButton::new("  Skip", move || send(&p4, Command::Skip)).into(),
            playlists.into(),
            queue.into(),
        ],
    )
    .bounds(3)
    .submenu()
}

/// 队列中的每首歌是一个子菜单
fn queue_list(player: &PlayerHandle) -> anyhow::Result<Vec<Element>> {
    let songs = player.snapshot()?.queue;
    if songs.is_empty() {
        return Ok(vec![StaticText::new("  Queue is empty!").into()]);
    }

    Ok(songs
        .into_iter()
        .enumerate()
        .map(|(i, song)| {
            let actions: [(&str, fn(usize) -> Command); 3] = [
                ("  Play next", Command::PlayNext),
                ("  Play last", Command::PlayLast),
                ("  Remove", Command::Remove),
            ];
            let mut children: Vec<Element> = vec![StaticText::new(song.clone()).into()];
            children.extend(actions.into_iter().map(|(label, command)| {
                let player = player.clone();
                ActionButton::new(label, move || send(&player, command(i))).into()
            }));
            Menu::new(song, children).bounds(1).submenu().autoclose().into()
        })
        .collect())
}

// ============ 蓝牙 ============

fn bluetooth(host: &Host) -> Menu {
    let (bt1, bt2, bt3, bt4, bt5, bt6) = (
        host.bluetooth.clone(),
        host.bluetooth.clone(),
        host.bluetooth.clone(),
        host.bluetooth.clone(),
        host.bluetooth.clone(),
        host.bluetooth.clone(),
    );

    Menu::new(
        "Bluetooth",
        vec![
            StaticText::new(Label::dynamic("Current: ", move || bt1.current_device())).into(),
            StaticText::new("").into(),
            ToggleSwitch::new("  Scan", false, move |on| bt2.set_scan(on))
                .tracking(move || bt6.is_scanning())
                .into(),
            Menu::lazy("Connect Device", move || device_list(&bt3, false))
                .autoclose()
                .into(),
            Menu::lazy("Remove Device", move || device_list(&bt4, true))
                .refresh_after_activation()
                .autoclose()
                .into(),
            ProgressiveFeed::new("  Disconnect", move || Ok(bt5.disconnect_feed())).into(),
        ],
    )
    .bounds(2)
    .submenu()
}

/// 设备列表，已配对的设备用于移除，其余用于连接
fn device_list(bt: &Bluetooth, paired: bool) -> anyhow::Result<Vec<Element>> {
    let devices = bt.list_devices(paired)?;
    if devices.is_empty() {
        return Ok(vec![StaticText::new("  No devices found").into()]);
    }

    Ok(devices
        .into_iter()
        .map(|device| {
            let bt = bt.clone();
            let title = format!(" {}", device.name);
            ProgressiveFeed::new(title, move || {
                Ok(if paired {
                    bt.remove_feed(device.clone())
                } else {
                    bt.connect_feed(device.clone())
                })
            })
            .into()
        })
        .collect())
}

// ============ 系统 ============

fn system() -> Menu {
    Menu::new(
        "System",
        vec![
            StaticText::new("System Options").into(),
            StaticText::new(Label::dynamic("Time: ", || Local::now().format("%H:%M:%S").to_string())).into(),
            ConfirmPrompt::new("  Reboot", || run_system(&["reboot", "-h", "now"])).into(),
            ConfirmPrompt::new("  Shutdown", || run_system(&["shutdown", "-h", "now"])).into(),
            ConfirmPrompt::unbound("  Disable WiFi").into(),
        ],
    )
    .bounds(2)
    .submenu()
}

fn run_system(args: &[&str]) -> anyhow::Result<()> {
    info!(command = %args.join(" "), "执行系统命令");
    let status = Process::new("sudo")
        .args(args)
        .status()
        .with_context(|| format!("无法执行 sudo {}", args.join(" ")))?;
    if !status.success() {
        bail!("sudo {} 失败: {}", args.join(" "), status);
    }
    Ok(())
}

// ============ 设置 ============

fn settings(host: &Host) -> Menu {
    let brightness = host.settings.borrow().brightness();
    let reshuffle = host.settings.borrow().reshuffle();
    let (store1, store2) = (host.settings.clone(), host.settings.clone());
    let player = host.player.clone();

    Menu::new(
        "Settings",
        vec![
            ValueSlider::new("  Brightness", brightness)
                .on_exit(move |value| {
                    let mut store = store1.borrow_mut();
                    store.set_brightness(value);
                    store.save()?;
                    Ok(())
                })
                .into(),
            ToggleSwitch::new("  Reshuffle", reshuffle, move |on| {
                let mut store = store2.borrow_mut();
                store.set_reshuffle(on);
                store.save()?;
                send(&player, Command::SetReshuffle(on))
            })
            .into(),
        ],
    )
    .bounds(0)
    .submenu()
}
