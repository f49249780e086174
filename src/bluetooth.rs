//! 蓝牙设备管理（基于 bluetoothctl）
//!
//! 所有阻塞的 bluetoothctl 调用都在工作线程中执行，通过进度流把状态文字送回屏幕。

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use tracing::{info, warn};

use crate::config::{FEED_MESSAGE_DELAY, PAIR_ATTEMPTS};
use crate::menu::feed::{FeedSender, Producer, spawn_producer};
use crate::player::{self, PlayerHandle};

/// 蓝牙设备
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub mac: String,
}

impl Device {
    /// 解析 `Device <MAC> <名称>` 一行
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(3, ' ');
        let _kind = parts.next()?;
        let mac = parts.next()?;
        let name = parts.next()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            mac: mac.to_string(),
        })
    }
}

/// 解析设备列表，跳过空行、未命名设备（名称就是 MAC）、RSSI 行以及不需要的设备
pub fn parse_devices(output: &str) -> Vec<Device> {
    output
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            !(line.trim().is_empty()
                || line.split('-').count() >= 5
                || line.contains("RSSI")
                || lower.contains("harp")
                || lower.contains("ble"))
        })
        .filter_map(Device::parse)
        .collect()
}

/// 执行 bluetoothctl 子命令
pub trait Runner: Send + Sync {
    fn run(&self, args: &[&str]) -> anyhow::Result<String>;
}

/// 调用系统中的 bluetoothctl
#[derive(Debug, Clone)]
pub struct SystemRunner {
    program: String,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            program: "bluetoothctl".to_string(),
        }
    }
}

impl Runner for SystemRunner {
    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("无法执行 {}", self.program))?;
        if !output.status.success() {
            bail!("{} {} 失败: {}", self.program, args.join(" "), output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// 蓝牙控制器，可在菜单回调和工作线程之间克隆共享
#[derive(Clone)]
pub struct Bluetooth {
    runner: Arc<dyn Runner>,
    player: PlayerHandle,
    scanner: Arc<Mutex<Option<Child>>>,
    delay: Duration,
}

impl Bluetooth {
    pub fn new(runner: Arc<dyn Runner>, player: PlayerHandle) -> Self {
        Self {
            runner,
            player,
            scanner: Arc::new(Mutex::new(None)),
            delay: FEED_MESSAGE_DELAY,
        }
    }

    /// 状态文字的停留时间
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }

    /// 已发现或已配对的设备
    pub fn list_devices(&self, paired: bool) -> anyhow::Result<Vec<Device>> {
        let command = if paired { "paired-devices" } else { "devices" };
        Ok(parse_devices(&self.runner.run(&[command])?))
    }

    /// 当前连接的设备名
    pub fn current_device(&self) -> String {
        match self.player.snapshot() {
            Ok(snap) => snap.device.map(|d| d.name).unwrap_or_else(|| "None".to_string()),
            Err(_) => "None".to_string(),
        }
    }

    // ============ 扫描 ============

    /// 启动或停止后台扫描进程
    pub fn set_scan(&self, enabled: bool) -> anyhow::Result<()> {
        let mut scanner = self
            .scanner
            .lock()
            .map_err(|_| anyhow::anyhow!("扫描进程状态已损坏"))?;
        if enabled {
            if scanner.is_none() {
                let child = Command::new("bluetoothctl")
                    .args(["scan", "on"])
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                    .context("无法启动蓝牙扫描")?;
                *scanner = Some(child);
                info!("开始扫描蓝牙设备");
            }
        } else if let Some(child) = scanner.take() {
            stop_child(child);
            if let Err(e) = self.runner.run(&["scan", "off"]) {
                warn!("关闭扫描失败: {:#}", e);
            }
            info!("停止扫描蓝牙设备");
        }
        Ok(())
    }

    /// 扫描进程是否在运行
    pub fn is_scanning(&self) -> bool {
        self.scanner.lock().map(|s| s.is_some()).unwrap_or(false)
    }

    /// 退出前结束仍在运行的扫描进程
    pub fn shutdown(&self) {
        if self.is_scanning() {
            info!("退出时停止扫描");
        }
        self.stop_scanner();
    }

    fn stop_scanner(&self) {
        if let Ok(mut scanner) = self.scanner.lock()
            && let Some(child) = scanner.take()
        {
            stop_child(child);
        }
    }

    // ============ 进度流 ============

    /// 配对（如有必要）并连接设备
    pub fn connect_feed(&self, device: Device) -> Producer {
        let bt = self.clone();
        spawn_producer(move |tx| bt.connect(&device, tx))
    }

    /// 移除已配对的设备
    pub fn remove_feed(&self, device: Device) -> Producer {
        let bt = self.clone();
        spawn_producer(move |tx| bt.remove(&device, tx))
    }

    /// 断开当前设备
    pub fn disconnect_feed(&self) -> Producer {
        let bt = self.clone();
        spawn_producer(move |tx| bt.disconnect(tx))
    }

    fn connect(&self, device: &Device, tx: &FeedSender) -> anyhow::Result<()> {
        info!(device = %device.name, mac = %device.mac, "连接设备");
        let status = self.runner.run(&["info", device.mac.as_str()]).unwrap_or_else(|e| {
            warn!("读取设备信息失败: {:#}", e);
            String::new()
        });

        if !status.contains("Paired: yes") {
            tx.lines([device.name.as_str(), "Trying to pair..."]);
            let paired = (0..PAIR_ATTEMPTS).any(|attempt| match self.runner.run(&["pair", device.mac.as_str()]) {
                Ok(_) => true,
                Err(e) => {
                    warn!(attempt = attempt + 1, "配对失败: {:#}", e);
                    self.pause();
                    false
                }
            });
            if !paired {
                tx.clear();
                tx.lines([device.name.as_str(), "Failed to pair!"]);
                self.pause();
                return Ok(());
            }
        }

        if !status.contains("Connected: yes") {
            tx.clear();
            tx.lines([device.name.as_str(), "Paired", "Trying to connect..."]);
            let connected = self
                .runner
                .run(&["connect", device.mac.as_str()])
                .or_else(|e| {
                    warn!("连接失败，重试: {:#}", e);
                    self.pause();
                    self.runner.run(&["connect", device.mac.as_str()])
                });
            if let Err(e) = connected {
                warn!("连接失败: {:#}", e);
                tx.clear();
                tx.lines([device.name.as_str(), "Paired", "Failed to connect!"]);
                self.pause();
                return Ok(());
            }
        }

        self.stop_scanner();
        self.player.send(player::Command::Connect(device.clone()))?;
        tx.clear();
        tx.lines([device.name.as_str(), "Connected!"]);

        if !status.contains("Trusted: yes") {
            match self.runner.run(&["trust", device.mac.as_str()]) {
                Ok(_) => tx.line("Trusted"),
                Err(e) => warn!("信任设备失败: {:#}", e),
            }
        }
        self.pause();
        Ok(())
    }

    fn remove(&self, device: &Device, tx: &FeedSender) -> anyhow::Result<()> {
        info!(device = %device.name, mac = %device.mac, "移除设备");
        tx.lines([device.name.as_str(), "Removing..."]);
        if let Err(e) = self.runner.run(&["remove", device.mac.as_str()]) {
            warn!("移除失败: {:#}", e);
            tx.clear();
            tx.lines([device.name.as_str(), "Failed to remove!"]);
            self.pause();
            return Ok(());
        }
        let current = self.player.snapshot()?.device;
        if current.is_some_and(|d| d.mac == device.mac) {
            self.player.send(player::Command::Disconnect)?;
        }
        Ok(())
    }

    fn disconnect(&self, tx: &FeedSender) -> anyhow::Result<()> {
        let Some(device) = self.player.snapshot()?.device else {
            tx.line("No device connected!");
            self.pause();
            return Ok(());
        };
        tx.lines([device.name.as_str(), "Disconnecting..."]);
        match self.runner.run(&["disconnect", device.mac.as_str()]) {
            Ok(_) => self.player.send(player::Command::Disconnect)?,
            Err(e) => {
                warn!("断开失败: {:#}", e);
                tx.clear();
                tx.lines([device.name.as_str(), "Error disconnecting!"]);
                self.pause();
            }
        }
        Ok(())
    }
}

fn stop_child(mut child: Child) {
    if let Err(e) = child.kill() {
        warn!("结束扫描进程失败: {}", e);
    }
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::FeedUpdate;
    use crate::player::{Library, PlayerState};
    use std::collections::HashMap;

    const LISTING: &str = "\
Device D8:37:3B:0E:9D:C5 JBL Flip
Device 11:22:33:44:55:66 11-22-33-44-55-66

Device AA:BB:CC:DD:EE:FF Sharp TV
Device 01:02:03:04:05:06 BLE Beacon
[CHG] Device 01:02:03:04:05:07 RSSI: -70
Device 77:88:99:AA:BB:CC Kitchen Speaker";

    #[test]
    fn test_parse_filters_unwanted_lines() {
        let devices = parse_devices(LISTING);
        let names: Vec<&str> = devices.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["JBL Flip", "Kitchen Speaker"]);
        assert_eq!(devices[0].mac, "D8:37:3B:0E:9D:C5");
    }

    #[test]
    fn test_parse_rejects_incomplete_line() {
        assert_eq!(Device::parse("Device D8:37:3B:0E:9D:C5"), None);
    }

    /// 按子命令返回预设结果并记录调用
    #[derive(Default)]
    struct FakeRunner {
        replies: HashMap<&'static str, anyhow::Result<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        fn reply(mut self, command: &'static str, reply: anyhow::Result<String>) -> Self {
            self.replies.insert(command, reply);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Runner for FakeRunner {
        fn run(&self, args: &[&str]) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(args.join(" "));
            match self.replies.get(args[0]) {
                Some(Ok(out)) => Ok(out.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
                None => Ok(String::new()),
            }
        }
    }

    fn speaker() -> Device {
        Device {
            name: "JBL Flip".into(),
            mac: "D8:37:3B:0E:9D:C5".into(),
        }
    }

    fn setup(runner: FakeRunner) -> (Bluetooth, Arc<FakeRunner>, PlayerHandle) {
        let runner = Arc::new(runner);
        let (player, _join) = PlayerHandle::spawn(PlayerState::new(Library::default(), true));
        let bt = Bluetooth::new(runner.clone(), player.clone()).with_delay(Duration::ZERO);
        (bt, runner, player)
    }

    fn drain(producer: Producer) -> Vec<FeedUpdate> {
        producer.map(|u| u.unwrap()).collect()
    }

    #[test]
    fn test_connect_pairs_then_records_device() {
        let (bt, runner, player) = setup(FakeRunner::default());
        let updates = drain(bt.connect_feed(speaker()));
        assert_eq!(
            updates.last(),
            Some(&FeedUpdate::line("Trusted"))
        );
        assert!(updates.contains(&FeedUpdate::lines(["JBL Flip", "Connected!"])));
        assert_eq!(
            runner.calls(),
            vec![
                "info D8:37:3B:0E:9D:C5",
                "pair D8:37:3B:0E:9D:C5",
                "connect D8:37:3B:0E:9D:C5",
                "trust D8:37:3B:0E:9D:C5",
            ]
        );
        assert_eq!(player.snapshot().unwrap().device, Some(speaker()));
        assert_eq!(bt.current_device(), "JBL Flip");
    }

    /// 用一个长时间运行的进程占住扫描位置
    fn start_fake_scan(bt: &Bluetooth) {
        let child = Command::new("sleep").arg("30").spawn().unwrap();
        *bt.scanner.lock().unwrap() = Some(child);
    }

    #[test]
    fn test_shutdown_stops_scanner() {
        let (bt, _, _) = setup(FakeRunner::default());
        start_fake_scan(&bt);
        assert!(bt.is_scanning());
        bt.clone().shutdown();
        assert!(!bt.is_scanning());
        assert!(bt.scanner.lock().unwrap().is_none());
    }

    #[test]
    fn test_connect_stops_scanner() {
        let (bt, _, _) = setup(FakeRunner::default());
        start_fake_scan(&bt);
        drain(bt.connect_feed(speaker()));
        assert!(!bt.is_scanning());
    }

    #[test]
    fn test_pair_gives_up_after_three_attempts() {
        let runner = FakeRunner::default().reply("pair", Err(anyhow::anyhow!("busy")));
        let (bt, runner, player) = setup(runner);
        let updates = drain(bt.connect_feed(speaker()));
        assert_eq!(updates.last(), Some(&FeedUpdate::lines(["JBL Flip", "Failed to pair!"])));
        let pairs = runner.calls().iter().filter(|c| c.starts_with("pair")).count();
        assert_eq!(pairs, PAIR_ATTEMPTS);
        assert!(player.snapshot().unwrap().device.is_none());
    }

    #[test]
    fn test_connect_retries_once() {
        let runner = FakeRunner::default()
            .reply("info", Ok("Paired: yes\nTrusted: yes\n".into()))
            .reply("connect", Err(anyhow::anyhow!("refused")));
        let (bt, runner, _player) = setup(runner);
        let updates = drain(bt.connect_feed(speaker()));
        assert_eq!(
            updates.last(),
            Some(&FeedUpdate::lines(["JBL Flip", "Paired", "Failed to connect!"]))
        );
        let connects = runner.calls().iter().filter(|c| c.starts_with("connect")).count();
        assert_eq!(connects, 2);
    }

    #[test]
    fn test_remove_clears_current_device() {
        let (bt, _runner, player) = setup(FakeRunner::default());
        player.send(player::Command::Connect(speaker())).unwrap();
        drain(bt.remove_feed(speaker()));
        assert!(player.snapshot().unwrap().device.is_none());
    }

    #[test]
    fn test_disconnect_without_device() {
        let (bt, runner, _player) = setup(FakeRunner::default());
        let updates = drain(bt.disconnect_feed());
        assert_eq!(updates, vec![FeedUpdate::line("No device connected!")]);
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_disconnect_failure_keeps_device() {
        let runner = FakeRunner::default().reply("disconnect", Err(anyhow::anyhow!("timeout")));
        let (bt, _runner, player) = setup(runner);
        player.send(player::Command::Connect(speaker())).unwrap();
        let updates = drain(bt.disconnect_feed());
        assert_eq!(
            updates.last(),
            Some(&FeedUpdate::lines(["JBL Flip", "Error disconnecting!"]))
        );
        assert_eq!(player.snapshot().unwrap().device, Some(speaker()));
    }
}
