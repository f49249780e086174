//! 进度文本流
//!
//! 长时间运行的操作不返回单个结果，而是逐条产出状态文本。每消费一条更新就整屏重绘一次
//! 累积的文本；生产者耗尽即结束，没有重试，也没有额外的成功/失败信号。

use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use super::Activation;
use crate::error::Result;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;

/// 生产者产出的一条更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedUpdate {
    /// 清空已累积的所有行
    Clear,
    /// 追加一组行
    Lines(Vec<String>),
    /// 追加一行
    Line(String),
}

impl FeedUpdate {
    pub fn lines<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        FeedUpdate::Lines(lines.into_iter().map(Into::into).collect())
    }

    pub fn line(text: impl Into<String>) -> Self {
        FeedUpdate::Line(text.into())
    }
}

/// 惰性、有限、不可重启的更新序列；取下一条时可能阻塞
pub type Producer = Box<dyn Iterator<Item = anyhow::Result<FeedUpdate>>>;

type ProducerFactory = Box<dyn FnMut() -> anyhow::Result<Producer>>;

/// 把生产者的输出逐条显示到屏幕
pub struct ProgressiveFeed {
    title: String,
    source: ProducerFactory,
}

impl ProgressiveFeed {
    /// `source` 在每次激活时被调用一次，产生新的生产者
    pub fn new(title: impl Into<String>, source: impl FnMut() -> anyhow::Result<Producer> + 'static) -> Self {
        Self {
            title: title.into(),
            source: Box::new(source),
        }
    }

    pub fn label(&self) -> String {
        self.title.clone()
    }

    pub fn activate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<Activation> {
        debug!(title = %self.title, "开始消费进度流");
        let mut lines: Vec<String> = Vec::new();
        for update in (self.source)()? {
            match update? {
                FeedUpdate::Clear => lines.clear(),
                FeedUpdate::Lines(batch) => lines.extend(batch),
                FeedUpdate::Line(line) => lines.push(line),
            }
            console.draw(&lines, None)?;
        }
        Ok(Activation::Close)
    }
}

/// 发送端，由工作线程持有
pub struct FeedSender(mpsc::Sender<anyhow::Result<FeedUpdate>>);

impl FeedSender {
    pub fn clear(&self) {
        self.send(FeedUpdate::Clear);
    }

    pub fn line(&self, text: impl Into<String>) {
        self.send(FeedUpdate::line(text));
    }

    pub fn lines<S: Into<String>>(&self, lines: impl IntoIterator<Item = S>) {
        self.send(FeedUpdate::lines(lines));
    }

    pub fn send(&self, update: FeedUpdate) {
        // 接收端已丢弃时工作线程照常跑完
        let _ = self.0.send(Ok(update));
    }
}

/// 在工作线程中执行阻塞步骤，通过通道把更新交给导航线程
///
/// 工作函数返回的错误作为最后一条更新传给消费者。
pub fn spawn_producer<F>(work: F) -> Producer
where
    F: FnOnce(&FeedSender) -> anyhow::Result<()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let sender = FeedSender(tx);
        if let Err(e) = work(&sender) {
            warn!("进度流工作线程失败: {:#}", e);
            let _ = sender.0.send(Err(e));
        }
    });
    Box::new(rx.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::pressing;

    fn fixed(updates: Vec<FeedUpdate>) -> ProgressiveFeed {
        ProgressiveFeed::new("  Feed", move || {
            let items: Vec<anyhow::Result<FeedUpdate>> = updates.clone().into_iter().map(Ok).collect();
            Ok(Box::new(items.into_iter()) as Producer)
        })
    }

    fn rendered(feed: &mut ProgressiveFeed) -> Vec<Vec<String>> {
        let mut console = pressing(&[]);
        assert_eq!(feed.activate(&mut console).unwrap(), Activation::Close);
        console
            .renderer()
            .frames
            .iter()
            .map(|d| d.lines.clone())
            .collect()
    }

    #[test]
    fn test_renders_accumulated_lines_after_each_update() {
        let mut feed = fixed(vec![
            FeedUpdate::lines(["a", "b"]),
            FeedUpdate::line("c"),
            FeedUpdate::Clear,
            FeedUpdate::line("d"),
        ]);
        let expected: Vec<Vec<String>> = vec![
            vec!["a".into(), "b".into()],
            vec!["a".into(), "b".into(), "c".into()],
            vec![],
            vec!["d".into()],
        ];
        assert_eq!(rendered(&mut feed), expected);
    }

    #[test]
    fn test_each_activation_starts_fresh() {
        let mut feed = fixed(vec![FeedUpdate::line("x")]);
        rendered(&mut feed);
        assert_eq!(rendered(&mut feed), vec![vec!["x".to_string()]]);
    }

    #[test]
    fn test_producer_failure_propagates() {
        let mut feed = ProgressiveFeed::new("  Broken", || {
            let items: Vec<anyhow::Result<FeedUpdate>> =
                vec![Ok(FeedUpdate::line("working")), Err(anyhow::anyhow!("lost device"))];
            Ok(Box::new(items.into_iter()) as Producer)
        });
        let mut console = pressing(&[]);
        assert!(feed.activate(&mut console).is_err());
        assert_eq!(console.renderer().frames.len(), 1);
    }

    #[test]
    fn test_spawned_producer_streams_in_order() {
        let mut feed = ProgressiveFeed::new("  Worker", || {
            Ok(spawn_producer(|tx| {
                tx.lines(["Speaker", "Pairing..."]);
                tx.clear();
                tx.line("Connected!");
                Ok(())
            }))
        });
        let frames = rendered(&mut feed);
        assert_eq!(frames.last().unwrap(), &vec!["Connected!".to_string()]);
        assert_eq!(frames.len(), 3);
    }
}
