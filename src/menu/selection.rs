//! 选择与分页计算
//!
//! 所有越界判断都针对当前可见条目数实时计算，不依赖过期的页长度。

use crate::config::PAGE_SIZE;

/// 选择范围：上下移动在此范围内循环
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionBounds {
    /// 只有下界，上界为可见列表的末尾
    From(usize),
    /// 显式的上下界
    Between(usize, usize),
}

impl SelectionBounds {
    /// 下界，越界时收缩到最后一个可见条目
    pub fn low(&self, visible: usize) -> usize {
        let low = match *self {
            SelectionBounds::From(low) | SelectionBounds::Between(low, _) => low,
        };
        low.min(visible.saturating_sub(1))
    }

    /// 上界
    pub fn high(&self, visible: usize) -> usize {
        let last = visible.saturating_sub(1);
        match *self {
            SelectionBounds::From(_) => last,
            SelectionBounds::Between(_, high) => high.min(last),
        }
    }

    /// 向上移动，在下界处回绕到上界
    pub fn up(&self, index: usize, visible: usize) -> usize {
        if visible == 0 {
            return 0;
        }
        if index <= self.low(visible) {
            self.high(visible)
        } else {
            index - 1
        }
    }

    /// 向下移动，在上界处回绕到下界
    pub fn down(&self, index: usize, visible: usize) -> usize {
        if visible == 0 {
            return 0;
        }
        if index >= self.high(visible) {
            self.low(visible)
        } else {
            index + 1
        }
    }

    /// 把过期的索引拉回范围内
    pub fn clamp(&self, index: usize, visible: usize) -> usize {
        index.clamp(self.low(visible), self.high(visible).max(self.low(visible)))
    }
}

impl From<usize> for SelectionBounds {
    fn from(low: usize) -> Self {
        SelectionBounds::From(low)
    }
}

impl From<(usize, usize)> for SelectionBounds {
    fn from((low, high): (usize, usize)) -> Self {
        SelectionBounds::Between(low, high)
    }
}

/// 分页列表的排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Insertion,
    Alphabetical,
}

impl SortMode {
    pub fn toggled(self) -> Self {
        match self {
            SortMode::Insertion => SortMode::Alphabetical,
            SortMode::Alphabetical => SortMode::Insertion,
        }
    }
}

/// 分页视图
///
/// 保存排序后的子元素下标，按 `PAGE_SIZE` 切成连续的页。排序作用于整个列表，然后再分页。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pages {
    order: Vec<usize>,
}

impl Pages {
    pub fn build(labels: &[String], sort: SortMode) -> Self {
        let mut order: Vec<usize> = (0..labels.len()).collect();
        if sort == SortMode::Alphabetical {
            // 稳定排序，同名条目保持原有顺序
            order.sort_by(|&a, &b| labels[a].cmp(&labels[b]));
        }
        Self { order }
    }

    /// 页数 = ceil(n / PAGE_SIZE)
    pub fn count(&self) -> usize {
        self.order.len().div_ceil(PAGE_SIZE)
    }

    /// 第 `page` 页包含的子元素下标
    pub fn page(&self, page: usize) -> &[usize] {
        self.order.chunks(PAGE_SIZE).nth(page).unwrap_or(&[])
    }
}
