//! 菜单导航循环
//!
//! 渲染 -> 去抖 -> 等待按键 -> 更新状态或激活子元素，直到返回键（子菜单）或自动关闭。
//! 子菜单的循环是阻塞调用，退出后控制权回到父菜单，父菜单重新渲染后继续。

use tracing::{debug, error};

use super::selection::{Pages, SelectionBounds, SortMode};
use super::{Activation, Callback, Element, Updater};
use crate::error::Result;
use crate::ui::actions::Button;
use crate::ui::console::Console;
use crate::ui::input::InputSource;
use crate::ui::view::Renderer;

/// 页码角标右对齐的列
const PAGE_INDICATOR_COLUMN: u16 = 21;

/// 一次按键处理后的去向
enum Step {
    /// 状态已变化，重新渲染
    Redraw,
    /// 按键无效，继续等待
    Ignore,
    /// 退出菜单
    Exit,
}

/// 单次激活期间的导航状态
struct NavState {
    selected: usize,
    page: usize,
    sort: SortMode,
    pages: Option<Pages>,
    resort: bool,
}

/// 可嵌套的菜单
pub struct Menu {
    title: String,
    children: Vec<Element>,
    bounds: SelectionBounds,
    submenu: bool,
    autoclose: bool,
    refresh: bool,
    paginated: bool,
    sortable: bool,
    updater: Option<Updater>,
    aux: [Option<Callback>; 3],
}

impl Menu {
    pub fn new(title: impl Into<String>, children: Vec<Element>) -> Self {
        Self {
            title: title.into(),
            children,
            bounds: SelectionBounds::From(0),
            submenu: false,
            autoclose: false,
            refresh: false,
            paginated: false,
            sortable: false,
            updater: None,
            aux: [None, None, None],
        }
    }

    /// 子元素完全由更新函数提供的子菜单
    pub fn lazy(title: impl Into<String>, updater: impl FnMut() -> anyhow::Result<Vec<Element>> + 'static) -> Self {
        Self::new(title, Vec::new()).updater(updater).submenu()
    }

    // ============ 构造选项 ============

    pub fn bounds(mut self, bounds: impl Into<SelectionBounds>) -> Self {
        self.bounds = bounds.into();
        self
    }

    /// 位于其他菜单之内，返回键可以退出
    pub fn submenu(mut self) -> Self {
        self.submenu = true;
        self
    }

    /// 子元素激活完成后自动关闭本菜单
    pub fn autoclose(mut self) -> Self {
        self.autoclose = true;
        self
    }

    /// 每次重新渲染前（分页菜单为每次激活后）重新拉取子元素
    pub fn refresh_after_activation(mut self) -> Self {
        self.refresh = true;
        self
    }

    pub fn paginated(mut self) -> Self {
        self.paginated = true;
        self
    }

    /// 辅助键 2 切换字母序，仅对分页菜单有效
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn updater(mut self, updater: impl FnMut() -> anyhow::Result<Vec<Element>> + 'static) -> Self {
        self.updater = Some(Box::new(updater));
        self
    }

    /// 覆盖辅助键 1（默认：上一页）
    pub fn on_aux1(mut self, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.aux[0] = Some(Box::new(action));
        self
    }

    /// 覆盖辅助键 2（默认：切换排序）
    pub fn on_aux2(mut self, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.aux[1] = Some(Box::new(action));
        self
    }

    /// 覆盖辅助键 3（默认：下一页）
    pub fn on_aux3(mut self, action: impl FnMut() -> anyhow::Result<()> + 'static) -> Self {
        self.aux[2] = Some(Box::new(action));
        self
    }

    // ============ 查询 ============

    pub fn label(&self) -> String {
        format!("  {}", self.title)
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    // ============ 激活 ============

    pub fn activate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<Activation> {
        if !self.populate()? {
            error!(menu = %self.title, "菜单没有子项，也没有更新函数");
            return Ok(Activation::Ignored);
        }
        debug!(menu = %self.title, children = self.children.len(), "进入菜单");

        self.navigate(console)?;

        debug!(menu = %self.title, "退出菜单");
        if self.updater.is_some() {
            // 下次进入时重新拉取
            self.children.clear();
        }
        Ok(if self.submenu {
            Activation::Close
        } else {
            Activation::Consumed
        })
    }

    /// 进入时填充子元素；既没有子元素也没有更新函数时返回 false
    fn populate(&mut self) -> Result<bool> {
        let Some(updater) = self.updater.as_mut() else {
            return Ok(!self.children.is_empty());
        };
        if self.children.is_empty() {
            self.children = updater()?;
        } else {
            self.children.extend(updater()?);
        }
        Ok(true)
    }

    fn repopulate(&mut self) -> Result<bool> {
        match self.updater.as_mut() {
            Some(updater) => {
                self.children = updater()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn labels(&self) -> Vec<String> {
        self.children.iter().map(Element::label).collect()
    }

    /// 当前可见的子元素下标
    fn visible(&self, nav: &NavState) -> Vec<usize> {
        match &nav.pages {
            Some(pages) => pages.page(nav.page).to_vec(),
            None => (0..self.children.len()).collect(),
        }
    }

    fn navigate<R: Renderer, I: InputSource>(&mut self, console: &mut Console<R, I>) -> Result<()> {
        let mut nav = NavState {
            selected: self.bounds.low(self.children.len()),
            page: 0,
            sort: SortMode::Insertion,
            pages: None,
            resort: self.paginated,
        };
        let mut first = true;

        loop {
            // 渲染
            if self.refresh && !first && !self.paginated && self.repopulate()? {
                debug!(menu = %self.title, "刷新菜单列表");
            }
            if self.paginated && nav.resort {
                let pages = Pages::build(&self.labels(), nav.sort);
                nav.page = nav.page.min(pages.count().saturating_sub(1));
                nav.pages = Some(pages);
                nav.resort = false;
            }
            let visible = self.visible(&nav);
            nav.selected = self.bounds.clamp(nav.selected, visible.len());

            let lines: Vec<String> = visible.iter().map(|&i| self.children[i].label()).collect();
            let marker = (!visible.is_empty()).then_some(nav.selected);
            match nav.pages.as_ref().map(Pages::count) {
                Some(count) if count > 1 => {
                    let indicator = format!("{}/{}", nav.page + 1, count);
                    let offset = PAGE_INDICATOR_COLUMN.saturating_sub(indicator.len() as u16);
                    console.draw_with_corner(&lines, marker, (offset, indicator.as_str()))?;
                }
                _ => console.draw(&lines, marker)?,
            }
            console.settle();
            first = false;

            // 等待有效按键
            loop {
                let button = console.next_edge(&Button::NAVIGATION)?;
                match self.handle(button, &visible, &mut nav, console)? {
                    Step::Redraw => break,
                    Step::Ignore => continue,
                    Step::Exit => return Ok(()),
                }
            }
        }
    }

    fn handle<R: Renderer, I: InputSource>(
        &mut self,
        button: Button,
        visible: &[usize],
        nav: &mut NavState,
        console: &mut Console<R, I>,
    ) -> Result<Step> {
        let step = match button {
            Button::Up => {
                nav.selected = self.bounds.up(nav.selected, visible.len());
                Step::Redraw
            }
            Button::Down => {
                nav.selected = self.bounds.down(nav.selected, visible.len());
                Step::Redraw
            }
            Button::Right | Button::Select => self.dispatch(visible, nav, console)?,
            Button::Left => {
                if self.submenu {
                    Step::Exit
                } else {
                    Step::Ignore
                }
            }
            Button::Aux1 => {
                if let Some(action) = &mut self.aux[0] {
                    action()?;
                    Step::Redraw
                } else if self.paginated && nav.page > 0 {
                    nav.page -= 1;
                    Step::Redraw
                } else {
                    Step::Ignore
                }
            }
            Button::Aux2 => {
                if let Some(action) = &mut self.aux[1] {
                    action()?;
                    Step::Redraw
                } else if self.paginated && self.sortable {
                    nav.sort = nav.sort.toggled();
                    nav.resort = true;
                    debug!(menu = %self.title, sort = ?nav.sort, "切换排序");
                    Step::Redraw
                } else {
                    Step::Ignore
                }
            }
            Button::Aux3 => {
                let pages = nav.pages.as_ref().map_or(0, Pages::count);
                if let Some(action) = &mut self.aux[2] {
                    action()?;
                    Step::Redraw
                } else if self.paginated && nav.page + 1 < pages {
                    nav.page += 1;
                    Step::Redraw
                } else {
                    Step::Ignore
                }
            }
        };
        Ok(step)
    }

    /// 激活选中的子元素
    fn dispatch<R: Renderer, I: InputSource>(
        &mut self,
        visible: &[usize],
        nav: &mut NavState,
        console: &mut Console<R, I>,
    ) -> Result<Step> {
        let Some(&index) = visible.get(nav.selected) else {
            return Ok(Step::Ignore);
        };
        debug!(menu = %self.title, index, "激活子项");
        let outcome = self.children[index].activate(console)?;
        if !outcome.finished() || !self.submenu {
            return Ok(Step::Redraw);
        }

        if !self.paginated {
            if self.autoclose {
                return Ok(Step::Exit);
            }
        } else if self.refresh && self.repopulate()? {
            debug!(menu = %self.title, "激活后重新分页");
            nav.resort = true;
        }
        Ok(Step::Redraw)
    }
}
