//! 通用绘制组件
//!
//! 选择标记、角标叠加和滑块进度条，都是纯文本操作

use crate::config::SLIDER_MAX;

/// 选中行的标记字符
pub const MARKER: char = '>';

/// 在 `col` 列处用 `text` 覆盖原有字符，不足的部分补空格
pub fn overlay(line: &str, col: usize, text: &str) -> String {
    let mut chars: Vec<char> = line.chars().collect();
    let end = col + text.chars().count();
    if chars.len() < end {
        chars.resize(end, ' ');
    }
    for (i, c) in text.chars().enumerate() {
        chars[col + i] = c;
    }
    chars.into_iter().collect()
}

/// 把行列表、选中标记和角标合成为最终显示的行
pub fn compose(lines: &[String], selected: Option<usize>, corner: Option<(u16, &str)>) -> Vec<String> {
    let mut out: Vec<String> = lines.to_vec();
    if let Some(index) = selected {
        if index < out.len() {
            out[index] = overlay(&out[index], 0, &MARKER.to_string());
        }
    }
    if let Some((offset, text)) = corner {
        if out.is_empty() {
            out.push(String::new());
        }
        out[0] = overlay(&out[0], offset as usize, text);
    }
    out
}

/// [组件] 滑块进度条，例如 `< [#####.....] >`
pub fn slider_bar(value: u8, width: usize) -> String {
    let value = value.min(SLIDER_MAX) as usize;
    let filled = (width * value + SLIDER_MAX as usize / 2) / SLIDER_MAX as usize;
    let left = if value > 0 { '<' } else { ' ' };
    let right = if value < SLIDER_MAX as usize { '>' } else { ' ' };
    format!(
        "{} [{}{}] {}",
        left,
        "#".repeat(filled),
        ".".repeat(width - filled),
        right
    )
}
