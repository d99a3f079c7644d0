//! 可见性优先排序
//!
//! 视口内的单元排在前面，同组内按纵向位置升序；位置相同时保持文档顺序。

use std::cmp::Ordering;

use super::collector::TextUnit;

/// 按可见性和纵向位置稳定排序
pub fn prioritize(mut units: Vec<TextUnit>) -> Vec<TextUnit> {
    units.sort_by(compare_priority);
    units
}

fn compare_priority(a: &TextUnit, b: &TextUnit) -> Ordering {
    // true 排在 false 之前
    b.is_visible
        .cmp(&a.is_visible)
        .then_with(|| a.vertical_position.total_cmp(&b.vertical_position))
}
