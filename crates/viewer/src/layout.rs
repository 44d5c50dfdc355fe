use shapez_common::ViewRect;

/// Split a `width` x `height` surface into `count` equal cells, filling rows
/// left to right, top to bottom. The grid is as close to square as possible.
pub fn grid_layout(count: usize, width: u32, height: u32) -> Vec<ViewRect> {
    if count == 0 {
        return Vec::new();
    }
    let columns = (count as f64).sqrt().ceil() as u32;
    let rows = (count as u32).div_ceil(columns);
    let cell_w = width / columns;
    let cell_h = height / rows;
    (0..count as u32)
        .map(|i| {
            let (row, column) = (i / columns, i % columns);
            ViewRect::new(
                (row * cell_h) as i32,
                (column * cell_w) as i32,
                cell_w,
                cell_h,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_view_fills_surface() {
        assert_eq!(grid_layout(1, 640, 480), vec![ViewRect::new(0, 0, 640, 480)]);
    }

    #[test]
    fn two_views_sit_side_by_side() {
        assert_eq!(
            grid_layout(2, 200, 100),
            vec![ViewRect::new(0, 0, 100, 100), ViewRect::new(0, 100, 100, 100)]
        );
    }

    #[test]
    fn five_views_use_a_three_by_two_grid() {
        let cells = grid_layout(5, 300, 200);
        assert_eq!(cells.len(), 5);
        assert_eq!(cells[3], ViewRect::new(100, 0, 100, 100));
        assert_eq!(cells[4], ViewRect::new(100, 100, 100, 100));
    }

    #[test]
    fn zero_views_yield_nothing() {
        assert!(grid_layout(0, 100, 100).is_empty());
    }
}
