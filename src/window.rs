/// Rounds shown in the backtest chart and table.
pub const DEFAULT_WINDOW: usize = 20;

/// The trailing `k` items of `series`, in original order. Only the head is
/// ever dropped; shorter inputs come back whole.
pub fn trailing_window<T>(series: &[T], k: usize) -> &[T] {
    &series[series.len().saturating_sub(k)..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_k_in_order() {
        let series: Vec<u32> = (0..25).collect();
        let window = trailing_window(&series, 20);
        assert_eq!(window.len(), 20);
        assert_eq!(window[0], 5);
        assert_eq!(window[19], 24);
    }

    #[test]
    fn short_series_is_returned_whole() {
        let series = [1, 2, 3];
        let window = trailing_window(&series, 20);
        assert_eq!(window, &series);
        assert!(std::ptr::eq(window.as_ptr(), series.as_ptr()));
    }

    #[test]
    fn zero_budget_and_empty_input() {
        let series = [1, 2, 3];
        assert!(trailing_window(&series, 0).is_empty());
        let empty: [u8; 0] = [];
        assert!(trailing_window(&empty, 20).is_empty());
    }
}
