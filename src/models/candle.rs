use serde::Serialize;

use crate::models::range::Interval;

/// 单根K线数据结构
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    /// UTC秒级时间戳
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// 按时间升序排列的K线序列
#[derive(Debug, Clone, Serialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub interval: Interval,
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    /// 创建新的K线序列，时间戳升序排列且唯一
    pub fn new(symbol: &str, interval: Interval, mut candles: Vec<Candle>) -> Self {
        candles.sort_by_key(|c| c.ts);
        candles.dedup_by_key(|c| c.ts);

        Self {
            symbol: symbol.to_string(),
            interval,
            candles,
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn first(&self) -> Option<&Candle> {
        self.candles.first()
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// 收盘价序列，与K线逐行对齐
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle {
            ts,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }

    #[test]
    fn new_sorts_by_timestamp() {
        let series = CandleSeries::new(
            "AAPL",
            Interval::D1,
            vec![candle(30, 3.0), candle(10, 1.0), candle(20, 2.0)],
        );

        let ts: Vec<i64> = series.candles.iter().map(|c| c.ts).collect();
        assert_eq!(ts, vec![10, 20, 30]);
    }

    #[test]
    fn new_drops_duplicate_timestamps() {
        let series = CandleSeries::new(
            "AAPL",
            Interval::D1,
            vec![candle(10, 1.0), candle(10, 9.0), candle(20, 2.0)],
        );

        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0, 2.0]);
    }

    #[test]
    fn timestamps_strictly_increasing() {
        let series = CandleSeries::new(
            "MSFT",
            Interval::D1,
            vec![candle(5, 1.0), candle(3, 1.0), candle(5, 1.0), candle(8, 1.0)],
        );

        let strictly_increasing = series
            .candles
            .windows(2)
            .all(|w| w[0].ts < w[1].ts);
        assert!(strictly_increasing);
    }
}
