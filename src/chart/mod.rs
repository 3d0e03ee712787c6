use serde::Serialize;

use crate::indicators::sma::MaSeries;

/// 图表中的单根蜡烛，数值可能已经过对数变换
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CandlePoint {
    pub ts: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// 叠加在蜡烛图上的折线，与蜡烛逐根对齐
#[derive(Debug, Clone, Serialize)]
pub struct LineSeries {
    pub label: String,
    pub points: Vec<Option<f64>>,
}

/// 可渲染的图表描述：一条蜡烛序列加若干叠加折线
#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub axis_label: &'static str,
    pub log_scale: bool,
    pub candles: Vec<CandlePoint>,
    pub overlays: Vec<LineSeries>,
}

impl ChartSpec {
    /// 所有绘制数值的最小/最大值，空图表返回None
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for c in &self.candles {
            min = min.min(c.low);
            max = max.max(c.high);
        }
        for line in &self.overlays {
            for v in line.points.iter().flatten() {
                min = min.min(*v);
                max = max.max(*v);
            }
        }

        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

/// 构建图表描述
///
/// 开启对数坐标时，所有绘制数值（OHLC和每条均线的每个点）在进入
/// 图表描述前都做log10变换，坐标轴标签随之切换。除此之外不做任何
/// 数值处理。
pub fn build_chart(frame: &MaSeries, log_scale: bool) -> ChartSpec {
    let transform = |v: f64| if log_scale { v.log10() } else { v };

    let candles = frame
        .series
        .candles
        .iter()
        .map(|c| CandlePoint {
            ts: c.ts,
            open: transform(c.open),
            high: transform(c.high),
            low: transform(c.low),
            close: transform(c.close),
        })
        .collect();

    let overlays = frame
        .columns
        .iter()
        .map(|col| LineSeries {
            label: col.label.clone(),
            points: col.values.iter().map(|v| v.map(transform)).collect(),
        })
        .collect();

    ChartSpec {
        title: format!("{} Stock Price with Moving Averages", frame.series.symbol),
        axis_label: if log_scale { "log10(Price)" } else { "Price" },
        log_scale,
        candles,
        overlays,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::with_moving_averages;
    use crate::models::candle::{Candle, CandleSeries};
    use crate::models::range::Interval;

    fn constant_series(price: f64, len: usize) -> MaSeries {
        let candles = (0..len)
            .map(|i| Candle {
                ts: i as i64 * 86400,
                open: price,
                high: price,
                low: price,
                close: price,
                volume: 1,
            })
            .collect();
        let series = CandleSeries::new("FLAT", Interval::D1, candles);
        with_moving_averages(&series, &[3])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn one_candlestick_series_one_line_per_column() {
        let candles = (0..10)
            .map(|i| Candle {
                ts: i * 86400,
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.5,
                volume: 1,
            })
            .collect();
        let series = CandleSeries::new("AAPL", Interval::D1, candles);
        let frame = with_moving_averages(&series, &[3, 5, 8]);

        let spec = build_chart(&frame, false);

        assert_eq!(spec.candles.len(), 10);
        assert_eq!(spec.overlays.len(), 3);
        assert_eq!(spec.overlays[0].label, "MA3");
        assert_eq!(spec.title, "AAPL Stock Price with Moving Averages");
        assert_eq!(spec.axis_label, "Price");
    }

    #[test]
    fn linear_mode_keeps_raw_values() {
        let frame = constant_series(100.0, 5);
        let spec = build_chart(&frame, false);

        assert!(spec.candles.iter().all(|c| approx(c.close, 100.0)));
        assert!(spec.overlays[0]
            .points
            .iter()
            .flatten()
            .all(|v| approx(*v, 100.0)));
    }

    #[test]
    fn log_mode_transforms_every_plotted_value() {
        // 恒定价格P在对数坐标下应恒为log10(P)
        let frame = constant_series(100.0, 6);
        let spec = build_chart(&frame, true);

        for c in &spec.candles {
            assert!(approx(c.open, 2.0));
            assert!(approx(c.high, 2.0));
            assert!(approx(c.low, 2.0));
            assert!(approx(c.close, 2.0));
        }
        assert!(spec.overlays[0]
            .points
            .iter()
            .flatten()
            .all(|v| approx(*v, 2.0)));
        assert_eq!(spec.axis_label, "log10(Price)");
    }

    #[test]
    fn log_transform_inverts_under_pow10() {
        let frame = constant_series(42.5, 4);
        let spec = build_chart(&frame, true);

        for c in &spec.candles {
            assert!(approx(10f64.powf(c.close), 42.5));
        }
    }

    #[test]
    fn undefined_ma_rows_stay_undefined() {
        let frame = constant_series(10.0, 5);
        let spec = build_chart(&frame, true);

        assert_eq!(spec.overlays[0].points[0], None);
        assert_eq!(spec.overlays[0].points[1], None);
        assert!(spec.overlays[0].points[2].is_some());
    }

    #[test]
    fn value_range_covers_wicks_and_overlays() {
        let candles = vec![
            Candle { ts: 0, open: 10.0, high: 15.0, low: 8.0, close: 12.0, volume: 1 },
            Candle { ts: 86400, open: 12.0, high: 13.0, low: 9.0, close: 11.0, volume: 1 },
        ];
        let series = CandleSeries::new("X", Interval::D1, candles);
        let frame = with_moving_averages(&series, &[1]);
        let spec = build_chart(&frame, false);

        let (min, max) = spec.value_range().unwrap();
        assert!(approx(min, 8.0));
        assert!(approx(max, 15.0));
    }

    #[test]
    fn empty_chart_has_no_range() {
        let series = CandleSeries::new("EMPTY", Interval::D1, Vec::new());
        let frame = with_moving_averages(&series, &[3]);
        let spec = build_chart(&frame, false);
        assert!(spec.value_range().is_none());
    }
}
