use serde::Serialize;

use crate::models::candle::CandleSeries;

/// 单条移动平均线，与K线序列逐行对齐
#[derive(Debug, Clone, Serialize)]
pub struct MaColumn {
    pub window: usize,
    pub label: String,
    /// 前window-1行没有足够的观测值，为None
    pub values: Vec<Option<f64>>,
}

/// K线序列加上派生的移动平均线列
#[derive(Debug, Clone, Serialize)]
pub struct MaSeries {
    pub series: CandleSeries,
    pub columns: Vec<MaColumn>,
}

impl MaSeries {
    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }
}

/// 收盘价的简单移动平均
///
/// 返回与输入逐行对齐的向量：第i行为前window个收盘价（含第i行）的
/// 算术平均值，观测值不足window个的行为None。window为0时全部为None。
pub fn moving_average(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut values = vec![None; closes.len()];

    if window == 0 || closes.len() < window {
        return values;
    }

    // 滚动窗口求和，避免每行重新累加
    let mut sum: f64 = closes[..window].iter().sum();
    values[window - 1] = Some(sum / window as f64);

    for i in window..closes.len() {
        sum += closes[i] - closes[i - window];
        values[i] = Some(sum / window as f64);
    }

    values
}

/// 为K线序列计算一组移动平均线列
///
/// 输入序列不会被修改，返回值持有自己的拷贝。
pub fn with_moving_averages(series: &CandleSeries, windows: &[usize]) -> MaSeries {
    let closes = series.closes();

    let columns = windows
        .iter()
        .map(|&window| MaColumn {
            window,
            label: format!("MA{}", window),
            values: moving_average(&closes, window),
        })
        .collect();

    MaSeries {
        series: series.clone(),
        columns,
    }
}
