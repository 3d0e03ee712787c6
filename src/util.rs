use chrono::{DateTime, NaiveDate, NaiveTime};

use crate::errors::Result;

// 日期转换工具
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str, "%Y-%m-%d")?)
}

/// 日期转换为当日零点的UTC秒级时间戳
pub fn date_to_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// 时间戳格式化为坐标轴/表格标签，日内粒度带时分
pub fn epoch_to_label(ts: i64, intraday: bool) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) if intraday => dt.format("%Y-%m-%d %H:%M").to_string(),
        Some(dt) => dt.format("%Y-%m-%d").to_string(),
        None => ts.to_string(),
    }
}

// 成交量缩写，用于指标行和数据预览
pub fn format_volume(volume: i64) -> String {
    let v = volume as f64;
    if v.abs() >= 1e9 {
        format!("{:.2}B", v / 1e9)
    } else if v.abs() >= 1e6 {
        format!("{:.2}M", v / 1e6)
    } else if v.abs() >= 1e3 {
        format!("{:.2}K", v / 1e3)
    } else {
        volume.to_string()
    }
}
