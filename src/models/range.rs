use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::ChartHubError;

/// 相对回看区间，对应行情接口的range参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Period {
    D1,
    D5,
    Mo1,
    Mo3,
    Mo6,
    Y1,
    Y2,
    Y5,
    Y10,
    Ytd,
    Max,
}

impl Period {
    pub const ALL: [Period; 11] = [
        Period::D1,
        Period::D5,
        Period::Mo1,
        Period::Mo3,
        Period::Mo6,
        Period::Y1,
        Period::Y2,
        Period::Y5,
        Period::Y10,
        Period::Ytd,
        Period::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::D1 => "1d",
            Period::D5 => "5d",
            Period::Mo1 => "1mo",
            Period::Mo3 => "3mo",
            Period::Mo6 => "6mo",
            Period::Y1 => "1y",
            Period::Y2 => "2y",
            Period::Y5 => "5y",
            Period::Y10 => "10y",
            Period::Ytd => "ytd",
            Period::Max => "max",
        }
    }

    /// 区间对应的大致自然日天数，用于配置检查
    pub fn approx_days(&self) -> i64 {
        match self {
            Period::D1 => 1,
            Period::D5 => 5,
            Period::Mo1 => 30,
            Period::Mo3 => 90,
            Period::Mo6 => 180,
            Period::Y1 => 365,
            Period::Y2 => 730,
            Period::Y5 => 1825,
            Period::Y10 => 3650,
            Period::Ytd => 365,
            Period::Max => 36500,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ChartHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ChartHubError::ConfigError(format!(
                    "unknown period '{}', valid: 1d,5d,1mo,3mo,6mo,1y,2y,5y,10y,ytd,max",
                    s
                ))
            })
    }
}

/// 数据采样粒度，对应行情接口的interval参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interval {
    M1,
    M2,
    M5,
    M15,
    M30,
    M60,
    M90,
    H1,
    D1,
    D5,
    Wk1,
    Mo1,
    Mo3,
}

impl Interval {
    pub const ALL: [Interval; 13] = [
        Interval::M1,
        Interval::M2,
        Interval::M5,
        Interval::M15,
        Interval::M30,
        Interval::M60,
        Interval::M90,
        Interval::H1,
        Interval::D1,
        Interval::D5,
        Interval::Wk1,
        Interval::Mo1,
        Interval::Mo3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::M1 => "1m",
            Interval::M2 => "2m",
            Interval::M5 => "5m",
            Interval::M15 => "15m",
            Interval::M30 => "30m",
            Interval::M60 => "60m",
            Interval::M90 => "90m",
            Interval::H1 => "1h",
            Interval::D1 => "1d",
            Interval::D5 => "5d",
            Interval::Wk1 => "1wk",
            Interval::Mo1 => "1mo",
            Interval::Mo3 => "3mo",
        }
    }

    /// 日内粒度在上游只保留最近约60天
    pub fn is_intraday(&self) -> bool {
        matches!(
            self,
            Interval::M1
                | Interval::M2
                | Interval::M5
                | Interval::M15
                | Interval::M30
                | Interval::M60
                | Interval::M90
                | Interval::H1
        )
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ChartHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interval::ALL
            .iter()
            .find(|i| i.as_str() == s)
            .copied()
            .ok_or_else(|| {
                ChartHubError::ConfigError(format!(
                    "unknown interval '{}', valid: 1m,2m,5m,15m,30m,60m,90m,1h,1d,5d,1wk,1mo,3mo",
                    s
                ))
            })
    }
}

/// 取数区间：相对回看区间和起止日期二选一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRange {
    Period(Period),
    Dates { start: NaiveDate, end: NaiveDate },
}

impl FetchRange {
    /// 区间覆盖的大致自然日天数
    pub fn approx_days(&self) -> i64 {
        match self {
            FetchRange::Period(p) => p.approx_days(),
            FetchRange::Dates { start, end } => (*end - *start).num_days(),
        }
    }
}

impl fmt::Display for FetchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchRange::Period(p) => write!(f, "period {}", p),
            FetchRange::Dates { start, end } => write!(f, "{} .. {}", start, end),
        }
    }
}
