use log::warn;

use crate::errors::{ChartHubError, Result};
use crate::models::range::{FetchRange, Interval, Period};
use crate::util;

/// 刷新间隔允许范围（秒）
pub const MIN_REFRESH_SECS: u64 = 10;
pub const MAX_REFRESH_SECS: u64 = 3600;

/// 默认移动平均线窗口
pub const DEFAULT_WINDOWS: [usize; 3] = [10, 50, 100];

/// 单次请求的完整配置
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub symbol: String,
    pub range: FetchRange,
    pub interval: Interval,
    pub windows: Vec<usize>,
    pub log_scale: bool,
    pub live: bool,
    pub refresh_secs: u64,
    pub tail_rows: usize,
}

impl RequestConfig {
    pub fn new(symbol: &str, range: FetchRange) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            range,
            interval: Interval::D1,
            windows: DEFAULT_WINDOWS.to_vec(),
            log_scale: false,
            live: false,
            refresh_secs: 60,
            tail_rows: 10,
        }
    }

    pub fn with_interval(mut self, interval: Interval) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_windows(mut self, windows: Vec<usize>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_log_scale(mut self, log_scale: bool) -> Self {
        self.log_scale = log_scale;
        self
    }

    pub fn with_live(mut self, live: bool) -> Self {
        self.live = live;
        self
    }

    pub fn with_refresh_secs(mut self, refresh_secs: u64) -> Self {
        self.refresh_secs = refresh_secs;
        self
    }

    pub fn with_tail_rows(mut self, tail_rows: usize) -> Self {
        self.tail_rows = tail_rows;
        self
    }

    /// 发起任何网络请求前的配置检查
    pub fn validate(&self) -> Result<()> {
        if self.symbol.is_empty() {
            return Err(ChartHubError::ConfigError(
                "ticker symbol must not be empty".to_string(),
            ));
        }

        if let FetchRange::Dates { start, end } = &self.range {
            if start >= end {
                return Err(ChartHubError::ConfigError(format!(
                    "start date {} must be before end date {}",
                    start, end
                )));
            }
        }

        if self.windows.is_empty() {
            return Err(ChartHubError::ConfigError(
                "at least one moving average window is required".to_string(),
            ));
        }
        if self.windows.iter().any(|w| *w == 0) {
            return Err(ChartHubError::ConfigError(
                "moving average windows must be positive".to_string(),
            ));
        }

        if self.live && !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&self.refresh_secs) {
            return Err(ChartHubError::ConfigError(format!(
                "refresh interval {}s out of range [{}, {}]",
                self.refresh_secs, MIN_REFRESH_SECS, MAX_REFRESH_SECS
            )));
        }

        // 上游对日内粒度只保留最近约60天
        if self.interval.is_intraday() && self.range.approx_days() > 60 {
            warn!(
                "interval {} 为日内粒度，上游仅保留最近约60天，区间 {} 可能被截断",
                self.interval, self.range
            );
        }

        Ok(())
    }
}

/// 从命令行选项构造取数区间，区间和起止日期二选一
pub fn range_from_options(
    period: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<FetchRange> {
    if period.is_some() && (start.is_some() || end.is_some()) {
        return Err(ChartHubError::ConfigError(
            "use either --period or --start/--end, not both".to_string(),
        ));
    }

    match (start, end) {
        (Some(s), Some(e)) => Ok(FetchRange::Dates {
            start: util::parse_date(s)?,
            end: util::parse_date(e)?,
        }),
        (Some(_), None) | (None, Some(_)) => Err(ChartHubError::ConfigError(
            "date range requires both --start and --end".to_string(),
        )),
        (None, None) => {
            let p = period.unwrap_or("1mo").parse::<Period>()?;
            Ok(FetchRange::Period(p))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn base_config() -> RequestConfig {
        RequestConfig::new("AAPL", FetchRange::Period(Period::Y1))
    }

    #[test]
    fn valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn empty_symbol_rejected_before_fetch() {
        let config = RequestConfig::new("   ", FetchRange::Period(Period::Y1));
        assert!(matches!(
            config.validate(),
            Err(ChartHubError::ConfigError(_))
        ));
    }

    #[test]
    fn symbol_is_normalized() {
        let config = RequestConfig::new(" aapl ", FetchRange::Period(Period::Y1));
        assert_eq!(config.symbol, "AAPL");
    }

    #[test]
    fn inverted_date_range_rejected() {
        let config = RequestConfig::new(
            "AAPL",
            FetchRange::Dates {
                start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn equal_dates_rejected() {
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let config = RequestConfig::new("AAPL", FetchRange::Dates { start: day, end: day });
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let config = base_config().with_windows(vec![10, 0]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_windows_rejected() {
        let config = base_config().with_windows(Vec::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn refresh_bounds_checked_in_live_mode() {
        assert!(base_config()
            .with_live(true)
            .with_refresh_secs(5)
            .validate()
            .is_err());
        assert!(base_config()
            .with_live(true)
            .with_refresh_secs(4000)
            .validate()
            .is_err());
        assert!(base_config()
            .with_live(true)
            .with_refresh_secs(10)
            .validate()
            .is_ok());
    }

    #[test]
    fn refresh_ignored_when_not_live() {
        assert!(base_config().with_refresh_secs(5).validate().is_ok());
    }

    #[test]
    fn range_from_period_token() {
        let range = range_from_options(Some("6mo"), None, None).unwrap();
        assert_eq!(range, FetchRange::Period(Period::Mo6));
    }

    #[test]
    fn range_defaults_to_one_month() {
        let range = range_from_options(None, None, None).unwrap();
        assert_eq!(range, FetchRange::Period(Period::Mo1));
    }

    #[test]
    fn range_rejects_missing_bound() {
        assert!(range_from_options(None, Some("2024-01-01"), None).is_err());
        assert!(range_from_options(None, None, Some("2024-06-01")).is_err());
    }

    #[test]
    fn range_rejects_period_and_dates_together() {
        assert!(range_from_options(Some("1y"), Some("2024-01-01"), Some("2024-06-01")).is_err());
    }
}
