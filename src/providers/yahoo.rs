use crate::errors::{ChartHubError, Result};
use crate::models::candle::Candle;
use crate::models::range::{FetchRange, Interval};
use crate::providers::base::MarketDataProvider;
use crate::util;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde_json::Value;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance行情数据提供者
pub struct YahooProvider {
    client: Client,
    last_request: Mutex<Option<Instant>>,
}

impl YahooProvider {
    /// 创建新的Yahoo行情提供者
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ChartHubError::RequestError)?;

        Ok(Self {
            client,
            last_request: Mutex::new(None),
        })
    }

    /// 等待请求频率限制
    async fn wait_for_rate_limit(&self) {
        const MIN_INTERVAL: Duration = Duration::from_millis(500);

        let now = Instant::now();
        let should_wait = {
            let mut last = self.last_request.lock().unwrap();
            let should_wait = if let Some(instant) = *last {
                let elapsed = instant.elapsed();
                if elapsed < MIN_INTERVAL {
                    Some(MIN_INTERVAL - elapsed)
                } else {
                    None
                }
            } else {
                None
            };
            *last = Some(now);
            should_wait
        };

        if let Some(wait_time) = should_wait {
            debug!("等待 {:?} 以遵守频率限制", wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn provider_code(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        range: &FetchRange,
        interval: Interval,
    ) -> Result<Vec<Candle>> {
        info!("获取 {} 的K线数据, {}, interval {}", symbol, range, interval);

        // 限制请求频率
        self.wait_for_rate_limit().await;

        let mut query: Vec<(&str, String)> = vec![
            ("interval", interval.as_str().to_string()),
            ("includePrePost", "false".to_string()),
        ];
        match range {
            FetchRange::Period(p) => {
                query.push(("range", p.as_str().to_string()));
            }
            FetchRange::Dates { start, end } => {
                query.push(("period1", util::date_to_epoch(*start).to_string()));
                query.push(("period2", util::date_to_epoch(*end).to_string()));
            }
        }

        let response = self
            .client
            .get(format!("{}/{}", CHART_URL, symbol))
            .query(&query)
            .header("User-Agent", "Mozilla/5.0 (compatible; ChartHub/1.0)")
            .send()
            .await
            .map_err(ChartHubError::RequestError)?;

        let text = response.text().await?;
        debug!("成功获取响应");

        let json: Value = serde_json::from_str(&text)?;

        let candles = parse_chart_payload(&json, symbol)?;
        info!("获取到 {} 条K线记录", candles.len());

        Ok(candles)
    }
}

/// 解析chart接口返回的JSON数据
///
/// 未知代码（上游返回Not Found）返回空向量，其他错误原样上报。
/// OHLC任一字段为null的行会被跳过，输出按时间升序且时间戳唯一。
pub fn parse_chart_payload(json: &Value, symbol: &str) -> Result<Vec<Candle>> {
    let chart = json
        .get("chart")
        .ok_or_else(|| ChartHubError::ProviderError("missing 'chart' node".to_string()))?;

    // 上游错误节点：未知代码与硬错误区分开
    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let code = err.get("code").and_then(|c| c.as_str()).unwrap_or("Unknown");
        let description = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("no description");

        if code == "Not Found" {
            info!("未找到 {} 的数据: {}", symbol, description);
            return Ok(Vec::new());
        }

        return Err(ChartHubError::ProviderError(format!(
            "{}: {}",
            code, description
        )));
    }

    let result = match chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
    {
        Some(r) => r,
        None => return Ok(Vec::new()),
    };

    // 无数据时上游不返回timestamp字段
    let timestamps = match result.get("timestamp").and_then(|t| t.as_array()) {
        Some(t) => t,
        None => return Ok(Vec::new()),
    };

    let quote = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .ok_or_else(|| ChartHubError::ProviderError("missing quote data".to_string()))?;

    let opens = quote.get("open").and_then(|v| v.as_array());
    let highs = quote.get("high").and_then(|v| v.as_array());
    let lows = quote.get("low").and_then(|v| v.as_array());
    let closes = quote.get("close").and_then(|v| v.as_array());
    let volumes = quote.get("volume").and_then(|v| v.as_array());

    let (opens, highs, lows, closes) = match (opens, highs, lows, closes) {
        (Some(o), Some(h), Some(l), Some(c)) => (o, h, l, c),
        _ => {
            return Err(ChartHubError::ProviderError(
                "missing OHLC arrays in quote data".to_string(),
            ))
        }
    };

    let mut candles = Vec::new();

    for (i, ts) in timestamps.iter().enumerate() {
        let ts = match ts.as_i64() {
            Some(ts) => ts,
            None => continue,
        };

        // OHLC任一字段为null则跳过该行
        let row = (
            opens.get(i).and_then(|v| v.as_f64()),
            highs.get(i).and_then(|v| v.as_f64()),
            lows.get(i).and_then(|v| v.as_f64()),
            closes.get(i).and_then(|v| v.as_f64()),
        );

        if let (Some(open), Some(high), Some(low), Some(close)) = row {
            let volume = volumes
                .and_then(|v| v.get(i))
                .and_then(|v| v.as_i64())
                .unwrap_or_default();

            candles.push(Candle {
                ts,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }

    // 按时间升序排序并去重
    candles.sort_by_key(|c| c.ts);
    candles.dedup_by_key(|c| c.ts);

    Ok(candles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(timestamps: Value, quote: Value) -> Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL" },
                    "timestamp": timestamps,
                    "indicators": { "quote": [quote] }
                }],
                "error": null
            }
        })
    }

    #[test]
    fn parses_plain_payload() {
        let json = payload(
            json!([100, 200]),
            json!({
                "open": [1.0, 2.0],
                "high": [1.5, 2.5],
                "low": [0.5, 1.5],
                "close": [1.2, 2.2],
                "volume": [10, 20]
            }),
        );

        let candles = parse_chart_payload(&json, "AAPL").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].ts, 100);
        assert_eq!(candles[1].close, 2.2);
        assert_eq!(candles[1].volume, 20);
    }

    #[test]
    fn skips_rows_with_null_prices() {
        let json = payload(
            json!([100, 200, 300]),
            json!({
                "open": [1.0, null, 3.0],
                "high": [1.5, 2.5, 3.5],
                "low": [0.5, 1.5, 2.5],
                "close": [1.2, 2.2, 3.2],
                "volume": [10, null, 30]
            }),
        );

        let candles = parse_chart_payload(&json, "AAPL").unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].ts, 100);
        assert_eq!(candles[1].ts, 300);
    }

    #[test]
    fn null_volume_defaults_to_zero() {
        let json = payload(
            json!([100]),
            json!({
                "open": [1.0],
                "high": [1.5],
                "low": [0.5],
                "close": [1.2],
                "volume": [null]
            }),
        );

        let candles = parse_chart_payload(&json, "AAPL").unwrap();
        assert_eq!(candles[0].volume, 0);
    }

    #[test]
    fn output_sorted_and_unique() {
        let json = payload(
            json!([300, 100, 300, 200]),
            json!({
                "open": [3.0, 1.0, 3.0, 2.0],
                "high": [3.5, 1.5, 3.5, 2.5],
                "low": [2.5, 0.5, 2.5, 1.5],
                "close": [3.2, 1.2, 3.2, 2.2],
                "volume": [30, 10, 30, 20]
            }),
        );

        let candles = parse_chart_payload(&json, "AAPL").unwrap();
        let ts: Vec<i64> = candles.iter().map(|c| c.ts).collect();
        assert_eq!(ts, vec![100, 200, 300]);
    }

    #[test]
    fn unknown_symbol_yields_empty_series() {
        let json = json!({
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        });

        let candles = parse_chart_payload(&json, "NOSUCHTICKER").unwrap();
        assert!(candles.is_empty());
    }

    #[test]
    fn hard_provider_error_propagates() {
        let json = json!({
            "chart": {
                "result": null,
                "error": {
                    "code": "Bad Request",
                    "description": "Invalid interval"
                }
            }
        });

        let err = parse_chart_payload(&json, "AAPL").unwrap_err();
        assert!(matches!(err, ChartHubError::ProviderError(_)));
    }

    #[test]
    fn empty_result_is_empty_series() {
        let json = json!({ "chart": { "result": [], "error": null } });
        assert!(parse_chart_payload(&json, "AAPL").unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_an_error() {
        let json = json!({ "finance": {} });
        assert!(parse_chart_payload(&json, "AAPL").is_err());
    }
}
