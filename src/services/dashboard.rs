use crate::chart::{self, ChartSpec};
use crate::config::RequestConfig;
use crate::errors::{ChartHubError, Result};
use crate::indicators::{self, sma::MaSeries};
use crate::models::candle::CandleSeries;
use crate::providers::base::MarketDataProvider;
use crate::render::{self, Term};
use crossterm::event;
use log::{info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// 看盘服务，处理取数、指标计算和渲染的完整流程
pub struct DashboardService {
    config: RequestConfig,
    provider: Arc<dyn MarketDataProvider + Send + Sync>,
}

impl DashboardService {
    /// 创建新的看盘服务实例
    pub fn new(config: RequestConfig, provider: Arc<dyn MarketDataProvider + Send + Sync>) -> Self {
        Self { config, provider }
    }

    /// 执行一次取数和指标计算
    ///
    /// 合法代码但区间内无数据时返回DataError，与网络/上游错误区分。
    pub async fn refresh(&self) -> Result<MaSeries> {
        let candles = self
            .provider
            .fetch_candles(&self.config.symbol, &self.config.range, self.config.interval)
            .await?;

        if candles.is_empty() {
            warn!("No data found for symbol {}", self.config.symbol);
            return Err(ChartHubError::DataError(format!(
                "no data found for symbol {}",
                self.config.symbol
            )));
        }

        let series = CandleSeries::new(&self.config.symbol, self.config.interval, candles);
        info!(
            "Processing {} candles for {}, windows {:?}",
            series.len(),
            series.symbol,
            self.config.windows
        );

        Ok(indicators::with_moving_averages(&series, &self.config.windows))
    }

    /// 单次渲染：取数一次，绘制后等待退出键
    pub async fn run_once(&self) -> Result<()> {
        // 取数失败时尚未进入备用屏幕，错误直接打印到正常终端
        let frame = self.refresh().await?;
        let spec = chart::build_chart(&frame, self.config.log_scale);
        let status = format!(
            "provider {} | interval {} | press q to quit",
            self.provider.provider_code(),
            self.config.interval
        );

        let mut terminal = render::setup_terminal()?;
        let result = show_until_exit(
            &mut terminal,
            &spec,
            &frame,
            self.config.tail_rows,
            &status,
        );
        render::restore_terminal(&mut terminal)?;

        result
    }

    /// 实时刷新循环
    ///
    /// 每个周期重新执行 取数→计算→渲染，随后休眠配置的秒数。
    /// 用户退出或取数出错时循环终止，错误恢复终端后向上传播。
    pub async fn run_live(&self) -> Result<()> {
        let mut terminal = render::setup_terminal()?;
        let result = self.live_loop(&mut terminal).await;
        render::restore_terminal(&mut terminal)?;
        result
    }

    async fn live_loop(&self, terminal: &mut Term) -> Result<()> {
        loop {
            // 每个周期整表重建，上一周期的数据直接丢弃
            let frame = self.refresh().await?;
            let spec = chart::build_chart(&frame, self.config.log_scale);
            let status = format!(
                "provider {} | interval {} | refresh {}s | updated {} | press q to quit",
                self.provider.provider_code(),
                self.config.interval,
                self.config.refresh_secs,
                chrono::Local::now().format("%H:%M:%S")
            );

            let deadline = Instant::now() + Duration::from_secs(self.config.refresh_secs);
            if self.wait_for_tick(terminal, &spec, &frame, &status, deadline)? {
                return Ok(());
            }
        }
    }

    /// 绘制并等待下一个刷新周期，期间轮询退出键。返回true表示用户退出
    fn wait_for_tick(
        &self,
        terminal: &mut Term,
        spec: &ChartSpec,
        frame: &MaSeries,
        status: &str,
        deadline: Instant,
    ) -> Result<bool> {
        loop {
            terminal.draw(|f| {
                render::draw_dashboard(f, spec, frame, self.config.tail_rows, status)
            })?;

            if event::poll(Duration::from_millis(200))? {
                let ev = event::read()?;
                if render::is_exit_event(&ev) {
                    info!("Exit requested, stopping live refresh");
                    return Ok(true);
                }
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }
        }
    }
}

fn show_until_exit(
    terminal: &mut Term,
    spec: &ChartSpec,
    frame: &MaSeries,
    tail_rows: usize,
    status: &str,
) -> Result<()> {
    loop {
        terminal.draw(|f| render::draw_dashboard(f, spec, frame, tail_rows, status))?;

        if event::poll(Duration::from_millis(200))? {
            let ev = event::read()?;
            if render::is_exit_event(&ev) {
                return Ok(());
            }
        }
    }
}
