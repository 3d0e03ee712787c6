use std::io;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Widget};
use ratatui::{Frame, Terminal};

use crate::chart::ChartSpec;
use crate::errors::Result;
use crate::indicators::sma::MaSeries;
use crate::models::candle::CandleSeries;
use crate::util;

/// 均线叠加配色，按列循环使用
pub const OVERLAY_COLORS: [Color; 3] = [Color::Blue, Color::Rgb(255, 165, 0), Color::Green];

/// 价格坐标轴标签占用的列数
const AXIS_GUTTER: u16 = 10;

pub type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// 进入备用屏幕并开启raw模式
pub fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// 恢复终端状态
pub fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// q、Esc或Ctrl-C视为退出
pub fn is_exit_event(event: &Event) -> bool {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        },
        _ => false,
    }
}

/// 结果区顶部的指标行
#[derive(Debug, Clone)]
pub struct Metrics {
    pub last_close: f64,
    pub change: Option<f64>,
    pub change_pct: Option<f64>,
    pub high: f64,
    pub low: f64,
    pub last_volume: i64,
    pub rows: usize,
}

impl Metrics {
    /// 从原始K线序列计算指标，空序列返回None
    pub fn from_series(series: &CandleSeries) -> Option<Self> {
        let last = series.last()?;

        let mut high = f64::NEG_INFINITY;
        let mut low = f64::INFINITY;
        for c in &series.candles {
            high = high.max(c.high);
            low = low.min(c.low);
        }

        // 与前一收盘价比较，只有一行时没有涨跌
        let len = series.len();
        let (change, change_pct) = if len >= 2 {
            let prev = series.candles[len - 2].close;
            let change = last.close - prev;
            let pct = if prev != 0.0 {
                Some(change / prev * 100.0)
            } else {
                None
            };
            (Some(change), pct)
        } else {
            (None, None)
        };

        Some(Self {
            last_close: last.close,
            change,
            change_pct,
            high,
            low,
            last_volume: last.volume,
            rows: len,
        })
    }
}

/// 蜡烛图部件：每根蜡烛一列，均线以圆点叠加
pub struct CandlestickChart<'a> {
    spec: &'a ChartSpec,
}

impl<'a> CandlestickChart<'a> {
    pub fn new(spec: &'a ChartSpec) -> Self {
        Self { spec }
    }
}

impl Widget for CandlestickChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.spec.candles.is_empty() || area.width <= AXIS_GUTTER + 1 || area.height < 2 {
            return;
        }
        let (y_min, y_max) = match self.spec.value_range() {
            Some(range) => range,
            None => return,
        };

        let height = area.height as i32;
        let span = (y_max - y_min).max(1e-9);
        let chart_x = area.x + AXIS_GUTTER;
        let chart_width = (area.width - AXIS_GUTTER) as usize;

        let map_price_to_row = |price: f64| -> i32 {
            let ratio = ((price - y_min) / span).clamp(0.0, 1.0);
            let rel = (ratio * (height as f64 - 1.0)).round() as i32;
            (area.y as i32 + (height - 1)) - rel
        };

        let row_min = area.y as i32;
        let row_max = area.y as i32 + height - 1;

        // 网格线和价格标签
        let grid_lines = 4;
        for i in 0..=grid_lines {
            let price = y_min + span * i as f64 / grid_lines as f64;
            let row = map_price_to_row(price).clamp(row_min, row_max) as u16;

            let label = format!("{:>9.2}", price);
            for (j, ch) in label.chars().enumerate() {
                if (j as u16) < AXIS_GUTTER {
                    if let Some(cell) = buf.cell_mut((area.x + j as u16, row)) {
                        cell.set_char(ch).set_fg(Color::Gray);
                    }
                }
            }

            for x in chart_x..(area.x + area.width) {
                if let Some(cell) = buf.cell_mut((x, row)) {
                    if cell.symbol() == " " {
                        cell.set_symbol("─").set_fg(Color::DarkGray);
                    }
                }
            }
        }

        // 蜡烛（影线+实体），每根一列，最新的靠右
        let n = self.spec.candles.len().min(chart_width);
        let start = self.spec.candles.len() - n;

        for (i, c) in self.spec.candles[start..].iter().enumerate() {
            let x = chart_x + i as u16;

            let color = if c.close >= c.open {
                Color::Green
            } else {
                Color::Red
            };

            let low_row = map_price_to_row(c.low);
            let high_row = map_price_to_row(c.high);
            let open_row = map_price_to_row(c.open);
            let close_row = map_price_to_row(c.close);

            let wick_start = low_row.min(high_row).max(row_min);
            let wick_end = low_row.max(high_row).min(row_max);
            let body_start = open_row.min(close_row).max(row_min);
            let body_end = open_row.max(close_row).min(row_max);

            for y in wick_start..=wick_end {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("│").set_fg(color);
                }
            }
            for y in body_start..=body_end {
                if let Some(cell) = buf.cell_mut((x, y as u16)) {
                    cell.set_symbol("█").set_fg(color);
                }
            }
        }

        // 均线叠加，画在蜡烛之上
        for (k, line) in self.spec.overlays.iter().enumerate() {
            let color = OVERLAY_COLORS[k % OVERLAY_COLORS.len()];
            for i in 0..n {
                if let Some(v) = line.points.get(start + i).copied().flatten() {
                    let row = map_price_to_row(v).clamp(row_min, row_max);
                    if let Some(cell) = buf.cell_mut((chart_x + i as u16, row as u16)) {
                        cell.set_symbol("•").set_fg(color);
                    }
                }
            }
        }
    }
}

/// 绘制完整的看盘界面：指标行、蜡烛图、数据预览和状态栏
pub fn draw_dashboard(
    f: &mut Frame,
    spec: &ChartSpec,
    frame_data: &MaSeries,
    tail_rows: usize,
    status: &str,
) {
    let preview_height = (tail_rows.min(frame_data.series.len()) as u16).saturating_add(3);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(preview_height),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_metrics(f, chunks[0], spec, frame_data);
    draw_chart(f, chunks[1], spec, frame_data);
    draw_preview(f, chunks[2], frame_data, tail_rows);
    draw_status(f, chunks[3], status);
}

fn draw_metrics(f: &mut Frame, area: Rect, spec: &ChartSpec, frame_data: &MaSeries) {
    let series = &frame_data.series;

    let metrics_line = match Metrics::from_series(series) {
        Some(m) => {
            let (change_text, change_color) = match (m.change, m.change_pct) {
                (Some(change), Some(pct)) => (
                    format!("{:+.2} ({:+.2}%)", change, pct),
                    if change >= 0.0 { Color::Green } else { Color::Red },
                ),
                (Some(change), None) => (
                    format!("{:+.2}", change),
                    if change >= 0.0 { Color::Green } else { Color::Red },
                ),
                _ => ("--".to_string(), Color::Gray),
            };

            Line::from(vec![
                Span::styled("last ", Style::default().fg(Color::Gray)),
                Span::styled(
                    format!("{:.2}", m.last_close),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(change_text, Style::default().fg(change_color)),
                Span::raw("  "),
                Span::styled("high ", Style::default().fg(Color::Gray)),
                Span::raw(format!("{:.2}", m.high)),
                Span::raw("  "),
                Span::styled("low ", Style::default().fg(Color::Gray)),
                Span::raw(format!("{:.2}", m.low)),
                Span::raw("  "),
                Span::styled("vol ", Style::default().fg(Color::Gray)),
                Span::raw(util::format_volume(m.last_volume)),
                Span::raw("  "),
                Span::styled("rows ", Style::default().fg(Color::Gray)),
                Span::raw(m.rows.to_string()),
            ])
        }
        None => Line::from("no data"),
    };

    // 均线图例和坐标说明
    let mut legend: Vec<Span> = Vec::new();
    for (k, col) in frame_data.columns.iter().enumerate() {
        if k > 0 {
            legend.push(Span::raw("  "));
        }
        legend.push(Span::styled(
            format!("• {}", col.label),
            Style::default().fg(OVERLAY_COLORS[k % OVERLAY_COLORS.len()]),
        ));
    }
    legend.push(Span::raw("  "));
    legend.push(Span::styled(
        format!("axis: {}", spec.axis_label),
        Style::default().fg(Color::Gray),
    ));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ({}) ", series.symbol, series.interval));
    let paragraph = Paragraph::new(vec![metrics_line, Line::from(legend)]).block(block);
    f.render_widget(paragraph, area);
}

fn draw_chart(f: &mut Frame, area: Rect, spec: &ChartSpec, frame_data: &MaSeries) {
    let intraday = frame_data.series.interval.is_intraday();
    let time_range = match (frame_data.series.first(), frame_data.series.last()) {
        (Some(first), Some(last)) => format!(
            " {} .. {} ",
            util::epoch_to_label(first.ts, intraday),
            util::epoch_to_label(last.ts, intraday)
        ),
        _ => String::new(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", spec.title))
        .title_bottom(Line::from(time_range).right_aligned());
    let inner = block.inner(area);
    f.render_widget(block, area);
    f.render_widget(CandlestickChart::new(spec), inner);
}

fn draw_preview(f: &mut Frame, area: Rect, frame_data: &MaSeries, tail_rows: usize) {
    let series = &frame_data.series;
    let intraday = series.interval.is_intraday();

    let total = series.len();
    let take = tail_rows.min(total);
    let start = total - take;

    let mut header: Vec<String> = ["Date", "Open", "High", "Low", "Close", "Volume"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(frame_data.columns.iter().map(|c| c.label.clone()));

    let rows: Vec<Row> = (start..total)
        .map(|i| {
            let c = &series.candles[i];
            let mut cells = vec![
                util::epoch_to_label(c.ts, intraday),
                format!("{:.2}", c.open),
                format!("{:.2}", c.high),
                format!("{:.2}", c.low),
                format!("{:.2}", c.close),
                util::format_volume(c.volume),
            ];
            for col in &frame_data.columns {
                cells.push(
                    col.values
                        .get(i)
                        .copied()
                        .flatten()
                        .map(|v| format!("{:.2}", v))
                        .unwrap_or_else(|| "-".to_string()),
                );
            }
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![Constraint::Length(17)];
    widths.extend(std::iter::repeat(Constraint::Length(10)).take(header.len() - 1));

    let table = Table::new(rows, widths)
        .header(Row::new(header).style(Style::default().add_modifier(Modifier::BOLD)))
        .column_spacing(1)
        .block(Block::default().borders(Borders::ALL).title(" Recent Data "));
    f.render_widget(table, area);
}

fn draw_status(f: &mut Frame, area: Rect, status: &str) {
    let paragraph = Paragraph::new(Line::from(Span::styled(
        status,
        Style::default().fg(Color::Gray),
    )));
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candle::Candle;
    use crate::models::range::Interval;

    fn series(closes: &[f64]) -> CandleSeries {
        let candles = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                ts: i as i64 * 86400,
                open: close - 0.5,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: (i as i64 + 1) * 100,
            })
            .collect();
        CandleSeries::new("TEST", Interval::D1, candles)
    }

    #[test]
    fn metrics_from_series() {
        let m = Metrics::from_series(&series(&[10.0, 12.0, 11.0])).unwrap();

        assert_eq!(m.rows, 3);
        assert!((m.last_close - 11.0).abs() < 1e-9);
        assert!((m.change.unwrap() + 1.0).abs() < 1e-9);
        assert!((m.change_pct.unwrap() + 100.0 / 12.0).abs() < 1e-6);
        assert!((m.high - 13.0).abs() < 1e-9);
        assert!((m.low - 9.0).abs() < 1e-9);
        assert_eq!(m.last_volume, 300);
    }

    #[test]
    fn metrics_single_row_has_no_change() {
        let m = Metrics::from_series(&series(&[10.0])).unwrap();
        assert_eq!(m.change, None);
        assert_eq!(m.change_pct, None);
    }

    #[test]
    fn metrics_empty_series_is_none() {
        assert!(Metrics::from_series(&series(&[])).is_none());
    }

    #[test]
    fn exit_keys() {
        use crossterm::event::KeyEvent;

        let q = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        let esc = Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        let plain_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE));

        assert!(is_exit_event(&q));
        assert!(is_exit_event(&esc));
        assert!(is_exit_event(&ctrl_c));
        assert!(!is_exit_event(&plain_c));
    }
}
