use chrono::{DateTime, Datelike, Days, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;
use thiserror::Error;

/// # Summary
/// 交易时间检查错误。
#[derive(Error, Debug)]
pub enum ClockError {
    /// 交易时段字符串格式非法（期望 "HH:MM-HH:MM"）
    #[error("Invalid trading window: {0}")]
    InvalidWindow(String),

    /// 时区名称无法识别
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),
}

/// 单个盘中交易时段，左闭右开 [open, close)
#[derive(Debug, Clone)]
struct Window {
    open: NaiveTime,
    close: NaiveTime,
    raw: String,
}

/// # Summary
/// 交易时间检查器。回答两个问题：当前时刻是否可交易、下一个开盘时刻是什么。
///
/// # Invariants
/// - `enabled = false` 时 `is_trading` 恒为 true。
/// - 周六、周日一律视为非交易日。
/// - 时段判定在配置的时区下进行，与宿主机时区无关。
#[derive(Debug, Clone)]
pub struct TradingClock {
    enabled: bool,
    windows: Vec<Window>,
    tz: Tz,
}

/// 交易时间状态快照，用于运维展示
#[derive(Debug, Clone, Serialize)]
pub struct TradingStatus {
    pub is_trading_day: bool,
    pub is_trading_time: bool,
    /// 下一个开盘时刻（配置时区的本地时间），已在交易中或检查禁用时为 None
    pub next_trading_time: Option<String>,
    /// 当前命中的交易时段
    pub current_window: Option<String>,
}

impl TradingClock {
    /// # Summary
    /// 从配置构建检查器。
    ///
    /// # Logic
    /// 1. 解析时区名称（如 "Asia/Shanghai"）。
    /// 2. 逐个解析 "HH:MM-HH:MM" 时段字符串，open >= close 视为非法。
    /// 3. 按开盘时间排序，便于计算下一开盘时刻。
    ///
    /// # Arguments
    /// * `enabled` - 是否启用交易时间检查。
    /// * `windows` - 盘中时段列表。
    /// * `timezone` - IANA 时区名。
    ///
    /// # Returns
    /// * 构建好的 `TradingClock`，任一时段或时区非法返回 `ClockError`。
    pub fn new(enabled: bool, windows: &[String], timezone: &str) -> Result<Self, ClockError> {
        let tz: Tz = timezone
            .parse()
            .map_err(|_| ClockError::InvalidTimezone(timezone.to_string()))?;

        let mut parsed = Vec::with_capacity(windows.len());
        for raw in windows {
            let (open_str, close_str) = raw
                .split_once('-')
                .ok_or_else(|| ClockError::InvalidWindow(raw.clone()))?;
            let open = NaiveTime::parse_from_str(open_str.trim(), "%H:%M")
                .map_err(|_| ClockError::InvalidWindow(raw.clone()))?;
            let close = NaiveTime::parse_from_str(close_str.trim(), "%H:%M")
                .map_err(|_| ClockError::InvalidWindow(raw.clone()))?;
            if open >= close {
                return Err(ClockError::InvalidWindow(raw.clone()));
            }
            parsed.push(Window {
                open,
                close,
                raw: raw.clone(),
            });
        }
        parsed.sort_by_key(|w| w.open);

        Ok(Self {
            enabled,
            windows: parsed,
            tz,
        })
    }

    /// 当前时刻是否处于交易时段
    pub fn is_trading(&self, t: DateTime<Utc>) -> bool {
        if !self.enabled {
            return true;
        }
        let local = t.with_timezone(&self.tz);
        if is_weekend(local.weekday()) {
            return false;
        }
        let tod = local.time();
        self.windows
            .iter()
            .any(|w| tod >= w.open && tod < w.close)
    }

    /// # Summary
    /// 生成交易时间状态快照。
    ///
    /// # Logic
    /// 1. 检查禁用时，恒报告可交易。
    /// 2. 否则按配置时区计算交易日、命中的时段与下一开盘时刻。
    pub fn status(&self, t: DateTime<Utc>) -> TradingStatus {
        if !self.enabled {
            return TradingStatus {
                is_trading_day: true,
                is_trading_time: true,
                next_trading_time: None,
                current_window: None,
            };
        }

        let local = t.with_timezone(&self.tz);
        let is_trading_day = !is_weekend(local.weekday());
        let tod = local.time();
        let current_window = if is_trading_day {
            self.windows
                .iter()
                .find(|w| tod >= w.open && tod < w.close)
                .map(|w| w.raw.clone())
        } else {
            None
        };
        let is_trading_time = current_window.is_some();

        let next_trading_time = if is_trading_time {
            None
        } else {
            self.next_open(t)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        };

        TradingStatus {
            is_trading_day,
            is_trading_time,
            next_trading_time,
            current_window,
        }
    }

    /// 下一个开盘时刻（配置时区的本地时间）
    fn next_open(&self, t: DateTime<Utc>) -> Option<DateTime<Tz>> {
        if self.windows.is_empty() {
            return None;
        }
        let local = t.with_timezone(&self.tz);
        // 向后最多扫描两周，足以跨过任意周末
        for day_offset in 0..14u64 {
            let date = local.date_naive().checked_add_days(Days::new(day_offset))?;
            if is_weekend(date.weekday()) {
                continue;
            }
            for w in &self.windows {
                let candidate = date.and_time(w.open);
                if day_offset == 0 && candidate <= local.naive_local() {
                    continue;
                }
                if let Some(dt) = self.tz.from_local_datetime(&candidate).single() {
                    return Some(dt);
                }
            }
        }
        None
    }
}

fn is_weekend(day: Weekday) -> bool {
    matches!(day, Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_share_clock(enabled: bool) -> TradingClock {
        TradingClock::new(
            enabled,
            &["09:30-11:30".to_string(), "13:00-15:00".to_string()],
            "Asia/Shanghai",
        )
        .unwrap()
    }

    // 2026-07-27 是周一
    fn shanghai_instant(h: u32, m: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Shanghai
            .with_ymd_and_hms(2026, 7, 27, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn disabled_clock_always_trades() {
        let clock = a_share_clock(false);
        assert!(clock.is_trading(shanghai_instant(3, 0)));
        let status = clock.status(shanghai_instant(3, 0));
        assert!(status.is_trading_time);
    }

    #[test]
    fn window_boundaries_are_half_open() {
        let clock = a_share_clock(true);
        assert!(clock.is_trading(shanghai_instant(9, 30)));
        assert!(clock.is_trading(shanghai_instant(11, 29)));
        assert!(!clock.is_trading(shanghai_instant(11, 30)));
        assert!(!clock.is_trading(shanghai_instant(12, 0)));
        assert!(clock.is_trading(shanghai_instant(13, 0)));
        assert!(!clock.is_trading(shanghai_instant(15, 0)));
    }

    #[test]
    fn weekend_is_not_trading() {
        let clock = a_share_clock(true);
        // 2026-07-25 周六 10:00
        let saturday = chrono_tz::Asia::Shanghai
            .with_ymd_and_hms(2026, 7, 25, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert!(!clock.is_trading(saturday));
        let status = clock.status(saturday);
        assert!(!status.is_trading_day);
        // 下一开盘应为周一 09:30
        assert_eq!(
            status.next_trading_time.as_deref(),
            Some("2026-07-27 09:30:00")
        );
    }

    #[test]
    fn lunch_break_points_to_afternoon_open() {
        let clock = a_share_clock(true);
        let status = clock.status(shanghai_instant(12, 0));
        assert!(status.is_trading_day);
        assert!(!status.is_trading_time);
        assert_eq!(
            status.next_trading_time.as_deref(),
            Some("2026-07-27 13:00:00")
        );
    }

    #[test]
    fn malformed_window_is_rejected() {
        assert!(TradingClock::new(true, &["0930-1130".to_string()], "Asia/Shanghai").is_err());
        assert!(TradingClock::new(true, &["15:00-09:30".to_string()], "Asia/Shanghai").is_err());
        assert!(TradingClock::new(true, &[], "Not/AZone").is_err());
    }
}
