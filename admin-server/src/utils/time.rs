//! 时间工具函数 (业务时区转换)
//!
//! 所有日期→时间戳转换统一在 statistics 层完成，
//! store 层只接收 `i64` Unix millis。

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析 IANA 时区名 (e.g. "Asia/Shanghai")
pub fn parse_timezone(name: &str) -> AppResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| AppError::validation(format!("Invalid timezone: {}", name)))
}

/// Longest local-time gap searched when a wall time does not exist
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// 日期 + 时间 → Unix millis (业务时区)
///
/// 本地时间重复 (夏令时回拨) 取较早的时刻；本地时间不存在 (夏令时跳跃)
/// 取跳跃之后的第一个有效时刻，例如 America/Santiago 2024-09-08 的
/// 00:00 解析为 01:00 -03。
fn local_to_millis(date: NaiveDate, time: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(time);
    (0..=MAX_GAP_MINUTES)
        .filter_map(|m| naive.checked_add_signed(chrono::Duration::minutes(m)))
        .find_map(|t| t.and_local_timezone(tz).earliest())
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    local_to_millis(date, NaiveTime::MIN, tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    match date.succ_opt() {
        Some(next_day) => day_start_millis(next_day, tz),
        None => local_to_millis(date, NaiveTime::MIN, tz) + 86_400_000,
    }
}

/// `[begin, end]` 内的每一天 (含两端)
///
/// `begin > end` 返回 `InvalidDateRange`。
pub fn date_range(begin: NaiveDate, end: NaiveDate) -> AppResult<Vec<NaiveDate>> {
    if begin > end {
        return Err(AppError::invalid_range(begin, end));
    }
    Ok(begin.iter_days().take_while(|d| *d <= end).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shared::error::ErrorCode;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_day_window_shanghai() {
        let tz = chrono_tz::Asia::Shanghai;
        // 2024-01-01 00:00 +08:00 = 2023-12-31 16:00 UTC
        assert_eq!(day_start_millis(d(2024, 1, 1), tz), 1_704_038_400_000);
        assert_eq!(day_end_millis(d(2024, 1, 1), tz), 1_704_038_400_000 + 86_400_000);
    }

    #[test]
    fn test_day_window_dst_is_23_hours() {
        // Europe/Madrid springs forward on 2024-03-31
        let tz = chrono_tz::Europe::Madrid;
        let date = d(2024, 3, 31);
        let len = day_end_millis(date, tz) - day_start_millis(date, tz);
        assert_eq!(len, 23 * 3_600_000);
    }

    #[test]
    fn test_day_window_when_midnight_is_skipped() {
        // America/Santiago jumps from 2024-09-08 00:00 -04 straight to 01:00 -03
        let tz = chrono_tz::America::Santiago;
        let start = day_start_millis(d(2024, 9, 7), tz);
        let end = day_end_millis(d(2024, 9, 7), tz);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 9, 7, 4, 0, 0).unwrap().timestamp_millis());
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap().timestamp_millis());
        assert_eq!(end - start, 24 * 3_600_000);

        // The day after the jump starts where the previous one ended and is 23 hours long
        let next = d(2024, 9, 8);
        assert_eq!(day_start_millis(next, tz), end);
        assert_eq!(day_end_millis(next, tz) - day_start_millis(next, tz), 23 * 3_600_000);

        // 23:30 local on 09-07 (03:30 UTC on 09-08) still belongs to 09-07
        let late = Utc.with_ymd_and_hms(2024, 9, 8, 3, 30, 0).unwrap().timestamp_millis();
        assert!(late >= start && late < end);
    }

    #[test]
    fn test_date_range_inclusive() {
        let days = date_range(d(2024, 1, 30), d(2024, 2, 2)).unwrap();
        assert_eq!(days.len(), 4);
        assert_eq!(days.first(), Some(&d(2024, 1, 30)));
        assert_eq!(days.last(), Some(&d(2024, 2, 2)));
        assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
    }

    #[test]
    fn test_date_range_single_day() {
        let days = date_range(d(2024, 1, 1), d(2024, 1, 1)).unwrap();
        assert_eq!(days, vec![d(2024, 1, 1)]);
    }

    #[test]
    fn test_date_range_rejects_inverted() {
        let err = date_range(d(2024, 1, 3), d(2024, 1, 1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Asia/Shanghai").unwrap(), chrono_tz::Asia::Shanghai);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
