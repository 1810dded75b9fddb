//! Job schedules: fixed interval or cron expression

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use croner::Cron;

use crate::utils::{AppError, AppResult};

const EVERY_PREFIX: &str = "@every";

/// When a job fires
///
/// - `@every <n>{s|m|h}`: fixed interval, first tick one interval after start
/// - 5 or 6 field cron expression, evaluated in the business timezone
#[derive(Clone)]
pub enum Schedule {
    Interval(Duration),
    Cron { expr: String, cron: Arc<Cron> },
}

impl Schedule {
    pub fn every(period: Duration) -> Self {
        Schedule::Interval(period)
    }

    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix(EVERY_PREFIX) {
            return parse_every(rest.trim()).map(Schedule::Interval);
        }

        let cron = Cron::new(raw)
            .with_seconds_optional()
            .parse()
            .map_err(|e| {
                AppError::validation(format!("Invalid cron expression '{}': {}", raw, e))
                    .with_detail("schedule", raw)
            })?;
        Ok(Schedule::Cron {
            expr: raw.to_string(),
            cron: Arc::new(cron),
        })
    }

    /// Next fire time strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>, tz: Tz) -> AppResult<DateTime<Utc>> {
        match self {
            Schedule::Interval(period) => {
                let step = chrono::Duration::from_std(*period)
                    .map_err(|e| AppError::validation(format!("Interval out of range: {}", e)))?;
                Ok(now + step)
            }
            Schedule::Cron { expr, cron } => {
                let local = now.with_timezone(&tz);
                cron.find_next_occurrence(&local, false)
                    .map(|next| next.with_timezone(&Utc))
                    .map_err(|e| {
                        AppError::internal(format!("No next occurrence for '{}': {}", expr, e))
                    })
            }
        }
    }

    /// Next fire time and how long to sleep from `now` until it
    ///
    /// For cron the search starts at `last_fire` when the clock still reads
    /// before it, so the occurrence that just ran is never fired twice.
    pub fn next_tick(
        &self,
        now: DateTime<Utc>,
        last_fire: Option<DateTime<Utc>>,
        tz: Tz,
    ) -> AppResult<(DateTime<Utc>, Duration)> {
        match self {
            Schedule::Interval(period) => Ok((self.next_after(now, tz)?, *period)),
            Schedule::Cron { .. } => {
                let from = last_fire.map_or(now, |fired| fired.max(now));
                let next = self.next_after(from, tz)?;
                Ok((next, (next - now).to_std().unwrap_or(Duration::ZERO)))
            }
        }
    }
}

fn parse_every(every: &str) -> AppResult<Duration> {
    let invalid = || {
        AppError::validation(format!("Invalid interval '{} {}'", EVERY_PREFIX, every))
            .with_detail("schedule", format!("{} {}", EVERY_PREFIX, every))
    };

    let split = every
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(invalid)?;
    let (digits, unit) = every.split_at(split);
    let n: u64 = digits.parse().map_err(|_| invalid())?;
    let secs = match unit.trim() {
        "s" => n,
        "m" => n.saturating_mul(60),
        "h" => n.saturating_mul(3600),
        _ => return Err(invalid()),
    };
    if secs == 0 {
        return Err(invalid());
    }
    Ok(Duration::from_secs(secs))
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Interval(period) => write!(f, "{} {}s", EVERY_PREFIX, period.as_secs()),
            Schedule::Cron { expr, .. } => f.write_str(expr),
        }
    }
}

impl fmt::Debug for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schedule({})", self)
    }
}

impl PartialEq for Schedule {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Schedule::Interval(a), Schedule::Interval(b)) => a == b,
            (Schedule::Cron { expr: a, .. }, Schedule::Cron { expr: b, .. }) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::error::ErrorCode;

    #[test]
    fn test_parse_every() {
        assert_eq!(Schedule::parse("@every 60s").unwrap(), Schedule::every(Duration::from_secs(60)));
        assert_eq!(Schedule::parse("@every 15m").unwrap(), Schedule::every(Duration::from_secs(900)));
        assert_eq!(Schedule::parse(" @every 1h ").unwrap(), Schedule::every(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_every_rejects_garbage() {
        for raw in ["@every", "@every 0s", "@every 10d", "@every s", "@every -5m"] {
            let err = Schedule::parse(raw).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValidationFailed, "{raw}");
        }
    }

    #[test]
    fn test_parse_cron() {
        assert!(matches!(Schedule::parse("0 0 1 * * *").unwrap(), Schedule::Cron { .. }));
        // 5-field form is accepted too
        assert!(Schedule::parse("30 2 * * *").is_ok());
        assert!(Schedule::parse("not a cron").is_err());
    }

    #[test]
    fn test_cron_next_in_business_timezone() {
        let tz = chrono_tz::Asia::Shanghai;
        let schedule = Schedule::parse("0 0 1 * * *").unwrap();

        // 2024-01-01 00:30 Shanghai
        let now = tz.with_ymd_and_hms(2024, 1, 1, 0, 30, 0).unwrap().with_timezone(&Utc);
        let next = schedule.next_after(now, tz).unwrap();
        assert_eq!(next, tz.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap().with_timezone(&Utc));

        // Exactly at 01:00 -> next day
        let next = schedule.next_after(next, tz).unwrap();
        assert_eq!(next, tz.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap().with_timezone(&Utc));
    }

    #[test]
    fn test_next_tick_delay() {
        let tz = chrono_tz::UTC;
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 59, 0).unwrap();
        let (next, delay) = Schedule::parse("0 0 1 * * *").unwrap().next_tick(now, None, tz).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(delay, Duration::from_secs(60));

        let (_, delay) = Schedule::every(Duration::from_secs(5)).next_tick(now, None, tz).unwrap();
        assert_eq!(delay, Duration::from_secs(5));
    }

    #[test]
    fn test_next_tick_skips_occurrence_already_fired() {
        let tz = chrono_tz::UTC;
        let schedule = Schedule::parse("0 0 1 * * *").unwrap();
        let fired = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
        // Clock reads slightly before the occurrence that just ran
        let now = fired - chrono::Duration::milliseconds(300);

        let (next, delay) = schedule.next_tick(now, Some(fired), tz).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap());
        assert_eq!(delay, Duration::from_millis(24 * 3_600_000 + 300));
    }

    #[test]
    fn test_display() {
        assert_eq!(Schedule::every(Duration::from_secs(60)).to_string(), "@every 60s");
        assert_eq!(Schedule::parse("0 0 1 * * *").unwrap().to_string(), "0 0 1 * * *");
    }
}
