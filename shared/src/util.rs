use rand::Rng;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicI64, Ordering};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Per-process sequence, seeded randomly so two processes rarely collide
static SEQUENCE: LazyLock<AtomicI64> =
    LazyLock::new(|| AtomicI64::new(rand::thread_rng().gen_range(0..0x1000)));

/// Generate a Snowflake-style i64 for use as resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: sequence (4096 distinct ids per ms per process)
pub fn snowflake_id() -> i64 {
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) & 0xFFF; // 12 bits
    (ts << 12) | seq
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_id_positive_and_safe() {
        let id = snowflake_id();
        assert!(id > 0);
        assert!(id < (1_i64 << 53));
    }

    #[test]
    fn test_snowflake_ids_unique_in_burst() {
        let ids: std::collections::HashSet<i64> = (0..1000).map(|_| snowflake_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
