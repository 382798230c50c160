//! デバイス無応答検出モジュール
//!
//! 連続した読み取りタイムアウトを数え、しきい値到達で
//! デバイス無応答と判定します。再接続は行いません。

/// 無応答監視
#[derive(Debug)]
pub struct SilenceWatchdog {
    /// 連続タイムアウト閾値（この回数に達したら無応答と判定）
    threshold: u32,
    consecutive_timeouts: u32,
}

impl SilenceWatchdog {
    /// 新しいSilenceWatchdogを作成
    ///
    /// # Arguments
    /// * `threshold` - 無応答と判定する連続タイムアウト回数
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive_timeouts: 0,
        }
    }

    /// タイムアウトを記録
    ///
    /// # Returns
    /// 連続回数がしきい値に達した場合は true（デバイス無応答）
    pub fn record_timeout(&mut self) -> bool {
        self.consecutive_timeouts += 1;

        self.consecutive_timeouts >= self.threshold
    }

    /// 読み取り成功を記録（連続タイムアウトカウンターをリセット）
    pub fn record_success(&mut self) {
        self.consecutive_timeouts = 0;
    }

    /// 連続タイムアウト回数を取得
    pub fn consecutive_timeouts(&self) -> u32 {
        self.consecutive_timeouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_threshold() {
        let mut watchdog = SilenceWatchdog::new(30);

        // 閾値未満
        for _ in 0..29 {
            assert!(!watchdog.record_timeout());
        }

        // 閾値到達
        assert!(watchdog.record_timeout());
        assert_eq!(watchdog.consecutive_timeouts(), 30);
    }

    #[test]
    fn test_success_resets_consecutive() {
        let mut watchdog = SilenceWatchdog::new(30);

        for _ in 0..20 {
            watchdog.record_timeout();
        }
        assert_eq!(watchdog.consecutive_timeouts(), 20);

        watchdog.record_success();
        assert_eq!(watchdog.consecutive_timeouts(), 0);

        // リセット後は再びしきい値まで数え直す
        for _ in 0..29 {
            assert!(!watchdog.record_timeout());
        }
        assert!(watchdog.record_timeout());
    }

    #[test]
    fn test_threshold_one_trips_immediately() {
        // 境界値: しきい値1なら最初のタイムアウトで判定
        let mut watchdog = SilenceWatchdog::new(1);
        assert!(watchdog.record_timeout());
    }
}
