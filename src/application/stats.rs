//! 統計情報管理モジュール
//!
//! 処理行数・クリック発行数・タイムアウト数を収集し、
//! 一定間隔でログへ出力します。

use std::time::{Duration, Instant};
use tracing::info;

/// 実行終了時の集計値
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// 処理したレコード数（= CSVへ書き込んだ行数）
    pub readings: u64,
    /// 発行したクリック数
    pub clicks: u64,
    /// 抑止したクリック数（ACTIVE行のうち発行しなかったもの）
    pub suppressed: u64,
    /// 観測したタイムアウト数
    pub timeouts: u64,
    /// 実行時間（実時間）
    pub duration: Duration,
}

/// 統計情報コレクター
#[derive(Debug)]
pub struct RunStats {
    readings: u64,
    clicks: u64,
    suppressed: u64,
    timeouts: u64,
    /// 直近レポート以降のレコード数（レート計算用）
    window_readings: u64,
    started_at: Instant,
    last_report: Instant,
    report_interval: Duration,
}

impl RunStats {
    /// 新しいRunStatsを作成
    ///
    /// # Arguments
    /// * `report_interval` - 統計出力間隔（例: 10秒）
    pub fn new(report_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            readings: 0,
            clicks: 0,
            suppressed: 0,
            timeouts: 0,
            window_readings: 0,
            started_at: now,
            last_report: now,
            report_interval,
        }
    }

    /// 1レコードの処理を記録
    ///
    /// # Arguments
    /// * `active` - レコードがACTIVE状態だったか
    /// * `clicked` - この行でクリックを発行したか
    pub fn record_reading(&mut self, active: bool, clicked: bool) {
        self.readings += 1;
        self.window_readings += 1;
        if clicked {
            self.clicks += 1;
        } else if active {
            self.suppressed += 1;
        }
    }

    /// 読み取りタイムアウトを記録
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// 統計レポートを出力すべきか判定
    pub fn should_report(&self) -> bool {
        self.last_report.elapsed() >= self.report_interval
    }

    /// 統計レポートを出力してタイマーをリセット
    pub fn report_and_reset(&mut self) {
        let window = self.last_report.elapsed().as_secs_f64();
        let rate = if window > 0.0 {
            self.window_readings as f64 / window
        } else {
            0.0
        };

        info!(
            "Stats: readings={} ({:.1}/s), clicks={}, suppressed={}, timeouts={}",
            self.readings, rate, self.clicks, self.suppressed, self.timeouts
        );

        self.window_readings = 0;
        self.last_report = Instant::now();
    }

    /// 実行サマリを生成
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            readings: self.readings,
            clicks: self.clicks,
            suppressed: self.suppressed,
            timeouts: self.timeouts,
            duration: self.started_at.elapsed(),
        }
    }
}
