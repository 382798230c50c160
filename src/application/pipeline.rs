//! パイプライン制御モジュール
//!
//! 読み取り → クリック判定 → キー送出 → CSV追記 を単一スレッドで回します。
//! 並行処理は行わず、Ctrl-Cハンドラからの通知チャネルだけがスレッドを跨ぎます。

use crate::application::{
    clock::TickClock,
    debounce::ClickLatch,
    stats::{RunStats, RunSummary},
    watchdog::SilenceWatchdog,
};
use crate::domain::{
    config::{AppConfig, LatchPolicy},
    error::{DomainError, DomainResult},
    ports::{KeyPort, RecordSink, SensorPort},
    types::{LogRecord, Reading},
};
use crossbeam_channel::Receiver;
use std::time::Duration;
use tracing::{debug, info};

/// ブリッジ実行設定
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// 送出するキー
    pub key: char,
    /// 疑似経過時間の1行あたり加算量（ミリ秒）
    pub time_step_ms: u64,
    /// 連続タイムアウト閾値（デバイス無応答判定）
    pub max_consecutive_timeouts: u32,
    /// デバウンスポリシー
    pub policy: LatchPolicy,
    /// 統計出力間隔
    pub stats_interval: Duration,
}

impl BridgeConfig {
    /// AppConfigから実行設定を構築
    pub fn from_app_config(config: &AppConfig) -> DomainResult<Self> {
        Ok(Self {
            key: config.key.key_char()?,
            time_step_ms: config.log.time_step_ms,
            max_consecutive_timeouts: config.serial.max_consecutive_timeouts,
            policy: config.debounce.policy,
            stats_interval: config.pipeline.stats_interval(),
        })
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            key: 'q',
            time_step_ms: 10,
            max_consecutive_timeouts: 30,
            policy: LatchPolicy::default(),
            stats_interval: Duration::from_secs(10),
        }
    }
}

/// ブリッジ実行コンテキスト
pub struct BridgeRunner<S, K, L>
where
    S: SensorPort,
    K: KeyPort,
    L: RecordSink,
{
    sensor: S,
    key: K,
    sink: L,
    config: BridgeConfig,
    latch: ClickLatch,
    clock: TickClock,
    watchdog: SilenceWatchdog,
    stats: RunStats,
    shutdown_rx: Receiver<()>,
}

impl<S, K, L> BridgeRunner<S, K, L>
where
    S: SensorPort,
    K: KeyPort,
    L: RecordSink,
{
    /// 新しいBridgeRunnerを作成
    pub fn new(sensor: S, key: K, sink: L, config: BridgeConfig, shutdown_rx: Receiver<()>) -> Self {
        Self {
            latch: ClickLatch::with_policy(config.policy),
            clock: TickClock::new(config.time_step_ms),
            watchdog: SilenceWatchdog::new(config.max_consecutive_timeouts),
            stats: RunStats::new(config.stats_interval),
            sensor,
            key,
            sink,
            config,
            shutdown_rx,
        }
    }

    /// ブリッジを起動（ブロッキング）
    ///
    /// 終了時は成否に関わらず実行サマリをログへ出力する。
    ///
    /// # Returns
    /// - `Ok(RunSummary)`: 割り込みによる正常終了
    /// - `Err(DomainError)`: 致命的エラー（不正レコード・切断・送出失敗・無応答）
    pub fn run(mut self) -> DomainResult<RunSummary> {
        info!(
            "Bridge started: endpoint={}, key='{}', sink={}",
            self.sensor.endpoint().describe(),
            self.config.key,
            self.sink.destination()
        );

        let outcome = self.run_loop();

        let summary = self.stats.summary();
        info!(
            "Run summary: readings={}, clicks={}, suppressed={}, timeouts={}, duration={:.1}s",
            summary.readings,
            summary.clicks,
            summary.suppressed,
            summary.timeouts,
            summary.duration.as_secs_f64()
        );

        outcome?;

        // 元スクリプト由来の送別メッセージ（中断時に出力先を知らせる）
        info!("File sent to: {}", self.sink.destination());
        Ok(summary)
    }

    /// 読み取りループ本体（割り込みで正常終了）
    fn run_loop(&mut self) -> DomainResult<()> {
        loop {
            // 割り込みチェック（各イテレーション先頭）
            if self.shutdown_rx.try_recv().is_ok() {
                info!("Interrupt received, shutting down");
                return Ok(());
            }

            match self.sensor.next_reading()? {
                Some(reading) => {
                    self.watchdog.record_success();
                    self.handle_reading(&reading)?;
                }
                None => {
                    self.stats.record_timeout();
                    if self.watchdog.record_timeout() {
                        return Err(DomainError::DeviceSilent(
                            self.watchdog.consecutive_timeouts(),
                        ));
                    }
                    debug!(
                        "Read timeout ({} consecutive)",
                        self.watchdog.consecutive_timeouts()
                    );
                }
            }

            if self.stats.should_report() {
                self.stats.report_and_reset();
            }
        }
    }

    /// 1レコードを処理（判定 → 送出 → 追記 → クロック前進）
    ///
    /// 送出失敗時はその行を書き込まずにエラーを返す
    /// （クリックと行の不整合を残さない）。
    fn handle_reading(&mut self, reading: &Reading) -> DomainResult<()> {
        let active = reading.is_active();
        let fired = self.latch.observe(active).should_fire();

        if fired {
            self.key.tap(self.config.key)?;
            self.latch.confirm_fired();
            debug!("Click fired: label={}, value={}", reading.label, reading.value);
        }

        let record = LogRecord::new(self.clock.current(), reading, fired);
        self.sink.append(&record)?;
        self.clock.advance();
        self.stats.record_reading(active, fired);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::EndpointInfo;
    use crossbeam_channel::{bounded, Sender};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    // モック実装
    struct ScriptSensor {
        events: VecDeque<DomainResult<Option<Reading>>>,
        /// スクリプト消費後に割り込みを送るSender（正常終了テスト用）
        on_empty: Option<Sender<()>>,
    }

    impl ScriptSensor {
        fn from_lines(lines: &[&str]) -> Self {
            Self {
                events: lines.iter().map(|l| Reading::parse(l).map(Some)).collect(),
                on_empty: None,
            }
        }

        fn with_interrupt_on_empty(mut self, tx: Sender<()>) -> Self {
            self.on_empty = Some(tx);
            self
        }

        fn silent() -> Self {
            Self {
                events: VecDeque::new(),
                on_empty: None,
            }
        }
    }

    impl SensorPort for ScriptSensor {
        fn next_reading(&mut self) -> DomainResult<Option<Reading>> {
            match self.events.pop_front() {
                Some(event) => event,
                None => {
                    if let Some(tx) = &self.on_empty {
                        let _ = tx.try_send(());
                    }
                    Ok(None)
                }
            }
        }

        fn endpoint(&self) -> EndpointInfo {
            EndpointInfo {
                name: "mock".to_string(),
                baud_rate: 115_200,
            }
        }
    }

    struct CountingKey {
        taps: Arc<Mutex<Vec<char>>>,
    }

    impl KeyPort for CountingKey {
        fn tap(&mut self, key: char) -> DomainResult<()> {
            self.taps.lock().expect("taps lock poisoned").push(key);
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "counting"
        }
    }

    struct FailingKey;

    impl KeyPort for FailingKey {
        fn tap(&mut self, _key: char) -> DomainResult<()> {
            Err(DomainError::KeyDispatch("injection rejected".to_string()))
        }

        fn backend_name(&self) -> &str {
            "failing"
        }
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn append(&mut self, _record: &LogRecord) -> DomainResult<()> {
            Err(DomainError::Log("disk full".to_string()))
        }

        fn destination(&self) -> String {
            "failing".to_string()
        }
    }

    struct MemorySink {
        rows: Arc<Mutex<Vec<LogRecord>>>,
    }

    impl RecordSink for MemorySink {
        fn append(&mut self, record: &LogRecord) -> DomainResult<()> {
            self.rows
                .lock()
                .expect("rows lock poisoned")
                .push(record.clone());
            Ok(())
        }

        fn destination(&self) -> String {
            "memory".to_string()
        }
    }

    #[test]
    fn test_bridge_config_default() {
        let config = BridgeConfig::default();
        assert_eq!(config.key, 'q');
        assert_eq!(config.time_step_ms, 10);
        assert_eq!(config.max_consecutive_timeouts, 30);
        assert_eq!(config.policy, LatchPolicy::PerRun);
    }

    #[test]
    fn test_bridge_config_from_app_config() {
        let app = AppConfig::default();
        let config = BridgeConfig::from_app_config(&app).expect("from_app_config failed");
        assert_eq!(config.key, 'q');
        assert_eq!(config.stats_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_first_active_fires_once() {
        // スクリプト消費後に割り込みを入れて正常終了させる
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor =
            ScriptSensor::from_lines(&["10,ACTIVE,580"]).with_interrupt_on_empty(shutdown_tx);

        let taps = Arc::new(Mutex::new(Vec::new()));
        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey { taps: taps.clone() },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let summary = runner.run().expect("run failed");

        assert_eq!(summary.readings, 1);
        assert_eq!(summary.clicks, 1);
        assert_eq!(taps.lock().expect("lock").as_slice(), &['q']);

        let rows = rows.lock().expect("lock");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].elapsed_ms, 0);
        assert_eq!(rows[0].label, "10");
        assert_eq!(rows[0].state, "ACTIVE");
        assert!(rows[0].click);
    }

    #[test]
    fn test_same_run_suppressed() {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&["10,ACTIVE,580", "20,ACTIVE,575"])
            .with_interrupt_on_empty(shutdown_tx);

        let taps = Arc::new(Mutex::new(Vec::new()));
        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey { taps: taps.clone() },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let summary = runner.run().expect("run failed");

        assert_eq!(summary.readings, 2);
        assert_eq!(summary.clicks, 1);
        assert_eq!(summary.suppressed, 1);
        assert_eq!(taps.lock().expect("lock").len(), 1);

        let rows = rows.lock().expect("lock");
        assert!(rows[0].click);
        assert!(!rows[1].click);
    }

    #[test]
    fn test_idle_resets_and_refires() {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor =
            ScriptSensor::from_lines(&["10,ACTIVE,580", "20,IDLE,100", "30,ACTIVE,590"])
                .with_interrupt_on_empty(shutdown_tx);

        let taps = Arc::new(Mutex::new(Vec::new()));
        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey { taps: taps.clone() },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let summary = runner.run().expect("run failed");

        assert_eq!(summary.clicks, 2);
        assert_eq!(taps.lock().expect("lock").len(), 2);

        let rows = rows.lock().expect("lock");
        let clicks: Vec<bool> = rows.iter().map(|r| r.click).collect();
        assert_eq!(clicks, vec![true, false, true]);
    }

    #[test]
    fn test_per_session_policy_leading_idle() {
        // 旧実装互換: 先頭の非ACTIVE行で以後のクリックが恒久抑止される
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&["10,IDLE,100", "20,ACTIVE,580"])
            .with_interrupt_on_empty(shutdown_tx);

        let taps = Arc::new(Mutex::new(Vec::new()));
        let rows = Arc::new(Mutex::new(Vec::new()));
        let config = BridgeConfig {
            policy: LatchPolicy::PerSession,
            ..Default::default()
        };
        let runner = BridgeRunner::new(
            sensor,
            CountingKey { taps: taps.clone() },
            MemorySink { rows: rows.clone() },
            config,
            shutdown_rx,
        );

        let summary = runner.run().expect("run failed");

        assert_eq!(summary.clicks, 0);
        assert!(taps.lock().expect("lock").is_empty());

        let rows = rows.lock().expect("lock");
        assert!(rows.iter().all(|r| !r.click));
    }

    #[test]
    fn test_elapsed_progression() {
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&[
            "10,IDLE,1",
            "20,IDLE,2",
            "30,ACTIVE,580",
            "40,ACTIVE,575",
        ])
        .with_interrupt_on_empty(shutdown_tx);

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey {
                taps: Arc::new(Mutex::new(Vec::new())),
            },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        runner.run().expect("run failed");

        // k行目（0始まり）のTimestampは 10*k
        let rows = rows.lock().expect("lock");
        let elapsed: Vec<u64> = rows.iter().map(|r| r.elapsed_ms).collect();
        assert_eq!(elapsed, vec![0, 10, 20, 30]);
    }

    #[test]
    fn test_malformed_line_aborts() {
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&["10,ACTIVE,580", "garbage"]);

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey {
                taps: Arc::new(Mutex::new(Vec::new())),
            },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let result = runner.run();
        assert!(matches!(result, Err(DomainError::MalformedRecord(_))));

        // 不正行より前の行は書き込まれている
        let rows = rows.lock().expect("lock");
        assert_eq!(rows.len(), 1);
        assert!(rows[0].click);
    }

    #[test]
    fn test_device_silent_aborts() {
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let config = BridgeConfig {
            max_consecutive_timeouts: 3,
            ..Default::default()
        };

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            ScriptSensor::silent(),
            CountingKey {
                taps: Arc::new(Mutex::new(Vec::new())),
            },
            MemorySink { rows: rows.clone() },
            config,
            shutdown_rx,
        );

        let result = runner.run();
        assert!(matches!(result, Err(DomainError::DeviceSilent(3))));
        assert!(rows.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_timeout_then_reading_resets_watchdog() {
        // タイムアウトを挟んでもレコードが届けば無応答判定されない
        let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let mut sensor = ScriptSensor::from_lines(&["10,ACTIVE,580"]);
        sensor.events.push_front(Ok(None));
        sensor.events.push_front(Ok(None));
        let sensor = sensor.with_interrupt_on_empty(shutdown_tx);

        let config = BridgeConfig {
            max_consecutive_timeouts: 5,
            ..Default::default()
        };

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey {
                taps: Arc::new(Mutex::new(Vec::new())),
            },
            MemorySink { rows: rows.clone() },
            config,
            shutdown_rx,
        );

        let summary = runner.run().expect("run failed");

        assert_eq!(summary.readings, 1);
        // スクリプト前の2回 + 消費後の割り込み待ち1回
        assert_eq!(summary.timeouts, 3);

        // タイムアウトでは疑似クロックが進まない
        let rows = rows.lock().expect("lock");
        assert_eq!(rows[0].elapsed_ms, 0);
    }

    #[test]
    fn test_key_dispatch_failure_aborts() {
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&["10,ACTIVE,580"]);

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            FailingKey,
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let result = runner.run();
        assert!(matches!(result, Err(DomainError::KeyDispatch(_))));

        // 送出に失敗した行は書き込まれない
        assert!(rows.lock().expect("lock").is_empty());
    }

    #[test]
    fn test_sink_write_failure_aborts() {
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let sensor = ScriptSensor::from_lines(&["10,ACTIVE,580"]);

        let taps = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey { taps: taps.clone() },
            FailingSink,
            BridgeConfig::default(),
            shutdown_rx,
        );

        let result = runner.run();
        assert!(matches!(result, Err(DomainError::Log(_))));

        // 書き込み失敗の時点でクリックは送出済み（送出 → 追記の順）
        assert_eq!(taps.lock().expect("lock").len(), 1);
    }

    #[test]
    fn test_serial_error_aborts() {
        // 回線断はタイムアウトと違い、即座に実行を中断する
        let (_shutdown_tx, shutdown_rx) = bounded::<()>(1);
        let mut sensor = ScriptSensor::from_lines(&["10,ACTIVE,580"]);
        sensor
            .events
            .push_back(Err(DomainError::Serial("device unplugged".to_string())));

        let rows = Arc::new(Mutex::new(Vec::new()));
        let runner = BridgeRunner::new(
            sensor,
            CountingKey {
                taps: Arc::new(Mutex::new(Vec::new())),
            },
            MemorySink { rows: rows.clone() },
            BridgeConfig::default(),
            shutdown_rx,
        );

        let result = runner.run();
        assert!(matches!(result, Err(DomainError::Serial(_))));

        // 切断前の行は処理済み
        assert_eq!(rows.lock().expect("lock").len(), 1);
    }
}
