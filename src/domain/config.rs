//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{DomainError, DomainResult};

/// デバウンスポリシー
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum LatchPolicy {
    /// ACTIVE連続区間ごとに1クリック（非ACTIVE行でラッチ解除、デフォルト）
    #[default]
    PerRun,
    /// プロセス寿命全体で最初の1クリックのみ（旧デバイス互換モード）
    ///
    /// 非ACTIVE行を1行でも観測すると以後のクリックを恒久的に抑止する。
    /// 旧実装のログを再現する必要がある場合のみ使用する。
    PerSession,
}

/// アプリケーション設定のルート構造
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// シリアル接続設定
    pub serial: SerialConfig,
    /// キー送出設定
    pub key: KeyConfig,
    /// デバウンス設定
    #[serde(default)]
    pub debounce: DebounceConfig,
    /// ログ出力設定
    pub log: LogConfig,
    /// パイプライン設定
    pub pipeline: PipelineConfig,
}

/// シリアル接続設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SerialConfig {
    /// シリアルポート名
    ///
    /// 例 (Windows): "COM3" / 例 (Linux): "/dev/ttyUSB0"
    /// デフォルト: "COM3"
    pub port: String,

    /// ボーレート
    ///
    /// デフォルト: 115200
    pub baud_rate: u32,

    /// 読み取りタイムアウト（ミリ秒）
    ///
    /// 1回のread呼び出しがこの時間で必ず戻る。
    /// デフォルト: 1000ms
    pub read_timeout_ms: u64,

    /// 連続タイムアウト許容回数
    ///
    /// この回数に達したらデバイス無応答として実行を終了する
    /// デフォルト: 30回（約30秒 @ 1000ms）
    pub max_consecutive_timeouts: u32,
}

impl SerialConfig {
    /// デフォルトのポート名
    pub const DEFAULT_PORT: &'static str = "COM3";
    /// デフォルトのボーレート
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;
    /// デフォルトの読み取りタイムアウト（ミリ秒）
    pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
    /// デフォルトの連続タイムアウト閾値（約30秒 @ 1000ms）
    pub const DEFAULT_MAX_CONSECUTIVE_TIMEOUTS: u32 = 30;

    /// 読み取りタイムアウトをDurationとして取得
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: Self::DEFAULT_PORT.to_string(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            read_timeout_ms: Self::DEFAULT_READ_TIMEOUT_MS,
            max_consecutive_timeouts: Self::DEFAULT_MAX_CONSECUTIVE_TIMEOUTS,
        }
    }
}

/// キー送出設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct KeyConfig {
    /// 送出するキー（1文字）
    ///
    /// デフォルト: "q"
    pub key: String,
}

impl KeyConfig {
    /// デフォルトの送出キー
    pub const DEFAULT_KEY: &'static str = "q";

    /// 設定値をcharとして取得
    ///
    /// # Returns
    /// - `Ok(char)`: ちょうど1文字の場合
    /// - `Err(DomainError::Configuration)`: 空または2文字以上の場合
    pub fn key_char(&self) -> DomainResult<char> {
        let mut chars = self.key.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(DomainError::Configuration(format!(
                "key must be exactly one character, got {:?}",
                self.key
            ))),
        }
    }
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            key: Self::DEFAULT_KEY.to_string(),
        }
    }
}

/// デバウンス設定
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DebounceConfig {
    /// クリック抑止ポリシー
    ///
    /// 選択肢: "per-run" (区間ごとに1クリック), "per-session" (旧実装互換)
    /// デフォルト: "per-run"
    #[serde(default)]
    pub policy: LatchPolicy,
}

/// ログ出力設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LogConfig {
    /// CSV出力先パス
    ///
    /// 実行ごとに新規作成（既存ファイルは上書き）
    /// デフォルト: "sensor_readings.csv"
    pub output_path: String,

    /// 疑似経過時間の1行あたり加算量（ミリ秒）
    ///
    /// CSVのTimestamp列は実時間ではなく、行ごとにこの値を加算した値
    /// デフォルト: 10ms
    pub time_step_ms: u64,
}

impl LogConfig {
    /// デフォルトの出力先パス
    pub const DEFAULT_OUTPUT_PATH: &'static str = "sensor_readings.csv";
    /// デフォルトの時間ステップ（ミリ秒）
    pub const DEFAULT_TIME_STEP_MS: u64 = 10;
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            output_path: Self::DEFAULT_OUTPUT_PATH.to_string(),
            time_step_ms: Self::DEFAULT_TIME_STEP_MS,
        }
    }
}

/// パイプライン設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,
}

impl PipelineConfig {
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;

    /// 統計出力間隔をDurationとして取得
    pub fn stats_interval(&self) -> Duration {
        Duration::from_secs(self.stats_interval_sec)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    #[allow(dead_code)]
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> DomainResult<()> {
        // シリアル設定の検証
        if self.serial.port.is_empty() {
            return Err(DomainError::Configuration(
                "Serial port name must not be empty".to_string(),
            ));
        }
        if self.serial.baud_rate == 0 {
            return Err(DomainError::Configuration(
                "Baud rate must be greater than 0".to_string(),
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(DomainError::Configuration(
                "Read timeout must be greater than 0".to_string(),
            ));
        }
        if self.serial.max_consecutive_timeouts == 0 {
            return Err(DomainError::Configuration(
                "Max consecutive timeouts must be greater than 0".to_string(),
            ));
        }

        // キー設定の検証（1文字であること）
        self.key.key_char()?;

        // ログ設定の検証
        if self.log.output_path.is_empty() {
            return Err(DomainError::Configuration(
                "Output path must not be empty".to_string(),
            ));
        }
        if self.log.time_step_ms == 0 {
            return Err(DomainError::Configuration(
                "Time step must be greater than 0".to_string(),
            ));
        }

        // パイプライン設定の検証
        if self.pipeline.stats_interval_sec == 0 {
            return Err(DomainError::Configuration(
                "Stats interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
