mod domain;
mod logging;
mod application;
mod infrastructure;

use crate::application::pipeline::{BridgeConfig, BridgeRunner};
use crate::domain::config::AppConfig;
use crate::domain::ports::KeyPort; // traitメソッド使用のため
use crate::infrastructure::csv_log::CsvLogAdapter;
use crate::infrastructure::serial_line::SerialLineAdapter;
use crate::logging::init_logging;
use anyhow::Context;
use crossbeam_channel::bounded;
use std::path::PathBuf;

#[cfg(windows)]
use crate::infrastructure::keyboard::SendInputKeyAdapter;
#[cfg(not(windows))]
use crate::infrastructure::mock_key::MockKeyAdapter;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("BigKahuna starting...");

    match run() {
        Ok(_) => {
            tracing::info!("BigKahuna terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> anyhow::Result<()> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Serial: port={}, baud={}, read_timeout={}ms, silent_after={} timeouts",
        config.serial.port,
        config.serial.baud_rate,
        config.serial.read_timeout_ms,
        config.serial.max_consecutive_timeouts
    );
    tracing::info!(
        "Bridge: key={:?}, policy={:?}, output={}, time_step={}ms",
        config.key.key,
        config.debounce.policy,
        config.log.output_path,
        config.log.time_step_ms
    );

    // Ctrl-Cハンドラの登録
    // ハンドラは専用スレッドで呼ばれるため、ループへはチャネルで通知する。
    // 2回目以降の押下はチャネルが埋まっていて無視される（次のポーリングで終了）。
    let (shutdown_tx, shutdown_rx) = bounded::<()>(1);
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    })
    .context("Failed to set Ctrl-C handler")?;

    // シリアル回線アダプタの初期化
    tracing::info!("Initializing serial line adapter...");
    let sensor = SerialLineAdapter::new(&config.serial)?;

    // キー送出アダプタの初期化（SendInputはWindows限定、他OSはモックで代替）
    #[cfg(windows)]
    let key = SendInputKeyAdapter::new();
    #[cfg(not(windows))]
    let key = MockKeyAdapter::new();
    tracing::info!("Key backend: {}", key.backend_name());

    // CSVログアダプタの初期化
    let sink = CsvLogAdapter::new(&config.log.output_path)?;

    // ブリッジの起動（ブロッキング、割り込みまたは致命的エラーまで戻らない）
    let bridge_config = BridgeConfig::from_app_config(&config)?;
    let runner = BridgeRunner::new(sensor, key, sink, bridge_config, shutdown_rx);

    runner.run().context("Bridge terminated abnormally")?;

    Ok(())
}
