//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、外部ライブラリ（serialport/SendInput）と接続する。

pub mod csv_log;
pub mod mock_key;
pub mod mock_serial;
pub mod serial_line;

// キー送出モジュール（SendInput APIのためWindows限定）
#[cfg(windows)]
pub mod keyboard;
