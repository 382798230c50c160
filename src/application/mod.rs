//! Application Layer
//!
//! パイプライン制御、クリック判定、統計管理などのユースケースを実装します。
//!
//! ## モジュール構成
//! - `pipeline`: 単一スレッドのブリッジループ（読み取り/判定/送出/追記）
//! - `debounce`: ACTIVE区間ごとのクリックラッチ
//! - `watchdog`: 連続タイムアウトによるデバイス無応答検出
//! - `clock`: CSVのTimestamp列に使う固定ステップ疑似クロック
//! - `stats`: 統計情報管理（行数、クリック数、タイムアウト数）

pub mod clock;
pub mod debounce;
pub mod pipeline;
pub mod stats;
pub mod watchdog;
