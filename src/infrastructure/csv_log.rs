/// CSVログアダプタ
///
/// 観測レコードをCSVファイルへ追記する実装。
/// 中断時のデータ損失を避けるため、1行ごとにフラッシュする
/// （スループットより耐障害性を優先）。

use crate::domain::{
    csv_header_line, record_to_csv_line, DomainError, DomainResult, LogRecord, RecordSink,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSVログアダプタ
pub struct CsvLogAdapter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl CsvLogAdapter {
    /// 新しいCSVログアダプタを作成
    ///
    /// 出力ファイルを新規作成し（既存ファイルは上書き）、ヘッダ行を書き込む。
    ///
    /// # Arguments
    /// - `path`: CSV出力先パス
    ///
    /// # Errors
    /// - ファイル作成失敗（ディレクトリ不在・権限不足）
    /// - ヘッダ書き込み失敗
    pub fn new<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .map_err(|e| DomainError::Log(format!("Failed to create {}: {}", path.display(), e)))?;

        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", csv_header_line())
            .and_then(|_| writer.flush())
            .map_err(|e| DomainError::Log(format!("Failed to write CSV header: {}", e)))?;

        tracing::info!("CSV log opened: {}", path.display());

        Ok(Self { writer, path })
    }
}

impl RecordSink for CsvLogAdapter {
    fn append(&mut self, record: &LogRecord) -> DomainResult<()> {
        writeln!(self.writer, "{}", record_to_csv_line(record))
            .and_then(|_| self.writer.flush())
            .map_err(|e| DomainError::Log(format!("Failed to append CSV row: {}", e)))
    }

    fn destination(&self) -> String {
        self.path.display().to_string()
    }
}
