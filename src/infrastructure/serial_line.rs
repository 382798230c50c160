/// シリアル回線アダプタ
///
/// serialportクレートを使用したシリアル接続センサーの読み取り実装。
/// 行単位の読み取りをタイムアウト付きで行い、未完成の行は次回呼び出しまで保持する。

use crate::domain::{DomainError, DomainResult, EndpointInfo, Reading, SensorPort, SerialConfig};
use serialport::SerialPort;
use std::io::{BufRead, BufReader, Read};

/// 改行なしで蓄積を許容する最大バイト数
///
/// 正常なレコードは数十バイトで収まる。CR-only改行のデバイスや
/// ボーレート不一致のノイズをこの上限で検出する。読み取り自体を
/// この予算で打ち切るため、無改行の連続送信でも1回の呼び出しで必ず戻る。
const MAX_PENDING_BYTES: usize = 4096;

/// シリアル回線アダプタ
///
/// BufReaderの内部バッファとは別に行バッファを持つ。
/// read_untilはタイムアウトで戻る前に受信済みの部分を行バッファへ
/// 追記するため、次回呼び出しで行の残りを継ぎ足せる。
pub struct SerialLineAdapter {
    /// 行単位読み取り用のバッファードリーダー
    reader: BufReader<Box<dyn SerialPort>>,
    /// 読み取り途中の行（タイムアウトをまたいで保持）
    line_buf: Vec<u8>,
    /// 接続先情報（ログ表示用）
    endpoint: EndpointInfo,
}

impl SerialLineAdapter {
    /// 新しいシリアル回線アダプタを作成
    ///
    /// # Arguments
    /// - `config`: シリアル接続設定（ポート名・ボーレート・読み取りタイムアウト）
    ///
    /// # Returns
    /// SerialLineAdapterインスタンス
    ///
    /// # Errors
    /// - ポートオープン失敗（デバイス未接続、権限不足、他プロセスが使用中）
    pub fn new(config: &SerialConfig) -> DomainResult<Self> {
        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|e| {
                DomainError::Initialization(format!(
                    "Failed to open serial port {}: {}",
                    config.port, e
                ))
            })?;

        tracing::info!(
            "Serial port opened: {} @ {} baud (read timeout: {}ms)",
            config.port,
            config.baud_rate,
            config.read_timeout_ms
        );

        Ok(Self {
            reader: BufReader::new(port),
            line_buf: Vec::new(),
            endpoint: EndpointInfo {
                name: config.port.clone(),
                baud_rate: config.baud_rate,
            },
        })
    }
}

/// 1レコード分の読み取り本体（任意のBufRead実装に対して動作）
///
/// 1回の呼び出しで読むのは行バッファの残り予算まで。予算を使い切っても
/// 改行が現れない行は不正として報告する。
///
/// # Returns
/// - `Ok(Some(Reading))`: 改行まで受信しパースに成功
/// - `Ok(None)`: タイムアウト（受信済みの部分はline_bufに保持）
/// - `Err(DomainError)`: 回線クローズ・入出力エラー・不正レコード・行長超過
fn read_next<R: BufRead>(
    reader: &mut R,
    line_buf: &mut Vec<u8>,
    endpoint_name: &str,
) -> DomainResult<Option<Reading>> {
    // 行バッファが上限+1バイトを超えないよう、読み取り量を残り予算で制限
    let budget = (MAX_PENDING_BYTES + 1).saturating_sub(line_buf.len()) as u64;

    match reader.take(budget).read_until(b'\n', line_buf) {
        // EOF: デバイス側が回線を閉じた（USB抜去等）
        Ok(0) => {
            if line_buf.is_empty() {
                Err(DomainError::Serial(format!(
                    "Serial stream closed by device ({})",
                    endpoint_name
                )))
            } else {
                // タイムアウトで持ち越した部分行を抱えたままの切断
                Err(DomainError::Serial(format!(
                    "Serial stream closed mid-line ({} bytes pending)",
                    line_buf.len()
                )))
            }
        }
        Ok(_) => {
            if line_buf.last() != Some(&b'\n') {
                if line_buf.len() > MAX_PENDING_BYTES {
                    // 予算を使い切った: 改行なしで送り続けるデバイス
                    return Err(DomainError::Serial(format!(
                        "Received {} bytes without a line terminator (check baud rate and line endings)",
                        line_buf.len()
                    )));
                }
                // 改行が届く前にEOFへ到達（切断直前の不完全な行）
                return Err(DomainError::Serial(format!(
                    "Serial stream closed mid-line ({} bytes pending)",
                    line_buf.len()
                )));
            }

            // 不正なUTF-8シーケンスはU+FFFDに置換して継続
            let line = String::from_utf8_lossy(line_buf).into_owned();
            line_buf.clear();

            let reading = Reading::parse(&line)?;
            Ok(Some(reading))
        }
        // タイムアウト: 読めた部分はline_bufに残っている（予算内に収まる）
        Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
        Err(e) => Err(DomainError::Serial(format!("Serial read failed: {}", e))),
    }
}

impl SensorPort for SerialLineAdapter {
    fn next_reading(&mut self) -> DomainResult<Option<Reading>> {
        read_next(&mut self.reader, &mut self.line_buf, &self.endpoint.name)
    }

    fn endpoint(&self) -> EndpointInfo {
        self.endpoint.clone()
    }
}
