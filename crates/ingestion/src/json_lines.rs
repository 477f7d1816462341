//! JSON-lines 输入源
//!
//! 每行一个 JSON 事件；空行忽略，无法解析的行计数后跳过。

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};

type BoxedReader = BufReader<Box<dyn AsyncRead + Unpin + Send>>;

/// Line-delimited JSON event source
pub struct JsonLinesSource<R> {
    name: String,
    reader: R,
}

impl JsonLinesSource<BoxedReader> {
    /// 打开文件或 FIFO；`-` 表示标准输入
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();

        let inner: Box<dyn AsyncRead + Unpin + Send> = if name == "-" {
            Box::new(tokio::io::stdin())
        } else {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|error| IngestionError::OpenFailed {
                    source_name: name.clone(),
                    error,
                })?;
            Box::new(file)
        };

        Ok(Self::new(name, BufReader::new(inner)))
    }
}

impl<R: AsyncBufRead + Unpin + Send + 'static> JsonLinesSource<R> {
    /// 基于任意异步读取端创建
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self {
            name: name.into(),
            reader,
        }
    }

    /// 启动读取任务，返回事件接收端与任务句柄
    ///
    /// 任务在输入结束或接收端关闭时返回已转发的事件数。
    pub fn start<T>(
        self,
        channel_capacity: usize,
        metrics: Option<Arc<IngestionMetrics>>,
    ) -> (mpsc::Receiver<T>, JoinHandle<Result<u64>>)
    where
        T: DeserializeOwned + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(channel_capacity);
        let metrics = metrics.unwrap_or_default();
        let handle = tokio::spawn(self.pump(tx, metrics));
        (rx, handle)
    }

    async fn pump<T: DeserializeOwned>(
        self,
        tx: mpsc::Sender<T>,
        metrics: Arc<IngestionMetrics>,
    ) -> Result<u64> {
        let Self { name, reader } = self;
        let mut lines = reader.lines();
        let mut forwarded: u64 = 0;
        let mut line_no: u64 = 0;

        info!(source = %name, "JSON-lines source started");

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    return Err(IngestionError::ReadFailed {
                        source_name: name,
                        error,
                    })
                }
            };
            line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let event = match serde_json::from_str::<T>(trimmed) {
                Ok(event) => event,
                Err(e) => {
                    metrics.record_parse_error();
                    warn!(source = %name, line = line_no, error = %e, "Skipping malformed line");
                    continue;
                }
            };

            metrics.record_received();
            if tx.send(event).await.is_err() {
                debug!(source = %name, "Receiver closed");
                break;
            }
            forwarded += 1;
        }

        info!(source = %name, events = forwarded, "JSON-lines source finished");
        Ok(forwarded)
    }
}
