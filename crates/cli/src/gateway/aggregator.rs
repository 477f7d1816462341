//! PipeAggregator - hands raddecs to an external aggregator as JSON lines
//!
//! 写入文件或 FIFO；聚合进程产出的 derived 事件经 `--derived-input` 回流。

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{Aggregator, Raddec};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct PipeAggregator {
    tx: mpsc::Sender<Raddec>,
    dropped: AtomicU64,
}

impl PipeAggregator {
    /// Open `path` for writing and start the writer task.
    ///
    /// The task returns the number of lines written once every sender is dropped.
    pub async fn create(
        path: &Path,
        capacity: usize,
    ) -> std::io::Result<(Self, JoinHandle<std::io::Result<u64>>)> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let name = path.display().to_string();

        info!(output = %name, "Aggregator output opened");
        let handle = tokio::spawn(write_lines(name, BufWriter::new(file), rx));

        Ok((
            Self {
                tx,
                dropped: AtomicU64::new(0),
            },
            handle,
        ))
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Aggregator for PipeAggregator {
    fn handle_raddec(&self, raddec: &Raddec) {
        if self.tx.try_send(raddec.clone()).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if dropped.is_power_of_two() {
                warn!(dropped, "Aggregator output backed up, raddec dropped");
            }
        }
    }
}

async fn write_lines<W>(
    name: String,
    mut writer: W,
    mut rx: mpsc::Receiver<Raddec>,
) -> std::io::Result<u64>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let mut written: u64 = 0;
    while let Some(raddec) = rx.recv().await {
        let mut line = serde_json::to_vec(&raddec)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        // FIFO 读端需要逐行可见
        writer.flush().await?;
        written += 1;
    }
    writer.shutdown().await?;
    debug!(output = %name, lines = written, "Aggregator output closed");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::IdentifierType;

    fn raddec(timestamp: u64) -> Raddec {
        Raddec {
            transmitter_id: "fee150bada55".into(),
            transmitter_id_type: IdentifierType::RND48,
            rssi_signature: vec![],
            timestamp,
            packets: vec![],
        }
    }

    #[tokio::test]
    async fn test_raddecs_written_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregator.ndjson");

        let (aggregator, handle) = PipeAggregator::create(&path, 8).await.unwrap();
        aggregator.handle_raddec(&raddec(1));
        aggregator.handle_raddec(&raddec(2));
        drop(aggregator);

        assert_eq!(handle.await.unwrap().unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Raddec> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines, vec![raddec(1), raddec(2)]);
    }

    #[tokio::test]
    async fn test_backed_up_output_drops_and_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregator.ndjson");

        // Writer task has not run yet: only the first raddec fits
        let (aggregator, handle) = PipeAggregator::create(&path, 1).await.unwrap();
        aggregator.handle_raddec(&raddec(1));
        aggregator.handle_raddec(&raddec(2));
        aggregator.handle_raddec(&raddec(3));
        assert_eq!(aggregator.dropped(), 2);
        drop(aggregator);

        assert_eq!(handle.await.unwrap().unwrap(), 1);
    }
}
