//! Result sinks: append-only destinations for [`Record`]s.

use crate::Record;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;

pub type SinkHandle = Arc<dyn ResultSink + Send + Sync>;

/// Append-only record destination. Records arrive in completion order.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn emit(&self, record: &Record) -> Result<()>;
}

/// Keeps records in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}
impl MemorySink {
    pub async fn records(&self) -> Vec<Record> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn emit(&self, record: &Record) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Writes one JSON document per line, flushing after every record.
pub struct JsonLinesSink {
    out: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}
impl JsonLinesSink {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    /// Create (or truncate) a file to write records to.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).await.or_raise(|| ErrorKind::Sink)?;
        Ok(Self::new(BufWriter::new(file)))
    }

    fn new(out: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
        }
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn emit(&self, record: &Record) -> Result<()> {
        let mut line = serde_json::to_vec(record).or_raise(|| ErrorKind::Sink)?;
        line.push(b'\n');
        let mut out = self.out.lock().await;
        out.write_all(&line).await.or_raise(|| ErrorKind::Sink)?;
        out.flush().await.or_raise(|| ErrorKind::Sink)?;
        Ok(())
    }
}
