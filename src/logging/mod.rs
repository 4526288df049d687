//! File logging
//!
//! `env_logger` formats records on the calling thread and hands the bytes to a
//! channel; a single background service appends them to the configured file.

use std::io::{self, Write};
use std::path::Path;

use async_trait::async_trait;
use env_logger::Builder;
use log::LevelFilter;
use pingora::{
    server::{ListenFds, ShutdownWatch},
    services::Service,
};
use tokio::{
    fs::{create_dir_all, File, OpenOptions},
    io::{AsyncWriteExt, BufWriter},
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
};

use crate::config;

/// `io::Write` end of the log channel.
pub struct ChannelWriter {
    sender: UnboundedSender<Vec<u8>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sender
            .send(buf.to_vec())
            .map_err(|e| io::Error::new(io::ErrorKind::BrokenPipe, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Logger {
    sender: UnboundedSender<Vec<u8>>,
    receiver: UnboundedReceiver<Vec<u8>>,
    config: config::Log,
}

impl Logger {
    pub fn new(config: config::Log) -> Self {
        let (sender, receiver) = unbounded_channel::<Vec<u8>>();
        Self {
            sender,
            receiver,
            config,
        }
    }

    pub fn writer(&self) -> ChannelWriter {
        ChannelWriter {
            sender: self.sender.clone(),
        }
    }

    /// Install `env_logger` as the global logger, writing into this channel.
    ///
    /// `RUST_LOG` still applies on top of the default `info` level.
    pub fn init_env_logger(&self) {
        Builder::new()
            .filter_level(LevelFilter::Info)
            .parse_default_env()
            .target(env_logger::Target::Pipe(Box::new(self.writer())))
            .init();
    }

    async fn open_file(&self) -> io::Result<BufWriter<File>> {
        if let Some(parent) = Path::new(&self.config.path).parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.config.path)
            .await?;
        Ok(BufWriter::new(file))
    }

    /// Drain the channel into `file` until shutdown or until every sender is gone.
    async fn drain(&mut self, file: &mut BufWriter<File>, shutdown: &mut ShutdownWatch) {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                },

                data = self.receiver.recv() => match data {
                    Some(data) => {
                        if let Err(e) = file.write_all(&data).await {
                            eprintln!("Failed to write to log file {}: {e}", self.config.path);
                        }
                    }
                    None => break,
                },
            }
        }

        if let Err(e) = file.flush().await {
            eprintln!("Failed to flush log file {}: {e}", self.config.path);
        }
    }
}

#[async_trait]
impl Service for Logger {
    async fn start_service(&mut self, _fds: Option<ListenFds>, mut shutdown: ShutdownWatch) {
        let mut file = match self.open_file().await {
            Ok(file) => file,
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", self.config.path);
                return;
            }
        };
        self.drain(&mut file, &mut shutdown).await;
    }

    fn name(&self) -> &'static str {
        "log sync"
    }

    fn threads(&self) -> Option<usize> {
        Some(1)
    }
}
