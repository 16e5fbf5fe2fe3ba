//! The game-server command channel (C3): a length-prefixed request/response
//! TCP protocol behind a shared-secret handshake (§6). Exactly one owner at
//! a time, enforced by wrapping the connection in a `tokio::sync::Mutex`
//! held for the duration of a command or a batch — the teacher's pattern
//! for its single Neo4j/SQLite connection handle, generalized here to a
//! raw socket instead of a DB driver.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::error::InfraError;

pub struct CommandChannel {
    host: String,
    port: u16,
    password: String,
    command_delay: Duration,
    stream: Mutex<Option<TcpStream>>,
}

impl CommandChannel {
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>, command_delay: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            command_delay,
            stream: Mutex::new(None),
        }
    }

    async fn ensure_connected(&self, stream_guard: &mut Option<TcpStream>) -> Result<(), InfraError> {
        if stream_guard.is_some() {
            return Ok(());
        }
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| InfraError::command_channel(format!("connect failed: {e}")))?;
        write_frame(&mut stream, self.password.as_bytes()).await?;
        let ack = read_frame(&mut stream).await?;
        if ack != b"OK" {
            return Err(InfraError::command_channel("handshake rejected"));
        }
        *stream_guard = Some(stream);
        Ok(())
    }

    /// Send one command, waiting `command_delay` afterward to rate-limit the
    /// game server (§5, §6).
    pub async fn send(&self, command: &str) -> Result<String, InfraError> {
        let result = self.send_raw(command).await;
        tokio::time::sleep(self.command_delay).await;
        result
    }

    /// Send N commands back-to-back with no inter-command delay, for bulk
    /// placement (§6 "batch primitive"). Still holds the mutex for the whole
    /// batch so no other task can interleave commands mid-structure.
    pub async fn send_batch(&self, commands: &[String]) -> Result<Vec<String>, InfraError> {
        let mut guard = self.stream.lock().await;
        self.ensure_connected(&mut guard).await?;
        let mut responses = Vec::with_capacity(commands.len());
        for command in commands {
            let response = self.send_locked(&mut guard, command).await?;
            responses.push(response);
        }
        Ok(responses)
    }

    async fn send_raw(&self, command: &str) -> Result<String, InfraError> {
        let mut guard = self.stream.lock().await;
        self.ensure_connected(&mut guard).await?;
        self.send_locked(&mut guard, command).await
    }

    async fn send_locked(&self, guard: &mut Option<TcpStream>, command: &str) -> Result<String, InfraError> {
        let stream = guard.as_mut().expect("connection established by ensure_connected");
        match write_frame(stream, command.as_bytes()).await {
            Ok(()) => {}
            Err(e) => {
                *guard = None;
                return Err(e);
            }
        }
        match read_frame(stream).await {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }
}

async fn write_frame(stream: &mut TcpStream, payload: &[u8]) -> Result<(), InfraError> {
    let len = payload.len() as u32;
    stream
        .write_all(&len.to_be_bytes())
        .await
        .map_err(|e| InfraError::command_channel(format!("write failed: {e}")))?;
    stream
        .write_all(payload)
        .await
        .map_err(|e| InfraError::command_channel(format!("write failed: {e}")))?;
    Ok(())
}

async fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>, InfraError> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| InfraError::command_channel(format!("read failed: {e}")))?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream
        .read_exact(&mut buf)
        .await
        .map_err(|e| InfraError::command_channel(format!("read failed: {e}")))?;
    Ok(buf)
}

/// Builds the text commands §6 names, so generators never hand-assemble
/// command strings inline.
pub mod commands {
    pub fn setblock(x: i32, y: i32, z: i32, block: &str) -> String {
        format!("setblock {x} {y} {z} {block}")
    }

    pub fn fill(x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32, block: &str) -> String {
        format!("fill {x1} {y1} {z1} {x2} {y2} {z2} {block}")
    }

    pub fn tellraw_broadcast(json: &str) -> String {
        format!("tellraw @a {json}")
    }

    pub fn data_merge_block(x: i32, y: i32, z: i32, snbt: &str) -> String {
        format!("data merge block {x} {y} {z} {snbt}")
    }

    pub fn setworldspawn(x: i32, y: i32, z: i32) -> String {
        format!("setworldspawn {x} {y} {z}")
    }

    pub fn forceload_add(x1: i32, z1: i32, x2: i32, z2: i32) -> String {
        format!("forceload add {x1} {z1} {x2} {z2}")
    }

    pub fn forceload_remove(x1: i32, z1: i32, x2: i32, z2: i32) -> String {
        format!("forceload remove {x1} {z1} {x2} {z2}")
    }
}
