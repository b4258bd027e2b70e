use anyhow::Context;
use mongodb::{options::ClientOptions, Client as MongoDBClient};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tempfile::TempDir;

const STARTUP_RETRIES: usize = 20;

/// Ephemeral `mongod` listening only on a unix socket inside a tempdir.
/// The process is killed when the runner is dropped.
pub struct MongodRunner {
    child: Child,
    // removed together with the runner
    tempdir: TempDir,
}

fn socket_path(dir: &Path) -> anyhow::Result<PathBuf> {
    Ok(dir.canonicalize()?.join("mongod.sock"))
}

impl MongodRunner {
    pub async fn run() -> anyhow::Result<Self> {
        let tempdir = TempDir::new().context("Failed to create tempdir")?;
        let socket = socket_path(tempdir.path())?;
        let dir = tempdir.path().to_string_lossy().to_string();

        let child = Command::new("mongod")
            .args([
                "--unixSocketPrefix",
                &dir,
                "--dbpath",
                &dir,
                "--bind_ip",
                &socket.to_string_lossy(),
                "--port",
                "0",
            ])
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to start mongod")?;

        let runner = Self { child, tempdir };

        for _ in 0..STARTUP_RETRIES {
            if socket.exists() {
                log::info!("mongod is listening at {:?}", socket);
                return Ok(runner);
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        Err(anyhow::anyhow!("mongod did not create {:?} in time", socket))
    }

    pub fn socket(&self) -> anyhow::Result<PathBuf> {
        socket_path(self.tempdir.path())
    }

    pub fn client(&self) -> anyhow::Result<MongoDBClient> {
        let server_address = mongodb::options::ServerAddress::Unix {
            path: self.socket()?,
        };
        let client_options = ClientOptions::builder().hosts(vec![server_address]).build();
        Ok(MongoDBClient::with_options(client_options)?)
    }
}

impl Drop for MongodRunner {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
