//! Utility functions for CLI operations.

use std::future::Future;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use devinfo_core::{ConnectionConfig, Device, RetryConfig};
use tokio::sync::watch;

use crate::style;

/// Get device identifier, with helpful error message.
pub fn require_device(device: Option<String>) -> Result<String> {
    device.ok_or_else(|| {
        anyhow::anyhow!(
            "No device specified. Use --device <NAME|ADDRESS> or set DEVINFO_DEVICE environment variable.\n\
             Run 'devinfo scan' to find nearby devices, or 'devinfo config set device <ID>' to set a default."
        )
    })
}

/// Build the connection settings for a command.
///
/// `timeout_secs` bounds the device search, then separately the connection
/// attempt. Reads are retried
/// `retries` times when set, never otherwise.
pub fn connection_config(timeout_secs: u64, retries: Option<u32>) -> ConnectionConfig {
    let read_retry = match retries {
        Some(n) if n > 0 => RetryConfig::for_read().max_retries(n),
        _ => RetryConfig::none(),
    };
    ConnectionConfig::default()
        .connection_timeout(Duration::from_secs(timeout_secs))
        .read_retry(read_retry)
}

/// Connect to a device, showing a spinner on an interactive terminal.
pub async fn connect_device(
    identifier: &str,
    config: ConnectionConfig,
    show_progress: bool,
) -> Result<Device> {
    let spinner = if show_progress && io::stderr().is_terminal() {
        Some(style::connecting_spinner(identifier))
    } else {
        None
    };

    let result = Device::connect_with_config(identifier, config).await;

    if let Some(sp) = spinner {
        sp.finish_and_clear();
    }

    result.map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to device: {}\n\nCause: {}\n\n\
             Possible causes:\n  \
             - Bluetooth may be disabled -- check system settings\n  \
             - Device may be out of range -- try moving closer\n  \
             - Device may be connected to another host\n  \
             - Device name or address may be incorrect -- run 'devinfo scan' to verify",
            identifier,
            e
        )
    })
}

/// Resolves once the watched peripheral reports a disconnect.
///
/// Never resolves if the watcher stops without one.
pub async fn until_disconnected(mut disconnected: watch::Receiver<bool>) {
    loop {
        if *disconnected.borrow_and_update() {
            return;
        }
        if disconnected.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Run a read against a connected device, failing if it disconnects first.
pub async fn read_until_disconnect<T, F>(device: &Device, operation: &str, read: F) -> Result<T>
where
    F: Future<Output = devinfo_core::Result<T>>,
{
    let disconnected = match device.watch_disconnect().await {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::debug!("Disconnect events unavailable: {}", e);
            None
        }
    };

    let Some(disconnected) = disconnected else {
        return read.await.with_context(|| format!("Failed to {}", operation));
    };

    tokio::select! {
        result = read => result.with_context(|| format!("Failed to {}", operation)),
        _ = until_disconnected(disconnected) => {
            bail!(
                "Device {} disconnected while trying to {}",
                device.address(),
                operation
            )
        }
    }
}

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_device_with_some() {
        let result = require_device(Some("AA:BB:CC:DD:EE:FF".to_string()));
        assert_eq!(result.unwrap(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_require_device_with_none() {
        let err = require_device(None).unwrap_err().to_string();
        assert!(err.contains("No device specified"));
        assert!(err.contains("DEVINFO_DEVICE"));
    }

    #[test]
    fn test_connection_config() {
        let config = connection_config(12, None);
        assert_eq!(config.connection_timeout, Duration::from_secs(12));
        assert_eq!(config.read_retry, RetryConfig::none());

        assert_eq!(connection_config(30, Some(0)).read_retry, RetryConfig::none());
        assert_eq!(connection_config(30, Some(4)).read_retry.max_retries, 4);
    }

    #[tokio::test]
    async fn test_until_disconnected_fires_on_true() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(until_disconnected(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn test_until_disconnected_already_disconnected() {
        let (_tx, rx) = watch::channel(true);
        tokio::time::timeout(Duration::from_secs(1), until_disconnected(rx))
            .await
            .expect("should resolve immediately");
    }

    #[tokio::test(start_paused = true)]
    async fn test_until_disconnected_pends_when_watcher_stops() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let result = tokio::time::timeout(Duration::from_secs(5), until_disconnected(rx)).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_write_output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        write_output(Some(&path), "> Model Number String: H10\n").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "> Model Number String: H10\n"
        );
    }
}
