//! bluer-backed transport for the fridge session
//!
//! Adapts the BlueZ GATT API to the [`FridgeTransport`] seam: device
//! connection, service resolution, characteristic lookup by UUID, write-mode
//! discovery from characteristic flags, and a notification forwarding task.

use crate::session::{FridgeTransport, WriteCapabilities};
use crate::types::{FridgeError, Result};
use async_trait::async_trait;
use bluer::gatt::remote::{Characteristic, CharacteristicWriteRequest};
use bluer::gatt::WriteOp;
use bluer::{Adapter, Address, Device};
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Read/write characteristic of the fridge GATT service
pub const FRIDGE_RW_CHARACTERISTIC_UUID: &str = "00001235-0000-1000-8000-00805f9b34fb";

/// Notify characteristic of the fridge GATT service
pub const FRIDGE_NOTIFY_UUID: &str = "00001236-0000-1000-8000-00805f9b34fb";

/// Maximum seconds to wait for BlueZ to resolve GATT services
const SERVICE_RESOLVE_ATTEMPTS: u32 = 30;

fn ble_err(e: bluer::Error) -> FridgeError {
    FridgeError::Bluetooth(e.to_string())
}

/// BlueZ transport bound to one fridge device
pub struct BleFridgeTransport {
    device: Device,
    characteristics: Mutex<HashMap<String, Characteristic>>,
    listener_shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl BleFridgeTransport {
    /// Look the device up on the adapter by MAC address
    pub fn new(adapter: &Adapter, mac_address: &str) -> Result<Self> {
        let address: Address = mac_address.parse().map_err(|_| {
            FridgeError::Bluetooth(format!("Invalid MAC address: {}", mac_address))
        })?;
        let device = adapter.device(address).map_err(ble_err)?;

        Ok(Self {
            device,
            characteristics: Mutex::new(HashMap::new()),
            listener_shutdown: Mutex::new(None),
        })
    }

    fn characteristic(&self, uuid: &str) -> Result<Characteristic> {
        self.characteristics
            .lock()
            .unwrap()
            .get(&uuid.to_uppercase())
            .cloned()
            .ok_or_else(|| FridgeError::MissingCharacteristic(uuid.to_string()))
    }

    async fn wait_services_resolved(&self) -> Result<()> {
        for _ in 0..SERVICE_RESOLVE_ATTEMPTS {
            if self.device.is_services_resolved().await.map_err(ble_err)? {
                return Ok(());
            }
            sleep(Duration::from_secs(1)).await;
        }
        Err(FridgeError::Bluetooth(
            "Timeout waiting for GATT services to resolve".to_string(),
        ))
    }
}

#[async_trait]
impl FridgeTransport for BleFridgeTransport {
    async fn connect(&self) -> Result<()> {
        if self.device.is_connected().await.map_err(ble_err)? {
            debug!("Device already connected");
        } else {
            info!("Connecting to {}", self.device.address());
            self.device.connect().await.map_err(ble_err)?;
        }
        // Let the connection stabilize before GATT traffic
        sleep(Duration::from_millis(500)).await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.characteristics.lock().unwrap().clear();
        if self.device.is_connected().await.unwrap_or(false) {
            self.device.disconnect().await.map_err(ble_err)?;
        }
        Ok(())
    }

    async fn discover(&self) -> Result<WriteCapabilities> {
        self.wait_services_resolved().await?;

        let mut found = HashMap::new();
        for service in self.device.services().await.map_err(ble_err)? {
            for characteristic in service.characteristics().await.map_err(ble_err)? {
                let uuid = characteristic.uuid().await.map_err(ble_err)?;
                found.insert(uuid.to_string().to_uppercase(), characteristic);
            }
        }
        debug!("Discovered {} characteristics", found.len());
        *self.characteristics.lock().unwrap() = found;

        // Both protocol characteristics must exist before we can proceed
        let rw = self.characteristic(FRIDGE_RW_CHARACTERISTIC_UUID)?;
        self.characteristic(FRIDGE_NOTIFY_UUID)?;

        let flags = rw.flags().await.map_err(ble_err)?;
        Ok(WriteCapabilities {
            write: flags.write,
            write_without_response: flags.write_without_response,
        })
    }

    async fn write(&self, data: &[u8], with_response: bool) -> Result<()> {
        let characteristic = self.characteristic(FRIDGE_RW_CHARACTERISTIC_UUID)?;
        let op_type = if with_response {
            WriteOp::Request
        } else {
            WriteOp::Command
        };
        debug!("BLE write: {} bytes ({:?})", data.len(), op_type);
        characteristic
            .write_ext(
                data,
                &CharacteristicWriteRequest {
                    op_type,
                    ..Default::default()
                },
            )
            .await
            .map_err(ble_err)
    }

    async fn start_notifications(&self, sink: mpsc::Sender<Vec<u8>>) -> Result<()> {
        let characteristic = self.characteristic(FRIDGE_NOTIFY_UUID)?;
        let stream = characteristic.notify().await.map_err(ble_err)?;

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        if let Some(old) = self.listener_shutdown.lock().unwrap().replace(shutdown_tx) {
            let _ = old.try_send(());
        }

        tokio::spawn(async move {
            let mut stream = Box::pin(stream);
            loop {
                tokio::select! {
                    value = stream.next() => {
                        match value {
                            Some(bytes) => {
                                if let Err(e) = sink.send(bytes).await {
                                    error!("Notification sink closed: {}", e);
                                    break;
                                }
                            }
                            None => {
                                warn!("Notification stream ended");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!("Notification listener shutdown requested");
                        break;
                    }
                }
            }
        });

        info!("Notification stream active");
        Ok(())
    }

    async fn stop_notifications(&self) -> Result<()> {
        if let Some(tx) = self.listener_shutdown.lock().unwrap().take() {
            let _ = tx.try_send(());
        }
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.device.is_connected().await.unwrap_or(false)
    }
}
