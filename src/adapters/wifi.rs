//! WiFi station-mode link.
//!
//! Brought up once at boot, before the MQTT client exists.  The connect
//! attempt is bounded by [`CONNECT_TIMEOUT_MS`]; a device that cannot
//! join the network still runs, but its self-test will fail the
//! communication check.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `BlockingWifi<EspWifi>` from `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use log::{error, info, warn};

use crate::config::WifiConfig;
use crate::error::CommsError;

/// Association + DHCP must finish within this window.
pub const CONNECT_TIMEOUT_MS: u32 = 15_000;

const POLL_MS: u32 = 250;

// ───────────────────────────────────────────────────────────────
// ESP-IDF implementation
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
mod platform {
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::modem::Modem;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;
    use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

    use super::*;

    pub struct WifiLink {
        wifi: BlockingWifi<EspWifi<'static>>,
    }

    impl WifiLink {
        pub fn connect(
            cfg: &WifiConfig,
            modem: Modem,
            sysloop: EspSystemEventLoop,
            nvs: Option<EspDefaultNvsPartition>,
        ) -> Result<Self, CommsError> {
            let driver = EspWifi::new(modem, sysloop.clone(), nvs).map_err(|e| {
                error!("WiFi: driver init failed: {}", e);
                CommsError::WifiConnectFailed
            })?;
            let mut wifi = BlockingWifi::wrap(driver, sysloop).map_err(|e| {
                error!("WiFi: event loop wrap failed: {}", e);
                CommsError::WifiConnectFailed
            })?;

            let auth_method = if cfg.key.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            };
            let client = ClientConfiguration {
                ssid: cfg
                    .ssid
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                password: cfg
                    .key
                    .as_str()
                    .try_into()
                    .map_err(|_| CommsError::WifiConnectFailed)?,
                auth_method,
                ..Default::default()
            };
            wifi.set_configuration(&Configuration::Client(client))
                .and_then(|()| wifi.start())
                .map_err(|e| {
                    error!("WiFi: start failed: {}", e);
                    CommsError::WifiConnectFailed
                })?;

            info!("WiFi: connecting to '{}'", cfg.ssid);
            wifi.wifi_mut().connect().map_err(|e| {
                error!("WiFi: connect request failed: {}", e);
                CommsError::WifiConnectFailed
            })?;

            let mut waited = 0;
            while !wifi.is_connected().unwrap_or(false) {
                if waited >= CONNECT_TIMEOUT_MS {
                    warn!("WiFi: no association after {} ms", CONNECT_TIMEOUT_MS);
                    return Err(CommsError::WifiTimeout);
                }
                FreeRtos::delay_ms(POLL_MS);
                waited += POLL_MS;
            }
            wifi.wait_netif_up().map_err(|e| {
                warn!("WiFi: no IP address: {}", e);
                CommsError::WifiTimeout
            })?;

            if let Ok(ip) = wifi.wifi().sta_netif().get_ip_info() {
                info!("WiFi: connected, ip {}", ip.ip);
            }
            Ok(Self { wifi })
        }

        pub fn is_connected(&self) -> bool {
            self.wifi.is_connected().unwrap_or(false)
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod platform {
    use core::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    static SIM_AP_REACHABLE: AtomicBool = AtomicBool::new(true);

    /// Make the simulated access point (un)reachable.
    pub fn sim_set_ap_reachable(reachable: bool) {
        SIM_AP_REACHABLE.store(reachable, Ordering::Relaxed);
    }

    pub struct WifiLink {
        connected: bool,
    }

    impl WifiLink {
        pub fn connect(cfg: &WifiConfig) -> Result<Self, CommsError> {
            if cfg.ssid.is_empty() {
                error!("WiFi(sim): no SSID configured");
                return Err(CommsError::WifiConnectFailed);
            }
            if !SIM_AP_REACHABLE.load(Ordering::Relaxed) {
                warn!("WiFi(sim): '{}' not reachable within {} ms", cfg.ssid, CONNECT_TIMEOUT_MS);
                return Err(CommsError::WifiTimeout);
            }
            info!("WiFi(sim): connected to '{}' (poll {} ms)", cfg.ssid, POLL_MS);
            Ok(Self { connected: true })
        }

        pub fn is_connected(&self) -> bool {
            self.connected
        }
    }
}

pub use platform::*;
