//! End device registration
//!
//! Creates a fresh OTAA identity and pushes it to the identity, network,
//! application and join servers in that order. Not idempotent: every run
//! draws new EUIs and keys. A failure part way leaves the earlier
//! components configured; nothing is rolled back.

use crate::config::Config;
use crate::lorawan::{c_hex_literals, DeviceKeys};
use crate::setup::sanitize_app_name;
use crate::ttn::types::{
    ApplicationIdentifiers, EndDevice, EndDeviceIdentifiers, EndDeviceRequest, KeyEnvelope,
    MacSettings, RootKeys,
};
use crate::ttn::{ApiError, Component, TtnClient};
use rand::RngCore;
use tracing::{debug, info, instrument};

/// A device identity that is about to be (or has been) registered
#[derive(Debug, Clone)]
pub struct Registration {
    pub app_id: String,
    pub device_id: String,
    pub keys: DeviceKeys,
}

impl Registration {
    /// Draw new keys for a device of application `app_name`.
    ///
    /// Without `device_name` the device id is the lowercase hex DevEUI.
    pub fn new<R: RngCore + ?Sized>(app_name: &str, device_name: Option<String>, rng: &mut R) -> Self {
        let keys = DeviceKeys::generate(rng);
        let device_id = device_name.unwrap_or_else(|| keys.default_device_id());
        let app_id = sanitize_app_name(app_name);

        debug!(
            "AppEUI: {}, DeviceEUI: {}, DeviceID: {}",
            keys.join_eui, keys.dev_eui, device_id
        );

        Self {
            app_id,
            device_id,
            keys,
        }
    }

    fn ids(&self) -> EndDeviceIdentifiers {
        EndDeviceIdentifiers {
            device_id: self.device_id.clone(),
            application_ids: ApplicationIdentifiers {
                application_id: self.app_id.clone(),
            },
            dev_eui: self.keys.dev_eui.to_string(),
            join_eui: self.keys.join_eui.to_string(),
        }
    }

    /// Lines to paste into the device firmware
    pub fn firmware_snippet(&self) -> String {
        format!(
            "Configure your device!\nOTAA_DEVEUI {}\nOTAA_APPEUI {}\nOTAA_APPKEY {}\n",
            c_hex_literals(self.keys.dev_eui.as_bytes()),
            c_hex_literals(self.keys.join_eui.as_bytes()),
            c_hex_literals(self.keys.app_key.as_bytes()),
        )
    }

    /// Identity server: the registry entry, pointing at the cluster servers
    fn registry_request(&self, config: &Config) -> Result<EndDeviceRequest, ApiError> {
        let server = &config.api.server_address;
        let device = EndDevice {
            network_server_address: Some(server.clone()),
            application_server_address: Some(server.clone()),
            join_server_address: Some(server.clone()),
            ..EndDevice::new(self.ids())
        };
        Ok(EndDeviceRequest::create(device)?)
    }

    /// Network server: radio and MAC parameters
    fn network_server_request(&self, config: &Config) -> Result<EndDeviceRequest, ApiError> {
        let dev = &config.device;
        let device = EndDevice {
            frequency_plan_id: Some(dev.frequency_plan_id.clone()),
            lorawan_version: Some(dev.lorawan_version.clone()),
            lorawan_phy_version: Some(dev.lorawan_phy_version.clone()),
            supports_join: Some(true),
            multicast: Some(false),
            supports_class_b: Some(false),
            supports_class_c: Some(false),
            mac_settings: Some(MacSettings {
                rx2_data_rate_index: dev.rx2_data_rate_index,
                rx2_frequency: dev.rx2_frequency.to_string(),
            }),
            ..EndDevice::new(self.ids())
        };
        Ok(EndDeviceRequest::update(device)?)
    }

    /// Application server: identifiers only
    fn application_server_request(&self) -> Result<EndDeviceRequest, ApiError> {
        Ok(EndDeviceRequest::update(EndDevice::new(self.ids()))?)
    }

    /// Join server: root key plus where to hand the session keys
    fn join_server_request(&self, config: &Config) -> Result<EndDeviceRequest, ApiError> {
        let server = &config.api.server_address;
        let device = EndDevice {
            network_server_address: Some(server.clone()),
            application_server_address: Some(server.clone()),
            root_keys: Some(RootKeys {
                app_key: KeyEnvelope {
                    key: self.keys.app_key.to_hex_upper(),
                },
            }),
            ..EndDevice::new(self.ids())
        };
        Ok(EndDeviceRequest::update(device)?)
    }
}

/// Register `registration` with every TTN component.
///
/// Stops at the first failing call; later components are not contacted.
#[instrument(skip_all, fields(app_id = %registration.app_id, device_id = %registration.device_id))]
pub async fn register_device(
    client: &TtnClient,
    registration: &Registration,
    config: &Config,
) -> Result<(), ApiError> {
    let app_id = registration.app_id.as_str();
    let device_id = registration.device_id.as_str();

    client
        .create_end_device(app_id, &registration.registry_request(config)?)
        .await?;
    debug!("Device created in registry");

    client
        .set_end_device(
            Component::NetworkServer,
            app_id,
            device_id,
            &registration.network_server_request(config)?,
        )
        .await?;
    debug!("Network server configured");

    client
        .set_end_device(
            Component::ApplicationServer,
            app_id,
            device_id,
            &registration.application_server_request()?,
        )
        .await?;
    debug!("Application server configured");

    client
        .set_end_device(
            Component::JoinServer,
            app_id,
            device_id,
            &registration.join_server_request(config)?,
        )
        .await?;

    info!("Device added.");
    Ok(())
}
