use serde::{Deserialize, Serialize};

/// Gravity along the sensor Z axis, assumed for a device at rest.
pub const DEFAULT_ACC_Z: f64 = 9.81;

/// One inertial reading: angular rate and linear acceleration.
///
/// Units are whatever the client sends; the server never converts them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImuSample {
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            gyro_x: 0.0,
            gyro_y: 0.0,
            gyro_z: 0.0,
            acc_x: 0.0,
            acc_y: 0.0,
            acc_z: DEFAULT_ACC_Z,
        }
    }
}

impl ImuSample {
    /// Gyroscope [x, y, z].
    pub fn gyroscope(&self) -> [f64; 3] {
        [self.gyro_x, self.gyro_y, self.gyro_z]
    }

    /// Accelerometer [x, y, z].
    pub fn accelerometer(&self) -> [f64; 3] {
        [self.acc_x, self.acc_y, self.acc_z]
    }

    /// All six components in wire order: gyroscope then accelerometer.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
            self.acc_x,
            self.acc_y,
            self.acc_z,
        ]
    }
}

/// Inbound payload before defaults are applied.
///
/// Any key outside the six sample fields is rejected here. A key may be
/// absent, but a key that is present must hold a number; `null` is refused.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct SampleFields {
    #[serde(default, deserialize_with = "present_number")]
    pub gyro_x: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub gyro_y: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub gyro_z: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub acc_x: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub acc_y: Option<f64>,
    #[serde(default, deserialize_with = "present_number")]
    pub acc_z: Option<f64>,
}

/// Only called for keys that are present, so `None` means "absent".
fn present_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    f64::deserialize(deserializer).map(Some)
}

impl SampleFields {
    /// Merge against the default sample; missing fields take default values.
    pub fn into_sample(self) -> ImuSample {
        let d = ImuSample::default();
        ImuSample {
            gyro_x: self.gyro_x.unwrap_or(d.gyro_x),
            gyro_y: self.gyro_y.unwrap_or(d.gyro_y),
            gyro_z: self.gyro_z.unwrap_or(d.gyro_z),
            acc_x: self.acc_x.unwrap_or(d.acc_x),
            acc_y: self.acc_y.unwrap_or(d.acc_y),
            acc_z: self.acc_z.unwrap_or(d.acc_z),
        }
    }
}

/// Reply sent once per accepted sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgment {
    /// Always [`Acknowledgment::RECEIVED`].
    pub status: String,
    /// Server monotonic clock in seconds, as decimal text.
    pub timestamp: String,
}

impl Acknowledgment {
    pub const RECEIVED: &'static str = "received";

    /// Build an acknowledgment stamped with `host_timestamp_s`.
    pub fn received(host_timestamp_s: f64) -> Self {
        Self {
            status: Self::RECEIVED.to_string(),
            timestamp: host_timestamp_s.to_string(),
        }
    }
}
