use std::fmt;

use rumqttc::QoS;

use crate::utils::Error;

/// Acknowledgement guarantee requested for a publish or subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeliveryLevel {
    #[default]
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

impl DeliveryLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            DeliveryLevel::AtMostOnce => 0,
            DeliveryLevel::AtLeastOnce => 1,
            DeliveryLevel::ExactlyOnce => 2,
        }
    }
}

impl TryFrom<u8> for DeliveryLevel {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DeliveryLevel::AtMostOnce),
            1 => Ok(DeliveryLevel::AtLeastOnce),
            2 => Ok(DeliveryLevel::ExactlyOnce),
            other => Err(Error::InvalidQos(other)),
        }
    }
}

impl From<DeliveryLevel> for QoS {
    fn from(level: DeliveryLevel) -> Self {
        match level {
            DeliveryLevel::AtMostOnce => QoS::AtMostOnce,
            DeliveryLevel::AtLeastOnce => QoS::AtLeastOnce,
            DeliveryLevel::ExactlyOnce => QoS::ExactlyOnce,
        }
    }
}

impl fmt::Display for DeliveryLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "qos{}", self.as_u8())
    }
}
