//! Device status codes returned by the POLL command.

use std::fmt;

use serde::{Serialize, Serializer};

/// Defines a closed code table with an `Unknown` fallback, plus `u8` and string conversions.
macro_rules! code_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$var_meta:meta])* $var:ident = $code:literal => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$var_meta])* $var,)+
            /// Code outside of the documented table.
            Unknown(u8),
        }

        impl $name {
            /// Gets the wire code.
            pub const fn to_u8(self) -> u8 {
                match self {
                    $(Self::$var => $code,)+
                    Self::Unknown(code) => code,
                }
            }

            /// Gets a human-readable description of the code.
            pub const fn to_str(self) -> &'static str {
                match self {
                    $(Self::$var => $text,)+
                    Self::Unknown(_) => "unknown",
                }
            }
        }

        impl From<u8> for $name {
            fn from(code: u8) -> Self {
                match code {
                    $($code => Self::$var,)+
                    code => Self::Unknown(code),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(val: $name) -> Self {
                val.to_u8()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} (0x{:02x})", self.to_str(), self.to_u8())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.to_str())
            }
        }
    };
}

code_enum! {
    /// Operating state reported by the validator.
    Status {
        PowerUp = 0x10 => "power up",
        PowerUpWithBillInValidator = 0x11 => "power up with bill in validator",
        PowerUpWithBillInStacker = 0x12 => "power up with bill in stacker",
        Initialize = 0x13 => "initialize",
        Idling = 0x14 => "idling",
        Accepting = 0x15 => "accepting",
        Stacking = 0x17 => "stacking",
        Returning = 0x18 => "returning",
        UnitDisabled = 0x19 => "unit disabled",
        Holding = 0x1a => "holding",
        DeviceBusy = 0x1b => "device busy",
        /// Parameter holds a [RejectReason].
        Rejecting = 0x1c => "rejecting",
        DropCassetteFull = 0x41 => "drop cassette full",
        DropCassetteOutOfPosition = 0x42 => "drop cassette out of position",
        ValidatorJammed = 0x43 => "validator jammed",
        DropCassetteJammed = 0x44 => "drop cassette jammed",
        Cheated = 0x45 => "cheated",
        /// Parameter holds a [FailureCode].
        GenericFailure = 0x47 => "generic failure",
        /// Parameter holds the escrowed bill type.
        EscrowPosition = 0x80 => "escrow position",
        /// Parameter holds the stacked bill type.
        BillStacked = 0x81 => "bill stacked",
        /// Parameter holds the returned bill type.
        BillReturned = 0x82 => "bill returned",
    }
}

code_enum! {
    /// Reason a bill was rejected, reported with [Status::Rejecting].
    RejectReason {
        Insertion = 0x60 => "insertion",
        Magnetic = 0x61 => "magnetic",
        RemainedBillInHead = 0x62 => "remained bill in head",
        Multiplying = 0x63 => "multiplying",
        Conveying = 0x64 => "conveying",
        Identification = 0x65 => "identification",
        Verification = 0x66 => "verification",
        Optic = 0x67 => "optic",
        Inhibit = 0x68 => "inhibit",
        Capacity = 0x69 => "capacity",
        Operation = 0x6a => "operation",
        Length = 0x6c => "length",
    }
}

code_enum! {
    /// Hardware failure, reported with [Status::GenericFailure].
    FailureCode {
        StackMotor = 0x50 => "stack motor failure",
        TransportMotorSpeed = 0x51 => "transport motor speed failure",
        TransportMotor = 0x52 => "transport motor failure",
        AligningMotor = 0x53 => "aligning motor failure",
        InitialCassetteStatus = 0x54 => "initial cassette status failure",
        OpticCanal = 0x55 => "optic canal failure",
        MagneticCanal = 0x56 => "magnetic canal failure",
        CapacitanceCanal = 0x5f => "capacitance canal failure",
    }
}

/// Decoded POLL response: a [Status] plus its one-byte parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DeviceStatus {
    status: Status,
    param: u8,
}

impl DeviceStatus {
    /// Creates a new [DeviceStatus].
    pub const fn new(status: Status, param: u8) -> Self {
        Self { status, param }
    }

    /// Decodes a POLL payload. A missing parameter byte defaults to zero.
    ///
    /// Returns `None` for an empty payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let status = Status::from(*payload.first()?);
        let param = payload.get(1).copied().unwrap_or(0);

        Some(Self::new(status, param))
    }

    pub const fn status(&self) -> Status {
        self.status
    }

    /// Raw parameter byte.
    pub const fn param(&self) -> u8 {
        self.param
    }

    /// Rejection reason, when the device is rejecting a bill.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        (self.status == Status::Rejecting).then(|| RejectReason::from(self.param))
    }

    /// Failure code, when the device reports a generic failure.
    pub fn failure(&self) -> Option<FailureCode> {
        (self.status == Status::GenericFailure).then(|| FailureCode::from(self.param))
    }

    /// Bill type held in escrow, stacked, or returned.
    pub fn bill_type(&self) -> Option<u8> {
        matches!(
            self.status,
            Status::EscrowPosition | Status::BillStacked | Status::BillReturned
        )
        .then_some(self.param)
    }

    /// Whether the device is in a jammed, cheated or failed state.
    pub fn is_fault(&self) -> bool {
        matches!(
            self.status,
            Status::DropCassetteFull
                | Status::DropCassetteOutOfPosition
                | Status::ValidatorJammed
                | Status::DropCassetteJammed
                | Status::Cheated
                | Status::GenericFailure
        )
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(reason) = self.reject_reason() {
            write!(f, "{}: {reason}", self.status)
        } else if let Some(failure) = self.failure() {
            write!(f, "{}: {failure}", self.status)
        } else if let Some(bill) = self.bill_type() {
            write!(f, "{}: bill type {bill}", self.status)
        } else {
            write!(f, "{}", self.status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Status::from(0x14), Status::Idling);
        assert_eq!(Status::from(0x1c), Status::Rejecting);
        assert_eq!(Status::from(0x82), Status::BillReturned);
        assert_eq!(Status::from(0x16), Status::Unknown(0x16));
        assert_eq!(u8::from(Status::Unknown(0x16)), 0x16);
        assert_eq!(Status::Holding.to_u8(), 0x1a);
    }

    #[test]
    fn test_device_status_from_payload() {
        assert_eq!(
            DeviceStatus::from_payload(&[0x14]),
            Some(DeviceStatus::new(Status::Idling, 0))
        );
        assert_eq!(
            DeviceStatus::from_payload(&[0x80, 0x05, 0xff]),
            Some(DeviceStatus::new(Status::EscrowPosition, 5))
        );
        assert_eq!(DeviceStatus::from_payload(&[]), None);
    }

    #[test]
    fn test_device_status_params() {
        let rejecting = DeviceStatus::new(Status::Rejecting, 0x68);
        assert_eq!(rejecting.reject_reason(), Some(RejectReason::Inhibit));
        assert_eq!(rejecting.failure(), None);
        assert_eq!(rejecting.bill_type(), None);

        let failure = DeviceStatus::new(Status::GenericFailure, 0x5f);
        assert_eq!(failure.failure(), Some(FailureCode::CapacitanceCanal));
        assert!(failure.is_fault());

        let stacked = DeviceStatus::new(Status::BillStacked, 3);
        assert_eq!(stacked.bill_type(), Some(3));
        assert!(!stacked.is_fault());
    }

    #[test]
    fn test_device_status_display() {
        assert_eq!(
            DeviceStatus::new(Status::Rejecting, 0x61).to_string(),
            "rejecting (0x1c): magnetic (0x61)"
        );
        assert_eq!(
            DeviceStatus::new(Status::Idling, 0).to_string(),
            "idling (0x14)"
        );
    }

    #[test]
    fn test_device_status_json() -> serde_json::Result<()> {
        let json = serde_json::to_string(&DeviceStatus::new(Status::EscrowPosition, 2))?;
        assert_eq!(json, r#"{"status":"escrow position","param":2}"#);

        Ok(())
    }
}
