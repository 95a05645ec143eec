//! Response frame classification

use crate::esv::ServiceCode;
use crate::reader::{FrameReader, ESV_OFFSET};
use bytes::Bytes;
use echonet_core::{bytes_to_hex, hex_to_bytes, EchonetResult};
use std::fmt;

/// Sentinel text for "no data received"
pub const NO_DATA_SENTINEL: &str = "nothing";

/// Payload reported for replies that carry no usable value
pub const FALLBACK_PAYLOAD: [u8; 2] = [0x00, 0x00];

/// Shortest frame that holds an ESV byte
const MIN_CLASSIFIABLE_LENGTH: usize = ESV_OFFSET + 1;

/// Classified reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseFrame {
    /// Timeout or empty datagram
    NoReply,
    /// Too short to hold a service code
    MalformedTooShort,
    /// The device rejected the request (ESV 0x5X)
    ApplicationError { code: ServiceCode },
    /// Write acknowledged (ESV 0x71); payload is the first property's PDC
    SetAck { payload: Bytes },
    /// Read answered (ESV 0x72); payload is the first property's EDT
    GetAck { payload: Bytes },
    /// Response class (ESV 0x7X) other than Set_Res or Get_Res
    UnknownServiceCode { code: ServiceCode },
    /// Any other service code
    Unhandled { code: ServiceCode },
}

impl ResponseFrame {
    /// Classify raw reply bytes
    pub fn classify(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return ResponseFrame::NoReply;
        }

        let reader = FrameReader::new(raw);
        let Some(esv) = reader.esv() else {
            return ResponseFrame::MalformedTooShort;
        };

        if esv.is_error() {
            return ResponseFrame::ApplicationError { code: esv };
        }
        if !esv.is_response() {
            return ResponseFrame::Unhandled { code: esv };
        }

        match esv.kind() {
            0x1 => ResponseFrame::SetAck {
                payload: reader
                    .pdc()
                    .map(|pdc| Bytes::copy_from_slice(&[pdc]))
                    .unwrap_or_default(),
            },
            0x2 => match reader.edt() {
                Some(edt) => ResponseFrame::GetAck {
                    payload: Bytes::copy_from_slice(edt),
                },
                None => ResponseFrame::MalformedTooShort,
            },
            _ => ResponseFrame::UnknownServiceCode { code: esv },
        }
    }

    /// Classify a reply given in hex form
    ///
    /// Empty text and the `"nothing"` sentinel mean no reply; 21 characters
    /// or fewer is too short to classify.
    ///
    /// # Errors
    /// Returns `EchonetError::Decode` for text that is long enough but not
    /// valid hex
    pub fn classify_hex(raw: &str) -> EchonetResult<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == NO_DATA_SENTINEL {
            return Ok(ResponseFrame::NoReply);
        }
        if raw.len() < MIN_CLASSIFIABLE_LENGTH * 2 {
            return Ok(ResponseFrame::MalformedTooShort);
        }
        Ok(Self::classify(&hex_to_bytes(raw)?))
    }

    /// Payload of an acknowledged reply
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            ResponseFrame::SetAck { payload } | ResponseFrame::GetAck { payload } => Some(payload),
            _ => None,
        }
    }

    /// Payload of an acknowledged reply, or `FALLBACK_PAYLOAD`
    pub fn payload_or_fallback(&self) -> &[u8] {
        self.payload().unwrap_or(&FALLBACK_PAYLOAD)
    }

    pub fn is_ack(&self) -> bool {
        matches!(self, ResponseFrame::SetAck { .. } | ResponseFrame::GetAck { .. })
    }
}

impl fmt::Display for ResponseFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseFrame::NoReply => f.write_str("no reply"),
            ResponseFrame::MalformedTooShort => f.write_str("malformed (too short)"),
            ResponseFrame::ApplicationError { code } => {
                write!(f, "application error ({})", LabelledCode(*code))
            }
            ResponseFrame::SetAck { payload } => write!(f, "Set_Res [{}]", bytes_to_hex(payload)),
            ResponseFrame::GetAck { payload } => write!(f, "Get_Res [{}]", bytes_to_hex(payload)),
            ResponseFrame::UnknownServiceCode { code } => {
                write!(f, "unknown response ({})", LabelledCode(*code))
            }
            ResponseFrame::Unhandled { code } => {
                write!(f, "unhandled service ({})", LabelledCode(*code))
            }
        }
    }
}

/// `ESV=51 SetC_SNA`, or just `ESV=5F` for codes without a name
struct LabelledCode(ServiceCode);

impl fmt::Display for LabelledCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.name() {
            Some(name) => write!(f, "ESV={} {}", self.0, name),
            None => write!(f, "ESV={}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use echonet_core::{DecodedValue, EchonetError};

    #[test]
    fn test_no_reply() {
        assert_eq!(ResponseFrame::classify_hex("").unwrap(), ResponseFrame::NoReply);
        assert_eq!(ResponseFrame::classify_hex("nothing").unwrap(), ResponseFrame::NoReply);
        assert_eq!(ResponseFrame::classify(&[]), ResponseFrame::NoReply);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            ResponseFrame::classify_hex("108100010EF0010EF001").unwrap(),
            ResponseFrame::MalformedTooShort
        );
        assert_eq!(
            ResponseFrame::classify_hex("108100010EF0010EF0017").unwrap(),
            ResponseFrame::MalformedTooShort
        );
        assert_eq!(ResponseFrame::classify(&[0x10; 10]), ResponseFrame::MalformedTooShort);
    }

    #[test]
    fn test_set_ack() {
        let frame = ResponseFrame::classify_hex("108100010EF0010EF00171018000").unwrap();
        assert_eq!(frame, ResponseFrame::SetAck { payload: Bytes::from_static(&[0x00]) });

        let frame = ResponseFrame::classify_hex("108100010EF0010EF0017101800A").unwrap();
        assert_eq!(frame.payload(), Some(&[0x0A][..]));
        assert_eq!(bytes_to_hex(frame.payload_or_fallback()), "0A");
    }

    #[test]
    fn test_get_ack() {
        let frame = ResponseFrame::classify_hex("108100010EF0010EF001720180020102").unwrap();
        assert_eq!(
            frame,
            ResponseFrame::GetAck { payload: Bytes::from_static(&[0x01, 0x02]) }
        );
        assert_eq!(
            DecodedValue::from_payload(frame.payload().unwrap()),
            Some(DecodedValue::Number(258))
        );
    }

    #[test]
    fn test_get_ack_without_pdc_is_malformed() {
        assert_eq!(
            ResponseFrame::classify_hex("108100010EF0010EF0017201").unwrap(),
            ResponseFrame::MalformedTooShort
        );
    }

    #[test]
    fn test_application_error() {
        let frame = ResponseFrame::classify_hex("108100010EF0010EF00151018000").unwrap();
        match &frame {
            ResponseFrame::ApplicationError { code } => assert_eq!(code.to_string(), "51"),
            other => panic!("unexpected classification: {}", other),
        }
        assert_eq!(frame.payload(), None);
    }

    #[test]
    fn test_unknown_response_and_unhandled() {
        assert_eq!(
            ResponseFrame::classify_hex("108100010EF0010EF00173018000").unwrap(),
            ResponseFrame::UnknownServiceCode { code: ServiceCode::INF }
        );
        let frame = ResponseFrame::classify_hex("108100010EF0010EF00162018000").unwrap();
        assert_eq!(frame, ResponseFrame::Unhandled { code: ServiceCode::GET });
        assert_eq!(frame.payload_or_fallback(), &FALLBACK_PAYLOAD);
        assert!(!frame.is_ack());
    }

    #[test]
    fn test_display_names_service_codes() {
        assert_eq!(
            ResponseFrame::ApplicationError { code: ServiceCode::SET_C_SNA }.to_string(),
            "application error (ESV=51 SetC_SNA)"
        );
        assert_eq!(
            ResponseFrame::Unhandled { code: ServiceCode::GET }.to_string(),
            "unhandled service (ESV=62 Get)"
        );
        assert_eq!(
            ResponseFrame::UnknownServiceCode { code: ServiceCode::new(0x7F) }.to_string(),
            "unknown response (ESV=7F)"
        );
    }

    #[test]
    fn test_invalid_hex() {
        assert!(matches!(
            ResponseFrame::classify_hex("108100010EF0010EF00172018002010Z"),
            Err(EchonetError::Decode(_))
        ));
    }
}
