//! ECHONET Lite service codes (ESV)

use std::fmt;

/// Service code byte of a frame
///
/// The high nibble gives the class: `6` requests, `7` responses and
/// notifications, `5` "service not available" error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceCode(u8);

impl ServiceCode {
    /// Property write request, no response
    pub const SET_I: ServiceCode = ServiceCode(0x60);
    /// Property write request, response required
    pub const SET_C: ServiceCode = ServiceCode(0x61);
    /// Property read request
    pub const GET: ServiceCode = ServiceCode(0x62);
    /// Property notification request
    pub const INF_REQ: ServiceCode = ServiceCode(0x63);
    /// Property write response
    pub const SET_RES: ServiceCode = ServiceCode(0x71);
    /// Property read response
    pub const GET_RES: ServiceCode = ServiceCode(0x72);
    /// Property notification
    pub const INF: ServiceCode = ServiceCode(0x73);
    /// Property write (SetC) not available
    pub const SET_C_SNA: ServiceCode = ServiceCode(0x51);
    /// Property read not available
    pub const GET_SNA: ServiceCode = ServiceCode(0x52);

    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// High nibble of the code
    pub fn class(&self) -> u8 {
        self.0 >> 4
    }

    /// Low nibble of the code
    pub fn kind(&self) -> u8 {
        self.0 & 0x0F
    }

    pub fn is_error(&self) -> bool {
        self.class() == 0x5
    }

    pub fn is_response(&self) -> bool {
        self.class() == 0x7
    }

    /// Symbolic name for the codes this client knows
    pub fn name(&self) -> Option<&'static str> {
        let name = match self.0 {
            0x50 => "SetI_SNA",
            0x51 => "SetC_SNA",
            0x52 => "Get_SNA",
            0x53 => "INF_SNA",
            0x5E => "SetGet_SNA",
            0x60 => "SetI",
            0x61 => "SetC",
            0x62 => "Get",
            0x63 => "INF_REQ",
            0x6E => "SetGet",
            0x71 => "Set_Res",
            0x72 => "Get_Res",
            0x73 => "INF",
            0x74 => "INFC",
            0x7A => "INFC_Res",
            0x7E => "SetGet_Res",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for ServiceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

impl From<u8> for ServiceCode {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
