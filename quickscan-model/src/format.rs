use std::fmt::{self, Display, Formatter};

/// Barcode symbologies understood by the detection engine.
///
/// The discriminants are the engine's numeric format ids and are what
/// crosses the request boundary. [`BarcodeFormat::AllFormats`] is the
/// sentinel meaning "detect every supported symbology".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BarcodeFormat {
    AllFormats = 0,
    Code128 = 1,
    Code39 = 2,
    Code93 = 4,
    Codabar = 8,
    DataMatrix = 16,
    Ean13 = 32,
    Ean8 = 64,
    Itf = 128,
    QrCode = 256,
    UpcA = 512,
    UpcE = 1024,
    Pdf417 = 2048,
    Aztec = 4096,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 14] = [
        BarcodeFormat::AllFormats,
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Codabar,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Itf,
        BarcodeFormat::QrCode,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.id() == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            BarcodeFormat::AllFormats => "ALL_FORMATS",
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
            BarcodeFormat::Pdf417 => "PDF417",
            BarcodeFormat::Aztec => "AZTEC",
        }
    }

    /// Case-insensitive lookup by [`BarcodeFormat::name`]; `-` and `_`
    /// are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().replace('-', "_").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == normalized)
    }
}

impl Display for BarcodeFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Discriminator the detection engine attaches to every result, describing
/// how the payload should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ValueType {
    Unknown = 0,
    ContactInfo = 1,
    Email = 2,
    Isbn = 3,
    Phone = 4,
    Product = 5,
    Sms = 6,
    Text = 7,
    Url = 8,
    Wifi = 9,
    Geo = 10,
    CalendarEvent = 11,
    DriverLicense = 12,
}

impl ValueType {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Unrecognized codes collapse to [`ValueType::Unknown`].
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ValueType::ContactInfo,
            2 => ValueType::Email,
            3 => ValueType::Isbn,
            4 => ValueType::Phone,
            5 => ValueType::Product,
            6 => ValueType::Sms,
            7 => ValueType::Text,
            8 => ValueType::Url,
            9 => ValueType::Wifi,
            10 => ValueType::Geo,
            11 => ValueType::CalendarEvent,
            12 => ValueType::DriverLicense,
            _ => ValueType::Unknown,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Unknown => write!(f, "Unknown"),
            ValueType::ContactInfo => write!(f, "ContactInfo"),
            ValueType::Email => write!(f, "Email"),
            ValueType::Isbn => write!(f, "Isbn"),
            ValueType::Phone => write!(f, "Phone"),
            ValueType::Product => write!(f, "Product"),
            ValueType::Sms => write!(f, "Sms"),
            ValueType::Text => write!(f, "Text"),
            ValueType::Url => write!(f, "Url"),
            ValueType::Wifi => write!(f, "Wifi"),
            ValueType::Geo => write!(f, "Geo"),
            ValueType::CalendarEvent => write!(f, "CalendarEvent"),
            ValueType::DriverLicense => write!(f, "DriverLicense"),
        }
    }
}
