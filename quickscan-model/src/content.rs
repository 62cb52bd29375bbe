//! Structured content decoded from a detected code.
//!
//! [`Content`] is a closed set of variant records. Every variant keeps the
//! raw bytes/text it was built from, so a caller can always fall back to the
//! unstructured value. Anything the classifier cannot interpret becomes
//! [`Content::Plain`].

use crate::detection::RawValue;

/// Discriminant of a [`Content`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ContentKind {
    Plain,
    Url,
    Wifi,
    Email,
    Phone,
    Sms,
    GeoPoint,
    ContactInfo,
    CalendarEvent,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Content {
    Plain(PlainText),
    Url(UrlBookmark),
    Wifi(Wifi),
    Email(Email),
    Phone(Phone),
    Sms(Sms),
    GeoPoint(GeoPoint),
    ContactInfo(ContactInfo),
    CalendarEvent(CalendarEvent),
}

impl Content {
    pub fn plain(raw: RawValue) -> Self {
        Content::Plain(PlainText { raw })
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Plain(_) => ContentKind::Plain,
            Content::Url(_) => ContentKind::Url,
            Content::Wifi(_) => ContentKind::Wifi,
            Content::Email(_) => ContentKind::Email,
            Content::Phone(_) => ContentKind::Phone,
            Content::Sms(_) => ContentKind::Sms,
            Content::GeoPoint(_) => ContentKind::GeoPoint,
            Content::ContactInfo(_) => ContentKind::ContactInfo,
            Content::CalendarEvent(_) => ContentKind::CalendarEvent,
        }
    }

    pub fn raw(&self) -> &RawValue {
        match self {
            Content::Plain(content) => &content.raw,
            Content::Url(content) => &content.raw,
            Content::Wifi(content) => &content.raw,
            Content::Email(content) => &content.raw,
            Content::Phone(content) => &content.raw,
            Content::Sms(content) => &content.raw,
            Content::GeoPoint(content) => &content.raw,
            Content::ContactInfo(content) => &content.raw,
            Content::CalendarEvent(content) => &content.raw,
        }
    }

    pub fn raw_text(&self) -> Option<&str> {
        self.raw().text.as_deref()
    }

    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw().bytes.as_deref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlainText {
    pub raw: RawValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UrlBookmark {
    pub raw: RawValue,
    pub title: String,
    pub url: String,
}

impl UrlBookmark {
    /// The bookmark target, if it is a well-formed absolute URL.
    pub fn parsed(&self) -> Option<url::Url> {
        url::Url::parse(&self.url).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WifiEncryption {
    Open,
    Wpa,
    Wep,
    Unknown,
}

impl WifiEncryption {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => WifiEncryption::Open,
            2 => WifiEncryption::Wpa,
            3 => WifiEncryption::Wep,
            _ => WifiEncryption::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Wifi {
    pub raw: RawValue,
    /// Engine encryption code, kept verbatim; see [`Wifi::encryption`].
    pub encryption_type: i32,
    pub password: String,
    pub ssid: String,
}

impl Wifi {
    pub fn encryption(&self) -> WifiEncryption {
        WifiEncryption::from_code(self.encryption_type)
    }
}

/// Implements index lookups for the subtype enums. Indices outside the
/// declared range resolve to `Unknown` instead of failing.
macro_rules! indexed_subtype {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize)
        )]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            pub const VARIANTS: &'static [$name] = &[$($name::$variant),+];

            pub fn from_index(index: i32) -> Self {
                usize::try_from(index)
                    .ok()
                    .and_then(|index| Self::VARIANTS.get(index).copied())
                    .unwrap_or_default()
            }

            pub fn index(self) -> i32 {
                self as i32
            }
        }
    };
}

indexed_subtype!(EmailType { Unknown, Work, Home });
indexed_subtype!(PhoneType { Unknown, Work, Home, Fax, Mobile });
indexed_subtype!(AddressType { Unknown, Work, Home });

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Email {
    pub raw: RawValue,
    pub address: String,
    pub body: String,
    pub subject: String,
    pub email_type: EmailType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Phone {
    pub raw: RawValue,
    pub number: String,
    pub phone_type: PhoneType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sms {
    pub raw: RawValue,
    pub message: String,
    pub phone_number: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub raw: RawValue,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersonName {
    pub first: String,
    pub formatted_name: String,
    pub last: String,
    pub middle: String,
    pub prefix: String,
    pub pronunciation: String,
    pub suffix: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    pub address_lines: Vec<String>,
    pub address_type: AddressType,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactInfo {
    pub raw: RawValue,
    pub addresses: Vec<Address>,
    /// Nested emails carry the contact's raw value.
    pub emails: Vec<Email>,
    pub name: PersonName,
    pub organization: String,
    /// Nested phones carry the contact's raw value.
    pub phones: Vec<Phone>,
    pub title: String,
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarDateTime {
    pub day: i32,
    pub hours: i32,
    pub minutes: i32,
    pub month: i32,
    pub seconds: i32,
    pub year: i32,
    pub utc: bool,
    pub raw_value: String,
}

#[cfg(feature = "chrono")]
impl CalendarDateTime {
    /// Calendar fields as a naive timestamp, or `None` when they do not
    /// form a valid date and time.
    pub fn to_naive(&self) -> Option<chrono::NaiveDateTime> {
        let date = chrono::NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        date.and_hms_opt(
            u32::try_from(self.hours).ok()?,
            u32::try_from(self.minutes).ok()?,
            u32::try_from(self.seconds).ok()?,
        )
    }

    /// Only defined for values the engine flagged as UTC.
    pub fn to_utc(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        if !self.utc {
            return None;
        }
        self.to_naive().map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalendarEvent {
    pub raw: RawValue,
    pub description: String,
    pub end: CalendarDateTime,
    pub location: String,
    pub organizer: String,
    pub start: CalendarDateTime,
    pub status: String,
    pub summary: String,
}
