//! Content classification.
//!
//! Maps a raw detection (discriminator, raw value, optional payload) onto a
//! [`Content`] case. Classification is total: a discriminator the payload
//! does not back up, or one we have no structured case for, yields
//! [`Content::Plain`] holding the raw value.

use quickscan_model::{
    Address, AddressPayload, AddressType, CalendarDateTime,
    CalendarDateTimePayload, CalendarEvent, CalendarEventPayload, ContactInfo,
    ContactInfoPayload, Content, DetectionPayload, DetectionResult, Email,
    EmailPayload, EmailType, GeoPoint, GeoPointPayload, PersonName,
    PersonNamePayload, Phone, PhonePayload, PhoneType, RawValue, Sms,
    SmsPayload, UrlBookmark, UrlBookmarkPayload, ValueType, Wifi,
    WifiPayload,
};

/// Classify a detection by its discriminator and payload.
pub fn classify(
    value_type: i32,
    raw: RawValue,
    payload: Option<&DetectionPayload>,
) -> Content {
    match (ValueType::from_code(value_type), payload) {
        (ValueType::Url, Some(DetectionPayload::Url(url))) => {
            Content::Url(UrlBookmark {
                raw,
                title: url.title.clone(),
                url: url.url.clone(),
            })
        }
        (ValueType::Wifi, Some(DetectionPayload::Wifi(wifi))) => {
            Content::Wifi(Wifi {
                raw,
                encryption_type: wifi.encryption_type,
                password: wifi.password.clone(),
                ssid: wifi.ssid.clone(),
            })
        }
        (ValueType::Email, Some(DetectionPayload::Email(email))) => {
            Content::Email(email_from(raw, email))
        }
        (ValueType::Phone, Some(DetectionPayload::Phone(phone))) => {
            Content::Phone(phone_from(raw, phone))
        }
        (ValueType::Sms, Some(DetectionPayload::Sms(sms))) => {
            Content::Sms(Sms {
                raw,
                message: sms.message.clone(),
                phone_number: sms.phone_number.clone(),
            })
        }
        (ValueType::Geo, Some(DetectionPayload::Geo(geo))) => {
            Content::GeoPoint(GeoPoint {
                raw,
                lat: geo.lat,
                lng: geo.lng,
            })
        }
        (
            ValueType::ContactInfo,
            Some(DetectionPayload::ContactInfo(contact)),
        ) => Content::ContactInfo(contact_from(raw, contact)),
        (
            ValueType::CalendarEvent,
            Some(DetectionPayload::CalendarEvent(event)),
        ) => Content::CalendarEvent(CalendarEvent {
            raw,
            description: event.description.clone(),
            end: date_time_from(&event.end),
            location: event.location.clone(),
            organizer: event.organizer.clone(),
            start: date_time_from(&event.start),
            status: event.status.clone(),
            summary: event.summary.clone(),
        }),
        _ => Content::plain(raw),
    }
}

/// Classify a full [`DetectionResult`].
pub fn classify_detection(result: &DetectionResult) -> Content {
    classify(result.value_type, result.raw.clone(), result.payload.as_ref())
}

/// Inverse of [`classify`]: the discriminator and payload a content value
/// travels with. Plain content is reported as [`ValueType::Text`].
pub fn describe(content: &Content) -> (ValueType, Option<DetectionPayload>) {
    match content {
        Content::Plain(_) => (ValueType::Text, None),
        Content::Url(url) => (
            ValueType::Url,
            Some(DetectionPayload::Url(UrlBookmarkPayload {
                title: url.title.clone(),
                url: url.url.clone(),
            })),
        ),
        Content::Wifi(wifi) => (
            ValueType::Wifi,
            Some(DetectionPayload::Wifi(WifiPayload {
                encryption_type: wifi.encryption_type,
                password: wifi.password.clone(),
                ssid: wifi.ssid.clone(),
            })),
        ),
        Content::Email(email) => (
            ValueType::Email,
            Some(DetectionPayload::Email(email_payload(email))),
        ),
        Content::Phone(phone) => (
            ValueType::Phone,
            Some(DetectionPayload::Phone(phone_payload(phone))),
        ),
        Content::Sms(sms) => (
            ValueType::Sms,
            Some(DetectionPayload::Sms(SmsPayload {
                message: sms.message.clone(),
                phone_number: sms.phone_number.clone(),
            })),
        ),
        Content::GeoPoint(geo) => (
            ValueType::Geo,
            Some(DetectionPayload::Geo(GeoPointPayload {
                lat: geo.lat,
                lng: geo.lng,
            })),
        ),
        Content::ContactInfo(contact) => (
            ValueType::ContactInfo,
            Some(DetectionPayload::ContactInfo(ContactInfoPayload {
                addresses: contact
                    .addresses
                    .iter()
                    .map(|address| AddressPayload {
                        address_lines: address.address_lines.clone(),
                        address_type: address.address_type.index(),
                    })
                    .collect(),
                emails: contact.emails.iter().map(email_payload).collect(),
                name: PersonNamePayload {
                    first: contact.name.first.clone(),
                    formatted_name: contact.name.formatted_name.clone(),
                    last: contact.name.last.clone(),
                    middle: contact.name.middle.clone(),
                    prefix: contact.name.prefix.clone(),
                    pronunciation: contact.name.pronunciation.clone(),
                    suffix: contact.name.suffix.clone(),
                },
                organization: contact.organization.clone(),
                phones: contact.phones.iter().map(phone_payload).collect(),
                title: contact.title.clone(),
                urls: contact.urls.clone(),
            })),
        ),
        Content::CalendarEvent(event) => (
            ValueType::CalendarEvent,
            Some(DetectionPayload::CalendarEvent(CalendarEventPayload {
                description: event.description.clone(),
                end: date_time_payload(&event.end),
                location: event.location.clone(),
                organizer: event.organizer.clone(),
                start: date_time_payload(&event.start),
                status: event.status.clone(),
                summary: event.summary.clone(),
            })),
        ),
    }
}

fn email_from(raw: RawValue, email: &EmailPayload) -> Email {
    Email {
        raw,
        address: email.address.clone(),
        body: email.body.clone(),
        subject: email.subject.clone(),
        email_type: EmailType::from_index(email.email_type),
    }
}

fn phone_from(raw: RawValue, phone: &PhonePayload) -> Phone {
    Phone {
        raw,
        number: phone.number.clone(),
        phone_type: PhoneType::from_index(phone.phone_type),
    }
}

// Nested emails and phones carry the enclosing code's raw value.
fn contact_from(raw: RawValue, contact: &ContactInfoPayload) -> ContactInfo {
    ContactInfo {
        addresses: contact
            .addresses
            .iter()
            .map(|address| Address {
                address_lines: address.address_lines.clone(),
                address_type: AddressType::from_index(address.address_type),
            })
            .collect(),
        emails: contact
            .emails
            .iter()
            .map(|email| email_from(raw.clone(), email))
            .collect(),
        name: PersonName {
            first: contact.name.first.clone(),
            formatted_name: contact.name.formatted_name.clone(),
            last: contact.name.last.clone(),
            middle: contact.name.middle.clone(),
            prefix: contact.name.prefix.clone(),
            pronunciation: contact.name.pronunciation.clone(),
            suffix: contact.name.suffix.clone(),
        },
        organization: contact.organization.clone(),
        phones: contact
            .phones
            .iter()
            .map(|phone| phone_from(raw.clone(), phone))
            .collect(),
        title: contact.title.clone(),
        urls: contact.urls.clone(),
        raw,
    }
}

fn date_time_from(value: &CalendarDateTimePayload) -> CalendarDateTime {
    CalendarDateTime {
        day: value.day,
        hours: value.hours,
        minutes: value.minutes,
        month: value.month,
        seconds: value.seconds,
        year: value.year,
        utc: value.utc,
        raw_value: value.raw_value.clone(),
    }
}

fn date_time_payload(value: &CalendarDateTime) -> CalendarDateTimePayload {
    CalendarDateTimePayload {
        day: value.day,
        hours: value.hours,
        minutes: value.minutes,
        month: value.month,
        seconds: value.seconds,
        year: value.year,
        utc: value.utc,
        raw_value: value.raw_value.clone(),
    }
}

fn email_payload(email: &Email) -> EmailPayload {
    EmailPayload {
        address: email.address.clone(),
        body: email.body.clone(),
        subject: email.subject.clone(),
        email_type: email.email_type.index(),
    }
}

fn phone_payload(phone: &Phone) -> PhonePayload {
    PhonePayload {
        number: phone.number.clone(),
        phone_type: phone.phone_type.index(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickscan_model::{ContentKind, PlainText, WifiEncryption};

    fn wifi_payload() -> DetectionPayload {
        DetectionPayload::Wifi(WifiPayload {
            encryption_type: 2,
            password: "pw".into(),
            ssid: "net".into(),
        })
    }

    #[test]
    fn wifi_payload_classifies_as_wifi() {
        let raw = RawValue::from_text("WIFI:S:net;T:WPA;P:pw;;");
        let content =
            classify(ValueType::Wifi.code(), raw.clone(), Some(&wifi_payload()));

        let Content::Wifi(wifi) = content else {
            panic!("expected wifi content");
        };
        assert_eq!(wifi.ssid, "net");
        assert_eq!(wifi.password, "pw");
        assert_eq!(wifi.encryption(), WifiEncryption::Wpa);
        assert_eq!(wifi.raw, raw);
    }

    #[test]
    fn discriminator_without_payload_falls_back_to_plain() {
        let raw = RawValue::from_text("WIFI:S:net;;");
        let content = classify(ValueType::Wifi.code(), raw.clone(), None);
        assert_eq!(content, Content::Plain(PlainText { raw }));
    }

    #[test]
    fn mismatched_payload_falls_back_to_plain() {
        let raw = RawValue::from_text("mailto:someone@example.com");
        let content =
            classify(ValueType::Email.code(), raw.clone(), Some(&wifi_payload()));
        assert_eq!(content.kind(), ContentKind::Plain);
        assert_eq!(content.raw(), &raw);
    }

    #[test]
    fn unstructured_and_unknown_discriminators_are_plain() {
        for code in [
            ValueType::Unknown.code(),
            ValueType::Isbn.code(),
            ValueType::Product.code(),
            ValueType::Text.code(),
            ValueType::DriverLicense.code(),
            42,
            -3,
        ] {
            let content = classify(code, RawValue::from_text("x"), None);
            assert_eq!(content.kind(), ContentKind::Plain, "code {code}");
        }
    }

    #[test]
    fn out_of_range_subtypes_become_unknown() {
        let payload = DetectionPayload::Phone(PhonePayload {
            number: "555-0100".into(),
            phone_type: 17,
        });
        let content = classify(
            ValueType::Phone.code(),
            RawValue::from_text("tel:555-0100"),
            Some(&payload),
        );
        let Content::Phone(phone) = content else {
            panic!("expected phone content");
        };
        assert_eq!(phone.phone_type, PhoneType::Unknown);
        assert_eq!(phone.number, "555-0100");
    }

    #[test]
    fn contact_entries_inherit_the_parent_raw_value() {
        let raw = RawValue::from_text("BEGIN:VCARD");
        let payload = DetectionPayload::ContactInfo(ContactInfoPayload {
            emails: vec![EmailPayload {
                address: "a@example.com".into(),
                email_type: 1,
                ..Default::default()
            }],
            phones: vec![PhonePayload {
                number: "555".into(),
                phone_type: 4,
            }],
            addresses: vec![AddressPayload {
                address_lines: vec!["1 Main St".into()],
                address_type: 2,
            }],
            organization: "Acme".into(),
            ..Default::default()
        });

        let content =
            classify(ValueType::ContactInfo.code(), raw.clone(), Some(&payload));
        let Content::ContactInfo(contact) = content else {
            panic!("expected contact content");
        };
        assert_eq!(contact.emails[0].raw, raw);
        assert_eq!(contact.emails[0].email_type, EmailType::Work);
        assert_eq!(contact.phones[0].raw, raw);
        assert_eq!(contact.phones[0].phone_type, PhoneType::Mobile);
        assert_eq!(contact.addresses[0].address_type, AddressType::Home);
        assert_eq!(contact.organization, "Acme");
    }

    #[test]
    fn describe_inverts_classify() {
        let raw = RawValue::from_text("geo:1.5,-2.25");
        let payload =
            DetectionPayload::Geo(GeoPointPayload { lat: 1.5, lng: -2.25 });
        let content = classify(ValueType::Geo.code(), raw.clone(), Some(&payload));

        let (value_type, described) = describe(&content);
        assert_eq!(value_type, ValueType::Geo);
        assert_eq!(
            classify(value_type.code(), raw, described.as_ref()),
            content
        );
    }

    #[test]
    fn detection_results_classify_through_their_fields() {
        let result = DetectionResult::text(
            quickscan_model::BarcodeFormat::QrCode,
            "hello",
        );
        let content = classify_detection(&result);
        assert_eq!(content.raw_text(), Some("hello"));
        assert_eq!(content.kind(), ContentKind::Plain);
    }
}
