//! Certificate field extraction.

use chrono::{DateTime, Utc};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::time::ASN1Time;
use x509_parser::x509::X509Name;

use crate::error_handling::TlsInspectionError;
use crate::utils::calculate_days_until;

/// Fields read from a peer certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: Option<String>,
    /// DNS names only; IP and other SAN entries are skipped
    pub subject_alt_names: Vec<String>,
    /// Issuer common name
    pub issuer: Option<String>,
    pub not_before: Option<DateTime<Utc>>,
    pub not_after: Option<DateTime<Utc>>,
    pub serial_number: Option<String>,
    /// Whole days until `not_after`, floored; negative once expired
    pub days_until_expiry: Option<i64>,
}

impl CertificateInfo {
    /// Parses a DER certificate, computing expiry relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns `TlsInspectionError::Certificate` if the DER cannot be parsed.
    pub fn from_der(der: &[u8], now: DateTime<Utc>) -> Result<Self, TlsInspectionError> {
        let (_, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| TlsInspectionError::Certificate(e.to_string()))?;
        Ok(Self::from_x509(&cert, now))
    }

    fn from_x509(cert: &X509Certificate<'_>, now: DateTime<Utc>) -> Self {
        let not_before = asn1_to_utc(&cert.validity().not_before);
        let not_after = asn1_to_utc(&cert.validity().not_after);
        let serial = cert.raw_serial_as_string();

        Self {
            common_name: first_common_name(cert.subject()),
            subject_alt_names: extract_certificate_sans(cert),
            issuer: first_common_name(cert.issuer()),
            not_before,
            not_after,
            serial_number: (!serial.is_empty()).then_some(serial),
            days_until_expiry: not_after.map(|expiry| calculate_days_until(expiry, now)),
        }
    }
}

fn first_common_name(name: &X509Name<'_>) -> Option<String> {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
}

fn asn1_to_utc(time: &ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

/// Extracts DNS names from the Subject Alternative Name extension.
pub(crate) fn extract_certificate_sans(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut sans = Vec::new();

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for general_name in &san.general_names {
                if let GeneralName::DNSName(dns_name) = general_name {
                    sans.push(dns_name.to_string());
                }
            }
        }
    }

    sans
}
