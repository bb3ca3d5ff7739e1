//! `Consent` → [`ProvisionRecord`] mapping.

use crate::RegistryResult;
use chrono::{DateTime, Utc};
use consent_core::{is_no_expiry_in_offset, no_expiry, PolicyCoding, ProvisionRecord};
use fhir::{parse_date_time, parse_date_time_in_offset, Consent};

/// Map one policy state returned by the registry.
///
/// The nested provision wins over the top-level one. A provision without a code maps to a
/// record without coding, which the resolver rejects.
///
/// # Errors
///
/// Returns an error if a period end or update date is present but not a valid FHIR date.
pub fn provision_record(consent: &Consent) -> RegistryResult<ProvisionRecord> {
    let provision = consent.policy_provision();

    let coding = provision
        .and_then(|p| p.first_coding())
        .and_then(|c| {
            Some(PolicyCoding {
                code: c.code.clone()?,
                display: c.display.clone(),
            })
        });

    let period_end = provision
        .and_then(|p| p.period.as_ref())
        .and_then(|p| p.end.as_deref())
        .map(period_end_date)
        .transpose()?;

    let last_updated = consent
        .date_time
        .as_deref()
        .or_else(|| consent.meta.as_ref()?.last_updated.as_deref())
        .map(parse_date_time)
        .transpose()?;

    Ok(ProvisionRecord {
        coding,
        permit: provision.is_some_and(|p| p.is_permit()),
        period_end,
        last_updated,
        source_reference: consent.source_reference().map(str::to_owned),
    })
}

/// A period end, with the never-expires date recognised in whatever offset it was written.
fn period_end_date(value: &str) -> RegistryResult<DateTime<Utc>> {
    let end = parse_date_time_in_offset(value)?;
    if is_no_expiry_in_offset(&end) {
        return Ok(no_expiry());
    }
    Ok(end.with_timezone(&Utc))
}
