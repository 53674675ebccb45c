//! Operation lines of the table: name;reference;account;amount;currency;status

use remise_core::{Iban, Operation, SkipReason, parse_french_amount};

pub const MIN_FIELDS: usize = 6;

/// Parse one `;`-delimited operation line. Extra trailing fields are ignored.
pub fn parse_row(line: &str) -> Result<Operation, SkipReason> {
    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    if fields.len() < MIN_FIELDS {
        return Err(SkipReason::TooFewFields {
            found: fields.len(),
        });
    }

    let compact: String = fields[2].chars().filter(|c| !c.is_whitespace()).collect();
    let account: Iban = compact
        .parse()
        .map_err(|source| SkipReason::InvalidAccount {
            value: fields[2].to_string(),
            source,
        })?;

    let amount = parse_french_amount(fields[3])
        .filter(|amount| *amount >= 0.0)
        .ok_or_else(|| SkipReason::InvalidAmount(fields[3].to_string()))?;

    Ok(Operation {
        name: fields[0].to_string(),
        reference: fields[1].to_string(),
        account,
        amount,
        currency: fields[4].to_string(),
        status: fields[5].to_string(),
    })
}
