use chrono::Duration;

/// Error arising when parsing an ISO 8601 duration.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("invalid ISO 8601 duration: {0:?}")]
pub struct InvalidDuration(pub String);

/// Parse an ISO 8601 duration (`P[nY][nM][nW][nD][T[nH][nM][nS]]`) into a
/// fixed span. Calendar units are approximated the way calendar feeds
/// conventionally do: a year counts as 365 days, a month as 30.
pub fn parse_duration(value: &str) -> Result<Duration, InvalidDuration> {
    let err = || InvalidDuration(value.to_owned());

    let mut rest = value.strip_prefix('P').ok_or_else(err)?;
    if rest.is_empty() {
        return Err(err());
    }

    let mut total = Duration::zero();
    let mut in_time = false;
    while !rest.is_empty() {
        if let Some(remainder) = rest.strip_prefix('T') {
            if in_time {
                return Err(err());
            }
            in_time = true;
            rest = remainder;
            continue;
        }

        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .filter(|&end| end > 0)
            .ok_or_else(err)?;
        let amount: i64 = rest[..digits].parse().map_err(|_| err())?;
        let unit = rest[digits..].chars().next().ok_or_else(err)?;
        rest = &rest[digits + unit.len_utf8()..];

        total = total
            + match (unit, in_time) {
                ('Y', false) => Duration::days(amount * 365),
                ('M', false) => Duration::days(amount * 30),
                ('W', false) => Duration::weeks(amount),
                ('D', false) => Duration::days(amount),
                ('H', true) => Duration::hours(amount),
                ('M', true) => Duration::minutes(amount),
                ('S', true) => Duration::seconds(amount),
                _ => return Err(err()),
            };
    }

    Ok(total)
}
