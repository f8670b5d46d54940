use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

// ── OfxDateProcessor ──────────────────────────────────────────────────────────

fn ofx_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})").expect("regex is valid"))
}

/// Parses and writes OFX date-time values.
///
/// OFX dates look like `YYYYMMDD[HHMMSS[.XXX]][[+-offset:TZ]]`.  Only the
/// leading calendar date matters here; time and zone suffixes are ignored,
/// so the result never depends on the host's locale or timezone.
pub struct OfxDateProcessor;

impl OfxDateProcessor {
    pub fn parse(raw: &str) -> Option<NaiveDate> {
        let raw = raw.trim();
        let caps = ofx_date_regex().captures(raw)?;
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        let date = NaiveDate::from_ymd_opt(year, month, day);
        if date.is_none() {
            debug!("OfxDateProcessor: out-of-range date \"{}\"", raw);
        }
        date
    }

    /// Render as `YYYYMMDD`.
    pub fn format(date: NaiveDate) -> String {
        date.format("%Y%m%d").to_string()
    }
}

// ── AmountProcessor ───────────────────────────────────────────────────────────

/// Parses OFX amounts (`TRNAMT`, `BALAMT`) into exact decimals.
pub struct AmountProcessor;

impl AmountProcessor {
    /// Accepts `[+-]digits[.digits]`.  A single comma is read as the decimal
    /// separator when no dot is present, since some banks emit `-12,50`.
    /// Grouping separators are rejected rather than guessed.
    pub fn parse(raw: &str) -> Option<Decimal> {
        let trimmed = raw.trim();
        let (negative, digits) = match trimmed.as_bytes().first()? {
            b'-' => (true, &trimmed[1..]),
            b'+' => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };

        let normalised = match (digits.matches('.').count(), digits.matches(',').count()) {
            (0, 1) => digits.replace(',', "."),
            (_, 0) => digits.to_string(),
            _ => return None,
        };

        if normalised.is_empty()
            || normalised.starts_with('.')
            || normalised.ends_with('.')
            || !normalised.chars().all(|c| c.is_ascii_digit() || c == '.')
        {
            return None;
        }

        let value = Decimal::from_str_exact(&normalised).ok()?;
        Some(if negative { -value } else { value })
    }

    /// Render with a plain `.` separator and no grouping.
    pub fn format(amount: Decimal) -> String {
        amount.to_string()
    }
}

// ── TextProcessor ─────────────────────────────────────────────────────────────

/// Entity handling for free-text values (`NAME`, `MEMO`).
pub struct TextProcessor;

impl TextProcessor {
    /// Decode the XML entities OFX writers use, including numeric ones.
    pub fn decode_entities(raw: &str) -> String {
        if !raw.contains('&') {
            return raw.to_string();
        }

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(pos) = rest.find('&') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            let decoded = tail.find(';').and_then(|end| {
                let entity = &tail[1..end];
                let ch = match entity {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => Self::decode_numeric(entity),
                };
                ch.map(|c| (c, end + 1))
            });
            match decoded {
                Some((c, consumed)) => {
                    out.push(c);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push('&');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn decode_numeric(entity: &str) -> Option<char> {
        let code = if let Some(hex) = entity
            .strip_prefix("#x")
            .or_else(|| entity.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok()?
        } else {
            entity.strip_prefix('#')?.parse().ok()?
        };
        char::from_u32(code)
    }

    /// Escape the characters that would otherwise be read as markup.
    pub fn encode_entities(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                _ => out.push(c),
            }
        }
        out
    }
}
