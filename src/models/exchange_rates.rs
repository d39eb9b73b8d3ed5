// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use chrono::NaiveDate;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;

use crate::error::RateError;

/// The currency every factor in the feed is quoted against.
pub const BASE_CURRENCY: &str = "RUB";

/// Rates for one feed snapshot: currency code -> base units per one unit of
/// that currency. The base currency is always present at 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    published: Option<NaiveDate>,
    factors: BTreeMap<String, f64>,
}

impl RateTable {
    /// Parse a daily feed body, e.g.
    ///
    /// ```text
    /// <ValCurs Date="02.03.2024" name="Foreign Currency Market">
    ///   <Valute ID="R01235">
    ///     <CharCode>USD</CharCode><Nominal>1</Nominal><Value>91,6012</Value>
    ///   </Valute>
    /// </ValCurs>
    /// ```
    ///
    /// Any bad record rejects the whole table.
    pub fn parse(body: &str) -> Result<Self, RateError> {
        let mut factors = BTreeMap::new();
        factors.insert(BASE_CURRENCY.to_string(), 1.0);

        let mut reader = Reader::from_str(body);
        reader.trim_text(true);

        let mut published = None;
        let mut depth = 0usize;
        let mut seen_root = false;
        let mut records = 0usize;
        let mut record: Option<RawRecord> = None;
        let mut field: Option<Field> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if depth == 0 {
                        if seen_root {
                            return Err(RateError::Parse(
                                "more than one root element".to_string(),
                            ));
                        }
                        check_root(&e)?;
                        seen_root = true;
                        published = publication_date(&e);
                    }
                    depth += 1;
                    match e.name().as_ref() {
                        b"Valute" if depth == 2 => {
                            records += 1;
                            record = Some(RawRecord::default());
                        }
                        b"CharCode" if record.is_some() => field = Some(Field::Code),
                        b"Nominal" if record.is_some() => field = Some(Field::Nominal),
                        b"Value" if record.is_some() => field = Some(Field::Value),
                        _ => {}
                    }
                }
                Event::Empty(e) => {
                    if depth == 0 {
                        if seen_root {
                            return Err(RateError::Parse(
                                "more than one root element".to_string(),
                            ));
                        }
                        check_root(&e)?;
                        seen_root = true;
                        published = publication_date(&e);
                    } else if depth == 1 && e.name().as_ref() == b"Valute" {
                        records += 1;
                        // An empty record has none of its fields.
                        RawRecord::default().insert_into(&mut factors, records)?;
                    }
                }
                Event::Text(t) => {
                    if let (Some(rec), Some(f)) = (record.as_mut(), field) {
                        rec.push(f, &t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let (Some(rec), Some(f)) = (record.as_mut(), field) {
                        rec.push(f, &String::from_utf8_lossy(&t.into_inner()));
                    }
                }
                Event::End(e) => {
                    depth = depth.saturating_sub(1);
                    match e.name().as_ref() {
                        b"Valute" if depth == 1 => {
                            if let Some(rec) = record.take() {
                                rec.insert_into(&mut factors, records)?;
                            }
                        }
                        b"CharCode" | b"Nominal" | b"Value" => field = None,
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(RateError::Parse("no root element".to_string()));
        }
        if depth != 0 {
            return Err(RateError::Parse("unexpected end of document".to_string()));
        }

        log::debug!("Parsed {} currency records", records);
        Ok(Self { published, factors })
    }

    /// Build a table directly from factors; the base currency is added at 1.0.
    #[cfg(test)]
    pub fn from_factors<I>(factors: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        let mut map: BTreeMap<String, f64> = factors.into_iter().collect();
        map.insert(BASE_CURRENCY.to_string(), 1.0);
        Self {
            published: None,
            factors: map,
        }
    }

    /// Date the feed says the rates are effective for, if it said so.
    pub fn published(&self) -> Option<NaiveDate> {
        self.published
    }

    pub fn factor(&self, code: &str) -> Result<f64, RateError> {
        self.factors
            .get(code)
            .copied()
            .ok_or_else(|| RateError::UnknownCurrency(code.to_string()))
    }

    /// Units of `to_code` per one unit of `from_code`.
    pub fn cross_rate(&self, from_code: &str, to_code: &str) -> Result<f64, RateError> {
        let from = self.factor(from_code)?;
        let to = self.factor(to_code)?;
        Ok(to / from)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.factors.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Codes and factors in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.factors.iter().map(|(code, factor)| (code.as_str(), *factor))
    }
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Code,
    Nominal,
    Value,
}

#[derive(Debug, Default)]
struct RawRecord {
    code: Option<String>,
    nominal: Option<String>,
    value: Option<String>,
}

impl RawRecord {
    /// Text of one field may arrive in pieces around comments or CDATA sections.
    fn push(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Code => &mut self.code,
            Field::Nominal => &mut self.nominal,
            Field::Value => &mut self.value,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn insert_into(
        self,
        factors: &mut BTreeMap<String, f64>,
        record: usize,
    ) -> Result<(), RateError> {
        let code = required(self.code, "CharCode", record)?;
        let nominal = required(self.nominal, "Nominal", record)?;
        let value = required(self.value, "Value", record)?;

        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RateError::InvalidValue {
                field: "CharCode",
                value: code,
            });
        }
        let code = code.to_ascii_uppercase();

        let nominal_units = match nominal.parse::<u32>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(RateError::InvalidValue {
                    field: "Nominal",
                    value: nominal,
                })
            }
        };

        // The feed writes decimals with a comma.
        let value_num = match value.replace(',', ".").parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => v,
            _ => {
                return Err(RateError::InvalidValue {
                    field: "Value",
                    value,
                })
            }
        };

        if factors.contains_key(&code) {
            return Err(RateError::DuplicateCurrency(code));
        }
        factors.insert(code, f64::from(nominal_units) / value_num);
        Ok(())
    }
}

fn required(
    field: Option<String>,
    name: &'static str,
    record: usize,
) -> Result<String, RateError> {
    match field {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(RateError::MissingField {
            field: name,
            record,
        }),
    }
}

fn check_root(root: &quick_xml::events::BytesStart) -> Result<(), RateError> {
    if root.name().as_ref() == b"ValCurs" {
        return Ok(());
    }
    Err(RateError::Parse(format!(
        "unexpected root element <{}>",
        String::from_utf8_lossy(root.name().as_ref())
    )))
}

fn publication_date(root: &quick_xml::events::BytesStart) -> Option<NaiveDate> {
    let attr = root
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"Date")?;
    let raw = String::from_utf8_lossy(&attr.value).to_string();
    match NaiveDate::parse_from_str(&raw, "%d.%m.%Y") {
        Ok(date) => Some(date),
        Err(_) => {
            log::debug!("Ignoring unparseable feed date {:?}", raw);
            None
        }
    }
}
