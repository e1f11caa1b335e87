//! Normalization of citydata XML documents into [`Sample`]s.
//!
//! A document holds zero or more `CITYDATA` records. Each record carries its
//! area code and a live-population block (`LIVE_PPLTN_STTS`) whose fields are
//! extracted by name. Records are independent: one bad record never discards
//! its siblings.

use chrono::NaiveDateTime;
use roxmltree::{Document, Node};
use std::str::FromStr;

use crate::citydata::errors::{FetchError, RecordError};
use crate::data::samples::Sample;

/// Format of the upstream `PPLTN_TIME` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const RECORD_TAG: &str = "CITYDATA";
const LIVE_BLOCK_TAG: &str = "LIVE_PPLTN_STTS";

const AREA_CODE: &str = "AREA_CD";
const CONGESTION_LEVEL: &str = "AREA_CONGEST_LVL";
const CONGESTION_MESSAGE: &str = "AREA_CONGEST_MSG";
const MALE_RATE: &str = "MALE_PPLTN_RATE";
const FEMALE_RATE: &str = "FEMALE_PPLTN_RATE";
const POPULATION_MIN: &str = "AREA_PPLTN_MIN";
const POPULATION_MAX: &str = "AREA_PPLTN_MAX";
const POPULATION_TIME: &str = "PPLTN_TIME";
const AGE_RATE_FIELDS: [&str; 7] = [
    "PPLTN_RATE_10",
    "PPLTN_RATE_20",
    "PPLTN_RATE_30",
    "PPLTN_RATE_40",
    "PPLTN_RATE_50",
    "PPLTN_RATE_60",
    "PPLTN_RATE_70",
];

/// Result of normalizing one response body.
#[derive(Debug, Default)]
pub struct ParsedResponse {
    pub samples: Vec<Sample>,
    /// Records that were skipped, in document order.
    pub rejected: Vec<RecordError>,
}

/// Parse a full response body.
///
/// Fails only when the body is not XML or is an upstream error envelope with no
/// records; per-record problems are collected in [`ParsedResponse::rejected`].
pub fn parse_response(body: &str) -> Result<ParsedResponse, FetchError> {
    let doc = Document::parse(body).map_err(FetchError::Parse)?;

    let records: Vec<Node<'_, '_>> = doc
        .descendants()
        .filter(|n| n.has_tag_name(RECORD_TAG))
        .collect();

    if records.is_empty()
        && let Some((code, message)) = result_envelope(&doc)
        && code.starts_with("ERROR")
    {
        return Err(FetchError::Upstream { code, message });
    }

    let mut parsed = ParsedResponse::default();
    for record in records {
        match parse_record(record) {
            Ok(sample) => parsed.samples.push(sample),
            Err(e) => parsed.rejected.push(e),
        }
    }
    Ok(parsed)
}

/// Read the `RESULT` status envelope, if present.
///
/// The citydata service nests `RESULT.CODE`/`RESULT.MESSAGE`; the generic
/// open-API error envelope uses bare `CODE`/`MESSAGE`.
fn result_envelope(doc: &Document<'_>) -> Option<(String, String)> {
    let result = doc.descendants().find(|n| n.has_tag_name("RESULT"))?;
    let code = child_text(result, &["RESULT.CODE", "CODE"])?;
    let message = child_text(result, &["RESULT.MESSAGE", "MESSAGE"]).unwrap_or_default();
    Some((code, message))
}

fn child_text(node: Node<'_, '_>, names: &[&str]) -> Option<String> {
    node.children()
        .find(|c| names.iter().any(|name| c.has_tag_name(*name)))
        .and_then(|c| c.text())
        .map(|t| t.trim().to_string())
}

/// Normalize a single `CITYDATA` record.
fn parse_record(record: Node<'_, '_>) -> Result<Sample, RecordError> {
    let live = live_block(record);

    let zone_id = text(record, AREA_CODE).ok_or(RecordError::MissingField(AREA_CODE))?;
    let congestion_level =
        text(live, CONGESTION_LEVEL).ok_or(RecordError::MissingField(CONGESTION_LEVEL))?;
    let raw_time = text(live, POPULATION_TIME).ok_or(RecordError::MissingField(POPULATION_TIME))?;
    let timestamp = NaiveDateTime::parse_from_str(raw_time, TIMESTAMP_FORMAT).map_err(|_| {
        RecordError::InvalidField {
            field: POPULATION_TIME,
            value: raw_time.to_string(),
        }
    })?;

    let mut age_rates = [None; 7];
    for (slot, field) in age_rates.iter_mut().zip(AGE_RATE_FIELDS) {
        *slot = number(live, field)?;
    }
    let [
        age_rate_10,
        age_rate_20,
        age_rate_30,
        age_rate_40,
        age_rate_50,
        age_rate_60,
        age_rate_70,
    ] = age_rates;

    Ok(Sample {
        timestamp,
        zone_id: zone_id.to_string(),
        congestion_level: congestion_level.to_string(),
        congestion_message: text(live, CONGESTION_MESSAGE).map(str::to_string),
        male_rate: number(live, MALE_RATE)?,
        female_rate: number(live, FEMALE_RATE)?,
        age_rate_10,
        age_rate_20,
        age_rate_30,
        age_rate_40,
        age_rate_50,
        age_rate_60,
        age_rate_70,
        min_population: number(live, POPULATION_MIN)?,
        max_population: number(live, POPULATION_MAX)?,
    })
}

/// The innermost `LIVE_PPLTN_STTS` element that directly holds the congestion
/// level, or the record itself for flat documents.
fn live_block<'a, 'input>(record: Node<'a, 'input>) -> Node<'a, 'input> {
    record
        .descendants()
        .find(|n| {
            n.has_tag_name(LIVE_BLOCK_TAG)
                && n.children().any(|c| c.has_tag_name(CONGESTION_LEVEL))
        })
        .unwrap_or(record)
}

/// Trimmed text of the first descendant named `name`; empty text counts as absent.
fn text<'a>(scope: Node<'a, '_>, name: &str) -> Option<&'a str> {
    scope
        .descendants()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Optional numeric field: absent or empty is `None`, unparseable is an error.
fn number<T: FromStr>(scope: Node<'_, '_>, field: &'static str) -> Result<Option<T>, RecordError> {
    match text(scope, field) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| RecordError::InvalidField {
                field,
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn live_record(area: &str, time: &str, extra: &str) -> String {
        format!(
            r#"<CITYDATA>
                <AREA_NM>강남 MICE 관광특구</AREA_NM>
                <AREA_CD>{area}</AREA_CD>
                <LIVE_PPLTN_STTS>
                    <LIVE_PPLTN_STTS>
                        <AREA_NM>강남 MICE 관광특구</AREA_NM>
                        <AREA_CD>{area}</AREA_CD>
                        <AREA_CONGEST_LVL>여유</AREA_CONGEST_LVL>
                        <AREA_CONGEST_MSG>사람이 몰려있을 가능성이 낮고 붐빔은 거의 느껴지지 않아요.</AREA_CONGEST_MSG>
                        <AREA_PPLTN_MIN>1000</AREA_PPLTN_MIN>
                        <AREA_PPLTN_MAX>1500</AREA_PPLTN_MAX>
                        <MALE_PPLTN_RATE>48.5</MALE_PPLTN_RATE>
                        <FEMALE_PPLTN_RATE>51.5</FEMALE_PPLTN_RATE>
                        <PPLTN_RATE_0>0.6</PPLTN_RATE_0>
                        <PPLTN_RATE_10>3.1</PPLTN_RATE_10>
                        <PPLTN_RATE_20>22.4</PPLTN_RATE_20>
                        <PPLTN_RATE_30>30.2</PPLTN_RATE_30>
                        <PPLTN_RATE_40>21.0</PPLTN_RATE_40>
                        <PPLTN_RATE_50>14.3</PPLTN_RATE_50>
                        <PPLTN_RATE_60>6.1</PPLTN_RATE_60>
                        <PPLTN_RATE_70>2.3</PPLTN_RATE_70>
                        {extra}
                        <PPLTN_TIME>{time}</PPLTN_TIME>
                        <FCST_YN>Y</FCST_YN>
                        <FCST_PPLTN>
                            <FCST_PPLTN>
                                <FCST_TIME>2024-01-01 13:00</FCST_TIME>
                                <FCST_CONGEST_LVL>보통</FCST_CONGEST_LVL>
                                <FCST_PPLTN_MIN>2000</FCST_PPLTN_MIN>
                                <FCST_PPLTN_MAX>2500</FCST_PPLTN_MAX>
                            </FCST_PPLTN>
                        </FCST_PPLTN>
                    </LIVE_PPLTN_STTS>
                </LIVE_PPLTN_STTS>
            </CITYDATA>"#
        )
    }

    fn document(records: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <SeoulRtd.citydata>
                <list_total_count>{}</list_total_count>
                <RESULT>
                    <RESULT.CODE>INFO-000</RESULT.CODE>
                    <RESULT.MESSAGE>정상 처리되었습니다.</RESULT.MESSAGE>
                </RESULT>
                {}
            </SeoulRtd.citydata>"#,
            records.len(),
            records.join("\n")
        )
    }

    #[test]
    fn test_parse_single_record_fields() {
        let body = document(&[live_record("POI001", "2024-01-01 12:00", "")]);
        let parsed = parse_response(&body).unwrap();

        assert!(parsed.rejected.is_empty());
        assert_eq!(parsed.samples.len(), 1);
        let sample = &parsed.samples[0];
        assert_eq!(
            sample.timestamp,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap()
        );
        assert_eq!(sample.zone_id, "POI001");
        assert_eq!(sample.congestion_level, "여유");
        assert_eq!(sample.male_rate, Some(48.5));
        assert_eq!(sample.female_rate, Some(51.5));
        assert_eq!(sample.age_rate_10, Some(3.1));
        assert_eq!(sample.age_rate_70, Some(2.3));
        assert_eq!(sample.min_population, Some(1000));
        assert_eq!(sample.max_population, Some(1500));
        assert!(sample.congestion_message.is_some());
    }

    #[test]
    fn test_parse_minimal_flat_fragment() {
        let body = r#"<CITYDATA>
            <AREA_CD>POI009</AREA_CD>
            <AREA_CONGEST_LVL>여유</AREA_CONGEST_LVL>
            <MALE_PPLTN_RATE>48.5</MALE_PPLTN_RATE>
            <AREA_PPLTN_MIN>1000</AREA_PPLTN_MIN>
            <AREA_PPLTN_MAX>1500</AREA_PPLTN_MAX>
            <PPLTN_TIME>2024-01-01 12:00</PPLTN_TIME>
        </CITYDATA>"#;
        let parsed = parse_response(body).unwrap();

        assert_eq!(parsed.samples.len(), 1);
        let sample = &parsed.samples[0];
        assert_eq!(sample.timestamp.to_string(), "2024-01-01 12:00:00");
        assert_eq!(sample.congestion_level, "여유");
        assert_eq!(sample.male_rate, Some(48.5));
        assert_eq!(sample.female_rate, None);
        assert_eq!(sample.age_rate_30, None);
        assert_eq!(sample.min_population, Some(1000));
        assert_eq!(sample.max_population, Some(1500));
    }

    #[test]
    fn test_forecast_fields_do_not_leak_into_sample() {
        let body = document(&[live_record("POI001", "2024-01-01 12:00", "")]);
        let sample = &parse_response(&body).unwrap().samples[0];
        assert_eq!(sample.congestion_level, "여유");
        assert_eq!(sample.max_population, Some(1500));
    }

    #[test]
    fn test_malformed_record_skipped_siblings_kept() {
        let good = live_record("POI001", "2024-01-01 12:00", "");
        let bad_time = live_record("POI002", "01/01/2024 12:00", "");
        let missing_area = r#"<CITYDATA><LIVE_PPLTN_STTS><LIVE_PPLTN_STTS>
                <AREA_CONGEST_LVL>보통</AREA_CONGEST_LVL>
                <PPLTN_TIME>2024-01-01 12:00</PPLTN_TIME>
            </LIVE_PPLTN_STTS></LIVE_PPLTN_STTS></CITYDATA>"#
            .to_string();
        let body = document(&[good, bad_time, missing_area]);

        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.samples.len(), 1);
        assert_eq!(parsed.samples[0].zone_id, "POI001");
        assert_eq!(
            parsed.rejected,
            vec![
                RecordError::InvalidField {
                    field: POPULATION_TIME,
                    value: "01/01/2024 12:00".to_string(),
                },
                RecordError::MissingField(AREA_CODE),
            ]
        );
    }

    #[test]
    fn test_non_numeric_rate_rejects_record() {
        let body = r#"<CITYDATA>
            <AREA_CD>POI001</AREA_CD>
            <AREA_CONGEST_LVL>붐빔</AREA_CONGEST_LVL>
            <MALE_PPLTN_RATE>n/a</MALE_PPLTN_RATE>
            <PPLTN_TIME>2024-01-01 12:00</PPLTN_TIME>
        </CITYDATA>"#;
        let parsed = parse_response(body).unwrap();
        assert!(parsed.samples.is_empty());
        assert_eq!(
            parsed.rejected,
            vec![RecordError::InvalidField {
                field: MALE_RATE,
                value: "n/a".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_optional_fields_are_null() {
        let body = r#"<CITYDATA>
            <AREA_CD>POI001</AREA_CD>
            <AREA_CONGEST_LVL>보통</AREA_CONGEST_LVL>
            <MALE_PPLTN_RATE></MALE_PPLTN_RATE>
            <AREA_PPLTN_MIN> </AREA_PPLTN_MIN>
            <PPLTN_TIME>2024-01-01 12:05</PPLTN_TIME>
        </CITYDATA>"#;
        let sample = &parse_response(body).unwrap().samples[0];
        assert_eq!(sample.male_rate, None);
        assert_eq!(sample.min_population, None);
    }

    #[test]
    fn test_multiple_records_in_one_document() {
        let body = document(&[
            live_record("POI001", "2024-01-01 12:00", ""),
            live_record("POI001", "2024-01-01 12:05", ""),
        ]);
        let parsed = parse_response(&body).unwrap();
        assert_eq!(parsed.samples.len(), 2);
        assert_ne!(parsed.samples[0].timestamp, parsed.samples[1].timestamp);
    }

    #[test]
    fn test_error_envelope_is_fetch_failure() {
        let body = r#"<RESULT><CODE>ERROR-500</CODE><MESSAGE>서버 오류입니다.</MESSAGE></RESULT>"#;
        match parse_response(body) {
            Err(FetchError::Upstream { code, message }) => {
                assert_eq!(code, "ERROR-500");
                assert_eq!(message, "서버 오류입니다.");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_info_envelope_without_records_is_empty() {
        let body = r#"<RESULT><CODE>INFO-200</CODE><MESSAGE>해당하는 데이터가 없습니다.</MESSAGE></RESULT>"#;
        let parsed = parse_response(body).unwrap();
        assert!(parsed.samples.is_empty());
        assert!(parsed.rejected.is_empty());
    }

    #[test]
    fn test_garbage_body_is_parse_error() {
        let err = parse_response("<html><body>502 Bad Gateway").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }
}
