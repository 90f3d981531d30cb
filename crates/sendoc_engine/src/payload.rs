use serde::Deserialize;
use serde_json::{Map, Value};

use sendoc_core::{parse_rate_text, JobDetail, JobSummary, RateUnit};

use crate::{ChatReply, StreamEvent};

/// Shown when a whole-body reply carries none of the known text fields.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't get that.";

/// Reply text aliases, tried in order; the first string wins.
const REPLY_TEXT_FIELDS: [&str; 3] = ["text", "reply", "message"];

/// What a single streamed record turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Event(StreamEvent),
    /// Well-formed but not something we act on.
    Ignored,
    /// Payload was not valid JSON.
    Malformed(String),
}

/// Decodes the JSON payload of one record and dispatches on its `type`.
pub fn decode_record_payload(payload: &str) -> RecordOutcome {
    let payload = payload.trim();
    if payload == "[DONE]" {
        return RecordOutcome::Ignored;
    }
    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => return RecordOutcome::Malformed(err.to_string()),
    };

    let data = value.get("data");
    match value.get("type").and_then(Value::as_str) {
        Some("text") => match data.and_then(Value::as_str) {
            Some(delta) => RecordOutcome::Event(StreamEvent::TextDelta(delta.to_string())),
            None => RecordOutcome::Ignored,
        },
        Some("blocks") => RecordOutcome::Event(StreamEvent::Jobs(first_block_jobs(data))),
        _ => RecordOutcome::Ignored,
    }
}

/// Jobs from the first block's `items`; anything missing or odd gives an empty list.
fn first_block_jobs(data: Option<&Value>) -> Vec<JobSummary> {
    data.and_then(Value::as_array)
        .and_then(|blocks| blocks.first())
        .and_then(|block| block.get("items"))
        .and_then(Value::as_array)
        .map(|items| jobs_from_items(items))
        .unwrap_or_default()
}

fn jobs_from_items(items: &[Value]) -> Vec<JobSummary> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(job_summary_from_object)
        .collect()
}

/// Maps a loosely shaped job record onto a summary, defaulting what is missing.
pub fn job_summary_from_object(object: &Map<String, Value>) -> JobSummary {
    let rate_text = string_field(object, &["rate"]);
    let rate_numeric = number_field(object, "rate_numeric")
        .or_else(|| rate_text.as_deref().and_then(parse_rate_text));
    let unit_text = string_field(object, &["rate_unit"]).or(rate_text);

    JobSummary {
        job_id: string_field(object, &["job_id", "id"]).unwrap_or_default(),
        title: string_field(object, &["title"]).unwrap_or_default(),
        city: string_field(object, &["city"]).unwrap_or_default(),
        state: string_field(object, &["state"]).unwrap_or_default(),
        profession: string_field(object, &["profession"]),
        specialty: string_field(object, &["specialty"]),
        rate_numeric,
        rate_unit: unit_text
            .as_deref()
            .map(RateUnit::from_text)
            .unwrap_or_default(),
        priority: string_field(object, &["priority"]),
        meta_line: string_field(object, &["metaLine", "meta_line"]),
        url: string_field(object, &["url"]),
    }
}

/// Whole-body chat reply; `None` when the body is not a JSON object.
pub fn decode_chat_reply(body: &[u8]) -> Option<ChatReply> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    let text = REPLY_TEXT_FIELDS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .unwrap_or(FALLBACK_REPLY)
        .to_string();
    let jobs = object
        .get("jobs")
        .and_then(Value::as_array)
        .map(|items| jobs_from_items(items))
        .unwrap_or_default();
    Some(ChatReply { text, jobs })
}

/// Listing endpoints answer with either a bare array or `{ "jobs": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobListPayload {
    Bare(Vec<Value>),
    Wrapped { jobs: Vec<Value> },
}

/// Decodes a job listing body; anything unexpected degrades to an empty list.
pub fn decode_job_list(body: &[u8]) -> Vec<JobSummary> {
    match serde_json::from_slice::<JobListPayload>(body) {
        Ok(JobListPayload::Bare(items)) | Ok(JobListPayload::Wrapped { jobs: items }) => {
            jobs_from_items(&items)
        }
        Err(_) => Vec::new(),
    }
}

/// Decodes a job detail body. A missing id is filled from the request.
pub fn decode_job_detail(body: &[u8], requested_id: &str) -> Option<JobDetail> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let object = value.as_object()?;
    let mut summary = job_summary_from_object(object);
    if summary.job_id.is_empty() {
        summary.job_id = requested_id.to_string();
    }

    Some(JobDetail {
        summary,
        rate_text: string_field(object, &["rate"]),
        description: string_field(object, &["description"]),
        onsite_type: string_field(object, &["onsite_type"]),
        start_date: string_field(object, &["start_date"]),
        description_points: object
            .get("description_points")
            .and_then(Value::as_array)
            .map(|points| {
                points
                    .iter()
                    .filter_map(Value::as_str)
                    .map(ToOwned::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        include_travel_lodging: object.get("include_travel_lodging").and_then(Value::as_bool),
    })
}

/// First present key wins; numbers are accepted and rendered as text.
fn string_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match object.get(*key)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn number_field(object: &Map<String, Value>, key: &str) -> Option<f64> {
    match object.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => parse_rate_text(text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn jobs_of(outcome: RecordOutcome) -> Vec<JobSummary> {
        match outcome {
            RecordOutcome::Event(StreamEvent::Jobs(jobs)) => jobs,
            other => panic!("expected jobs, got {other:?}"),
        }
    }

    #[test]
    fn text_record_yields_delta() {
        assert_eq!(
            decode_record_payload(r#"{"type":"text","data":"Hello"}"#),
            RecordOutcome::Event(StreamEvent::TextDelta("Hello".into()))
        );
    }

    #[test]
    fn blocks_record_parses_free_text_rate() {
        let jobs = jobs_of(decode_record_payload(
            r#"{"type":"blocks","data":[{"items":[{"job_id":"J1","title":"T","rate":"$90/hr"}]}]}"#,
        ));
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job_id, "J1");
        assert_eq!(jobs[0].title, "T");
        assert_eq!(jobs[0].rate_numeric, Some(90.0));
        assert_eq!(jobs[0].rate_unit, RateUnit::Hour);

        let jobs = jobs_of(decode_record_payload(
            r#"{"type":"blocks","data":[{"items":[{"rate":"$300/day"}]}]}"#,
        ));
        assert_eq!(jobs[0].rate_unit, RateUnit::Day);
        assert_eq!(jobs[0].rate_numeric, Some(300.0));
        assert_eq!(jobs[0].job_id, "");
    }

    #[test]
    fn blocks_without_items_give_empty_list() {
        assert!(jobs_of(decode_record_payload(r#"{"type":"blocks","data":[]}"#)).is_empty());
        assert!(
            jobs_of(decode_record_payload(r#"{"type":"blocks","data":[{"items":"x"}]}"#)).is_empty()
        );
        assert!(jobs_of(decode_record_payload(r#"{"type":"blocks"}"#)).is_empty());
    }

    #[test]
    fn only_first_block_is_used() {
        let jobs = jobs_of(decode_record_payload(
            r#"{"type":"blocks","data":[{"items":[{"job_id":"A"}]},{"items":[{"job_id":"B"}]}]}"#,
        ));
        let ids: Vec<_> = jobs.iter().map(|job| job.job_id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn numeric_rate_and_explicit_unit_take_precedence() {
        let jobs = jobs_of(decode_record_payload(
            r#"{"type":"blocks","data":[{"items":[{"job_id":"J","rate_numeric":450,"rate_unit":"day","rate":"$1/hr","metaLine":"Nights","priority":"High"}]}]}"#,
        ));
        assert_eq!(jobs[0].rate_numeric, Some(450.0));
        assert_eq!(jobs[0].rate_unit, RateUnit::Day);
        assert_eq!(jobs[0].meta_line.as_deref(), Some("Nights"));
        assert_eq!(jobs[0].priority.as_deref(), Some("High"));
    }

    #[test]
    fn unknown_types_and_bad_json() {
        assert_eq!(decode_record_payload(r#"{"type":"usage","data":{}}"#), RecordOutcome::Ignored);
        assert_eq!(decode_record_payload(r#"{"data":"x"}"#), RecordOutcome::Ignored);
        assert_eq!(decode_record_payload("[DONE]"), RecordOutcome::Ignored);
        assert!(matches!(decode_record_payload("{not json"), RecordOutcome::Malformed(_)));
    }

    #[test]
    fn reply_text_alias_chain() {
        let reply = decode_chat_reply(br#"{"reply":"second","message":"third"}"#).unwrap();
        assert_eq!(reply.text, "second");
        let reply = decode_chat_reply(br#"{"text":"first","reply":"second"}"#).unwrap();
        assert_eq!(reply.text, "first");
        let reply = decode_chat_reply(br#"{"jobs":[{"job_id":"J1"}]}"#).unwrap();
        assert_eq!(reply.text, FALLBACK_REPLY);
        assert_eq!(reply.jobs.len(), 1);
        assert!(decode_chat_reply(b"<html>").is_none());
        assert!(decode_chat_reply(b"[1,2]").is_none());
    }

    #[test]
    fn job_list_shapes() {
        assert_eq!(decode_job_list(br#"[{"job_id":"A"},{"job_id":"B"}]"#).len(), 2);
        assert_eq!(decode_job_list(br#"{"jobs":[{"job_id":"A"}]}"#).len(), 1);
        assert!(decode_job_list(br#"{"results":[]}"#).is_empty());
        assert!(decode_job_list(b"").is_empty());
        assert!(decode_job_list(b"null").is_empty());
    }

    #[test]
    fn job_detail_fields() {
        let detail = decode_job_detail(
            br#"{"title":"IR","city":"Charleston","state":"WV","rate":"$450/day","description_points":["a",1,"b"],"include_travel_lodging":true}"#,
            "JO-10145",
        )
        .unwrap();
        assert_eq!(detail.summary.job_id, "JO-10145");
        assert_eq!(detail.summary.rate_unit, RateUnit::Day);
        assert_eq!(detail.display_rate().as_deref(), Some("$450/day"));
        assert_eq!(detail.description_points, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(detail.include_travel_lodging, Some(true));
        assert!(decode_job_detail(b"not json", "x").is_none());
    }
}
