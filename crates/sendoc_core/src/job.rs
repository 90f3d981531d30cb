use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    #[default]
    Hour,
    Day,
}

impl RateUnit {
    /// Infers the unit from free text: anything mentioning "day" is a day rate.
    pub fn from_text(text: &str) -> Self {
        if text.to_ascii_lowercase().contains("day") {
            RateUnit::Day
        } else {
            RateUnit::Hour
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            RateUnit::Hour => "hr",
            RateUnit::Day => "day",
        }
    }
}

/// Card-level view of a listing, attached to an assistant message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: String,
    pub title: String,
    pub city: String,
    pub state: String,
    pub profession: Option<String>,
    pub specialty: Option<String>,
    pub rate_numeric: Option<f64>,
    pub rate_unit: RateUnit,
    pub priority: Option<String>,
    pub meta_line: Option<String>,
    pub url: Option<String>,
}

impl JobSummary {
    /// "City, ST", skipping whichever half is empty.
    pub fn location(&self) -> String {
        [self.city.as_str(), self.state.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// "$95/hr" style label; `None` when there is no usable rate.
    pub fn formatted_rate(&self) -> Option<String> {
        format_rate(self.rate_numeric, self.rate_unit)
    }
}

/// Full listing record as served by the job detail endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobDetail {
    pub summary: JobSummary,
    /// Preformatted rate text from the backend, preferred over the numeric rate.
    pub rate_text: Option<String>,
    pub description: Option<String>,
    pub onsite_type: Option<String>,
    pub start_date: Option<String>,
    pub description_points: Vec<String>,
    pub include_travel_lodging: Option<bool>,
}

impl JobDetail {
    pub fn display_rate(&self) -> Option<String> {
        self.rate_text
            .clone()
            .filter(|text| !text.trim().is_empty())
            .or_else(|| self.summary.formatted_rate())
    }
}

pub fn format_rate(rate: Option<f64>, unit: RateUnit) -> Option<String> {
    let rate = rate.filter(|value| value.is_finite() && *value > 0.0)?;
    Some(format!("${}/{}", rate, unit.short_label()))
}

/// Scans free text such as "$90/hr" or "USD 1,200 per day" for the first number.
///
/// Non-digit characters before the number are skipped; thousands separators
/// inside the digit run are dropped and a single decimal point is accepted.
pub fn parse_rate_text(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let mut number = String::new();
    let mut seen_dot = false;
    let mut chars = text[start..].chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '0'..='9' => number.push(c),
            ',' if chars.peek().is_some_and(char::is_ascii_digit) => {}
            '.' if !seen_dot && chars.peek().is_some_and(char::is_ascii_digit) => {
                seen_dot = true;
                number.push(c);
            }
            _ => break,
        }
    }
    number.parse().ok()
}

/// Detail route for a listing, with the id percent-encoded as a path segment.
pub fn job_route(job_id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(job_id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    format!("/jobs/{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_text_scan() {
        assert_eq!(parse_rate_text("$90/hr"), Some(90.0));
        assert_eq!(parse_rate_text("$300/day"), Some(300.0));
        assert_eq!(parse_rate_text("USD 1,200 per day"), Some(1200.0));
        assert_eq!(parse_rate_text("$92.50/hr"), Some(92.5));
        assert_eq!(parse_rate_text("competitive"), None);
        assert_eq!(parse_rate_text(""), None);
    }

    #[test]
    fn unit_inference_defaults_to_hour() {
        assert_eq!(RateUnit::from_text("$300/day"), RateUnit::Day);
        assert_eq!(RateUnit::from_text("per Day"), RateUnit::Day);
        assert_eq!(RateUnit::from_text("$90/hr"), RateUnit::Hour);
        assert_eq!(RateUnit::from_text(""), RateUnit::Hour);
    }

    #[test]
    fn rate_formatting_hides_zero() {
        assert_eq!(format_rate(Some(95.0), RateUnit::Hour).as_deref(), Some("$95/hr"));
        assert_eq!(format_rate(Some(450.0), RateUnit::Day).as_deref(), Some("$450/day"));
        assert_eq!(format_rate(Some(0.0), RateUnit::Hour), None);
        assert_eq!(format_rate(None, RateUnit::Day), None);
    }

    #[test]
    fn location_skips_empty_parts() {
        let job = JobSummary {
            city: "Pittsburgh".into(),
            state: "PA".into(),
            ..JobSummary::default()
        };
        assert_eq!(job.location(), "Pittsburgh, PA");
        let job = JobSummary {
            state: "WV".into(),
            ..JobSummary::default()
        };
        assert_eq!(job.location(), "WV");
    }

    #[test]
    fn route_encodes_id() {
        assert_eq!(job_route("JO-10234"), "/jobs/JO-10234");
        assert_eq!(job_route("a b/c"), "/jobs/a%20b%2Fc");
    }
}
