//! Date annotation: extract → filter out of range → filter invalid → format.
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

use crate::types::DateAnnotation;

/// A date as written on the page. Not yet checked against the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// The four stages applied, in this order, to each page's text.
pub trait DateStages: Send + Sync {
    fn extract(&self, text: &str) -> Vec<RawDate>;
    fn filter_out_of_range(&self, dates: Vec<RawDate>) -> Vec<RawDate>;
    fn filter_invalid(&self, dates: Vec<RawDate>) -> Vec<NaiveDate>;
    fn format(&self, dates: Vec<NaiveDate>) -> DateAnnotation;
}

pub fn annotate(stages: &dyn DateStages, text: &str) -> DateAnnotation {
    let found = stages.extract(text);
    let in_range = stages.filter_out_of_range(found);
    let valid = stages.filter_invalid(in_range);
    stages.format(valid)
}

/// Default stages: ISO, month-first slash and English textual dates.
#[derive(Debug, Clone)]
pub struct CalendarDates {
    range_years: i32,
    reference: Option<NaiveDate>,
}

impl CalendarDates {
    pub fn new(range_years: i32) -> Self { Self { range_years, reference: None } }

    /// Pin the reference date instead of using today.
    pub fn with_reference(mut self, reference: NaiveDate) -> Self {
        self.reference = Some(reference);
        self
    }

    fn reference_year(&self) -> i32 {
        self.reference.unwrap_or_else(|| Local::now().date_naive()).year()
    }
}

const MONTHS: [&str; 12] = ["jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec"];

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let month = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
        let pattern = format!(
            r"(?i)\b(?:(?P<iy>\d{{4}})-(?P<im>\d{{1,2}})-(?P<id>\d{{1,2}})|(?P<sm>\d{{1,2}})/(?P<sd>\d{{1,2}})/(?P<sy>\d{{4}})|(?P<tm>{month})\.?\s+(?P<td>\d{{1,2}}),?\s+(?P<ty>\d{{4}})|(?P<rd>\d{{1,2}})\s+(?P<rm>{month})\.?,?\s+(?P<ry>\d{{4}}))\b"
        );
        // Built from constants only; a failure here is a bug in the pattern text.
        Regex::new(&pattern).expect("date pattern is a valid regex")
    })
}

fn month_number(name: &str) -> Option<u32> {
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS.iter().position(|m| *m == prefix).map(|i| i as u32 + 1)
}

impl DateStages for CalendarDates {
    fn extract(&self, text: &str) -> Vec<RawDate> {
        date_pattern()
            .captures_iter(text)
            .filter_map(|caps| {
                let num = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u32>().ok());
                let year = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<i32>().ok());
                if let Some(y) = year("iy") {
                    return Some(RawDate { year: y, month: num("im")?, day: num("id")? });
                }
                if let Some(y) = year("sy") {
                    return Some(RawDate { year: y, month: num("sm")?, day: num("sd")? });
                }
                if let Some(y) = year("ty") {
                    return Some(RawDate { year: y, month: month_number(caps.name("tm")?.as_str())?, day: num("td")? });
                }
                let y = year("ry")?;
                Some(RawDate { year: y, month: month_number(caps.name("rm")?.as_str())?, day: num("rd")? })
            })
            .collect()
    }

    fn filter_out_of_range(&self, dates: Vec<RawDate>) -> Vec<RawDate> {
        let reference = self.reference_year();
        dates.into_iter().filter(|d| (d.year - reference).abs() <= self.range_years).collect()
    }

    fn filter_invalid(&self, dates: Vec<RawDate>) -> Vec<NaiveDate> {
        dates.into_iter().filter_map(|d| NaiveDate::from_ymd_opt(d.year, d.month, d.day)).collect()
    }

    fn format(&self, dates: Vec<NaiveDate>) -> DateAnnotation {
        dates.into_iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }
}
