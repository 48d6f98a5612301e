pub mod rate {
    use chrono::NaiveDate;

    /// One key rate observation, as delivered by the data source.
    #[derive(Debug, Clone, PartialEq)]
    pub struct KeyRate {
        pub date: NaiveDate,
        pub rate: f64,
    }

    impl KeyRate {
        pub fn new(date: NaiveDate, rate: f64) -> Self {
            Self { date, rate }
        }
    }

    pub trait KeyRateSource {
        async fn key_rate(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<KeyRate>, String>;
    }
}

pub mod key_rate {
    use std::str::FromStr;

    use chrono::{Days, NaiveDate};
    use serde::Serialize;
    use thiserror::Error;
    use tracing::error;

    use crate::service::rate::KeyRateSource;

    #[derive(Debug, PartialEq, Error)]
    pub enum Error {
        #[error("{0}")]
        InvalidDelta(&'static str),
        #[error("{0}")]
        InvalidPeriod(&'static str),
        #[error("could not fetch key rate data")]
        Unavailable,
    }

    /// Raw delta value as handed over by the boundary layer: either a number
    /// or the text that failed to look like one.
    #[derive(Debug, Clone, PartialEq)]
    pub enum DeltaInput {
        Value(f64),
        Raw(String),
    }

    impl DeltaInput {
        pub fn parse(s: &str) -> Self {
            match s.trim().parse::<f64>() {
                Ok(v) => Self::Value(v),
                Err(_) => Self::Raw(s.to_string()),
            }
        }
    }

    /// The three period shapes a caller may supply, plus a carrier for
    /// everything that fits none of them.
    #[derive(Debug, Clone, PartialEq)]
    pub enum PeriodInput {
        Days(i64),
        DayRange(i64, i64),
        DateRange(NaiveDate, NaiveDate),
        Unrecognized(String),
    }

    impl PeriodInput {
        pub fn parse(s: &str) -> Self {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();

            match parts.as_slice() {
                [n] => match n.parse::<i64>() {
                    Ok(n) => Self::Days(n),
                    Err(_) => Self::Unrecognized(s.to_string()),
                },
                [a, b] => {
                    if let (Ok(a), Ok(b)) = (a.parse::<i64>(), b.parse::<i64>()) {
                        Self::DayRange(a, b)
                    } else if let (Ok(a), Ok(b)) =
                        (NaiveDate::from_str(a), NaiveDate::from_str(b))
                    {
                        Self::DateRange(a, b)
                    } else {
                        Self::Unrecognized(s.to_string())
                    }
                }
                _ => Self::Unrecognized(s.to_string()),
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    pub struct Period {
        pub from: NaiveDate,
        pub to: NaiveDate,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Report {
        pub delta: f64,
        pub actual_delta: f64,
        pub pass: bool,
        pub period: Period,
        pub rate: f64,
    }

    /// A validated key rate delta check: threshold plus requested interval.
    /// Construction performs all input validation and never touches the
    /// network; `today` is injected so it stays deterministic under test.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Check {
        pub delta: f64,
        pub period: Period,
    }

    impl Check {
        pub fn new(
            delta: Option<DeltaInput>,
            period: Option<PeriodInput>,
            today: NaiveDate,
        ) -> Result<Self, Error> {
            Ok(Self {
                delta: validate_delta(delta.unwrap_or(DeltaInput::Value(1.0)))?,
                period: form_period(period.unwrap_or(PeriodInput::Days(7)), today)?,
            })
        }

        pub async fn run(&self, source: &impl KeyRateSource) -> Result<Report, Error> {
            let history = source
                .key_rate(self.period.from, self.period.to)
                .await
                .map_err(|err| {
                    error!("unable to fetch key rate history: {err}");
                    Error::Unavailable
                })?;

            let (Some(first), Some(last)) = (history.first(), history.last()) else {
                return Err(Error::Unavailable);
            };

            let actual_delta = last.rate - first.rate;

            Ok(Report {
                delta: self.delta,
                actual_delta,
                pass: self.delta <= actual_delta,
                period: Period {
                    from: first.date,
                    to: last.date,
                },
                rate: last.rate,
            })
        }
    }

    fn validate_delta(delta: DeltaInput) -> Result<f64, Error> {
        let DeltaInput::Value(delta) = delta else {
            return Err(Error::InvalidDelta("delta should be a Numeric"));
        };

        if !delta.is_finite() {
            return Err(Error::InvalidDelta("delta should be finite"));
        }
        if delta < 0.0 {
            return Err(Error::InvalidDelta("delta should not be negative"));
        }

        Ok(delta)
    }

    fn form_period(period: PeriodInput, today: NaiveDate) -> Result<Period, Error> {
        match period {
            PeriodInput::Days(n) => {
                if n <= 0 {
                    return Err(Error::InvalidPeriod("period should be positive"));
                }

                Ok(Period {
                    from: days_ago(today, n, "period should be positive")?,
                    to: today,
                })
            }
            PeriodInput::DayRange(a, b) => {
                if a < 0 || b < 0 {
                    return Err(Error::InvalidPeriod("period should have non-negative ends"));
                }
                if a <= b {
                    return Err(Error::InvalidPeriod("period should be descending"));
                }

                Ok(Period {
                    from: days_ago(today, a, "period should have non-negative ends")?,
                    to: days_ago(today, b, "period should have non-negative ends")?,
                })
            }
            // A date range is taken as given, with no ordering check. The
            // integer branch above requires strict descending order, and the
            // two branches really are asymmetric; see DESIGN.md.
            PeriodInput::DateRange(from, to) => Ok(Period { from, to }),
            PeriodInput::Unrecognized(_) => Err(Error::InvalidPeriod(
                "period should be an Integer, a Date Range or an Integer Range",
            )),
        }
    }

    fn days_ago(today: NaiveDate, n: i64, rule: &'static str) -> Result<NaiveDate, Error> {
        today
            .checked_sub_days(Days::new(n as u64))
            .ok_or(Error::InvalidPeriod(rule))
    }
}
