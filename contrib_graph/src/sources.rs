//! Remote per-day contribution sources. Both platforms report a flat
//! date-to-count mapping over roughly the trailing year behind very
//! different wire shapes: GitHub is an authenticated GraphQL query returning
//! nested weeks of days, GitLab a public JSON object keyed by date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::{GraphError, Window};

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";
const GITLAB_BASE_URL: &str = "https://gitlab.com";

const CONTRIBUTIONS_QUERY: &str = r#"
query($login: String!, $from: DateTime!, $to: DateTime!) {
  user(login: $login) {
    contributionsCollection(from: $from, to: $to) {
      contributionCalendar {
        weeks {
          contributionDays {
            date
            contributionCount
          }
        }
      }
    }
  }
}
"#;

/// A platform that can report per-day contribution counts for a bounded
/// calendar window. One network request per call, no retries.
#[allow(async_fn_in_trait)]
pub trait ContributionSource {
    fn name(&self) -> &'static str;

    async fn fetch(
        &self,
        client: &reqwest::Client,
        window: &Window,
    ) -> Result<BTreeMap<NaiveDate, u64>, GraphError>;
}

/// GitHub contribution calendar via the GraphQL API (bearer token).
#[derive(Clone, Debug)]
pub struct GithubSource {
    pub login: String,
    pub token: String,
}

impl ContributionSource for GithubSource {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        window: &Window,
    ) -> Result<BTreeMap<NaiveDate, u64>, GraphError> {
        let body = json!({
            "query": CONTRIBUTIONS_QUERY,
            "variables": {
                "login": self.login,
                "from": format!("{}T00:00:00Z", window.start),
                "to": format!("{}T23:59:59Z", window.end),
            },
        });
        let response = client
            .post(GITHUB_GRAPHQL_URL)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|cause| GraphError::Transport {
                source: self.name(),
                cause,
            })?;
        let status = response.status();
        let text = response.text().await.map_err(|cause| GraphError::Transport {
            source: self.name(),
            cause,
        })?;
        if !status.is_success() {
            return Err(GraphError::Status {
                source: self.name(),
                status: status.as_u16(),
                body: text,
            });
        }

        let decoded: GithubResponse =
            serde_json::from_str(&text).map_err(|cause| GraphError::Decode {
                source: self.name(),
                cause,
            })?;
        let calendar = decoded
            .data
            .and_then(|data| data.user)
            .map(|user| user.contributions_collection.contribution_calendar)
            .ok_or_else(|| GraphError::Shape {
                source: self.name(),
                detail: format!("no contribution calendar for login '{}'", self.login),
            })?;
        Ok(flatten_calendar(calendar))
    }
}

/// GitLab public activity calendar (`/users/{name}/calendar.json`, no auth).
/// The endpoint fixes its own trailing-year span, so the window is not sent.
#[derive(Clone, Debug)]
pub struct GitlabSource {
    pub username: String,
}

impl ContributionSource for GitlabSource {
    fn name(&self) -> &'static str {
        "GitLab"
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        _window: &Window,
    ) -> Result<BTreeMap<NaiveDate, u64>, GraphError> {
        let url = format!("{}/users/{}/calendar.json", GITLAB_BASE_URL, self.username);
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|cause| GraphError::Transport {
                source: self.name(),
                cause,
            })?;
        let status = response.status();
        let text = response.text().await.map_err(|cause| GraphError::Transport {
            source: self.name(),
            cause,
        })?;
        if !status.is_success() {
            return Err(GraphError::Status {
                source: self.name(),
                status: status.as_u16(),
                body: text,
            });
        }
        parse_date_counts(&text, self.name())
    }
}

#[derive(Debug, Deserialize)]
struct GithubResponse {
    data: Option<GithubData>,
}

#[derive(Debug, Deserialize)]
struct GithubData {
    user: Option<GithubUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GithubUser {
    contributions_collection: ContributionsCollection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContributionsCollection {
    contribution_calendar: ContributionCalendar,
}

#[derive(Debug, Deserialize)]
struct ContributionCalendar {
    weeks: Vec<CalendarWeek>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarWeek {
    contribution_days: Vec<CalendarDay>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarDay {
    date: String,
    contribution_count: u64,
}

/// Flatten the weeks/days nesting into a flat date→count map, summing if a
/// date somehow recurs.
fn flatten_calendar(calendar: ContributionCalendar) -> BTreeMap<NaiveDate, u64> {
    let mut out = BTreeMap::new();
    for week in calendar.weeks {
        for day in week.contribution_days {
            if let Ok(date) = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d") {
                *out.entry(date).or_insert(0) += day.contribution_count;
            }
        }
    }
    out
}

/// Decode a flat JSON object of date string → count. An empty body counts as
/// the empty object; keys that are not calendar dates are skipped.
fn parse_date_counts(
    body: &str,
    source: &'static str,
) -> Result<BTreeMap<NaiveDate, u64>, GraphError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, u64> =
        serde_json::from_str(trimmed).map_err(|cause| GraphError::Decode { source, cause })?;
    let mut out = BTreeMap::new();
    for (key, count) in raw {
        if let Ok(date) = NaiveDate::parse_from_str(&key, "%Y-%m-%d") {
            *out.entry(date).or_insert(0) += count;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn flatten_sums_recurring_dates() {
        let calendar = ContributionCalendar {
            weeks: vec![
                CalendarWeek {
                    contribution_days: vec![
                        CalendarDay {
                            date: "2024-06-02".to_string(),
                            contribution_count: 2,
                        },
                        CalendarDay {
                            date: "2024-06-03".to_string(),
                            contribution_count: 1,
                        },
                    ],
                },
                CalendarWeek {
                    contribution_days: vec![CalendarDay {
                        date: "2024-06-02".to_string(),
                        contribution_count: 4,
                    }],
                },
            ],
        };
        let flat = flatten_calendar(calendar);
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[&date("2024-06-02")], 6);
        assert_eq!(flat[&date("2024-06-03")], 1);
    }

    #[test]
    fn github_response_shape_decodes() {
        let payload = r#"{
            "data": {
                "user": {
                    "contributionsCollection": {
                        "contributionCalendar": {
                            "weeks": [
                                {"contributionDays": [
                                    {"date": "2024-06-02", "contributionCount": 3}
                                ]}
                            ]
                        }
                    }
                }
            }
        }"#;
        let decoded: GithubResponse = serde_json::from_str(payload).unwrap();
        let calendar = decoded
            .data
            .and_then(|data| data.user)
            .map(|user| user.contributions_collection.contribution_calendar)
            .unwrap();
        let flat = flatten_calendar(calendar);
        assert_eq!(flat[&date("2024-06-02")], 3);
    }

    #[test]
    fn empty_body_is_an_empty_calendar() {
        assert!(parse_date_counts("", "GitLab").unwrap().is_empty());
        assert!(parse_date_counts("  \n", "GitLab").unwrap().is_empty());
    }

    #[test]
    fn date_keyed_object_decodes() {
        let flat =
            parse_date_counts(r#"{"2024-06-02": 5, "2024-06-04": 1, "not-a-date": 9}"#, "GitLab")
                .unwrap();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat[&date("2024-06-02")], 5);
        assert_eq!(flat[&date("2024-06-04")], 1);
    }

    #[test]
    fn malformed_body_is_a_decode_error() {
        let err = parse_date_counts("[1, 2, 3", "GitLab").unwrap_err();
        assert!(matches!(err, GraphError::Decode { source: "GitLab", .. }));
    }
}
