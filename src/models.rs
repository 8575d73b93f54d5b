//! Domain models shared with the tracker backend
//!
//! The backend speaks camelCase JSON and is loose about primitive types: ids
//! arrive as numbers or numeric strings and dates as ISO strings or
//! `[y, m, d, ...]` arrays. Everything is normalised on the way in.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Role of a staff member inside a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Partner,
    Manager,
    Developer,
    Tester,
    /// Anything the backend sends that this client does not know about
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const KNOWN: [Role; 5] = [
        Role::Admin,
        Role::Partner,
        Role::Manager,
        Role::Developer,
        Role::Tester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Partner => "PARTNER",
            Role::Manager => "MANAGER",
            Role::Developer => "DEVELOPER",
            Role::Tester => "TESTER",
            Role::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Role::KNOWN
            .into_iter()
            .find(|r| r.as_str() == upper)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Ticket priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Log severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Status vocabulary of the issue-tracking flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    ToDo,
    InProgress,
    Resolved,
    MergedToTest,
    Done,
}

/// Status vocabulary of the Kanban-board flow
///
/// Kept apart from [`IssueStatus`]: both describe a ticket but the backend
/// treats them as separate workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoardStatus {
    Pending,
    Resolved,
    Verified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    Monolithic,
    Microservices,
    MicroservicesPackage,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Monolithic => "MONOLITHIC",
            ProjectType::Microservices => "MICROSERVICES",
            ProjectType::MicroservicesPackage => "MICROSERVICES_PACKAGE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolutionStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
    Implemented,
}

/// A project, microservice package or microservice
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub repository_link: Option<String>,
    #[serde(default)]
    pub project_tag: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_date")]
    pub deadline_date: Option<NaiveDate>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    pub project_type: ProjectType,
    #[serde(default, deserialize_with = "coerce::opt_parent")]
    pub parent_project: Option<i64>,
    #[serde(default)]
    pub sub_projects: Vec<Project>,
    #[serde(default)]
    pub members_count: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub completed_tasks: u32,
}

impl Project {
    /// Progress in percent, clamped to 0..=100
    ///
    /// Uses the server figure when present, otherwise the task counters.
    pub fn progress(&self) -> u8 {
        let raw = match self.progress_percentage {
            Some(p) if p.is_finite() => p,
            _ if self.total_tasks > 0 => {
                f64::from(self.completed_tasks) * 100.0 / f64::from(self.total_tasks)
            }
            _ => 0.0,
        };
        raw.round().clamp(0.0, 100.0) as u8
    }

    /// Check the package/microservice parent invariant
    pub fn validate_hierarchy(&self) -> Result<(), String> {
        match (self.project_type, self.parent_project) {
            (ProjectType::Microservices, None) => Err(format!(
                "microservice '{}' has no parent package",
                self.name
            )),
            (ProjectType::MicroservicesPackage, Some(parent)) => Err(format!(
                "package '{}' must not have a parent (found {})",
                self.name, parent
            )),
            _ => Ok(()),
        }
    }

    pub fn is_package(&self) -> bool {
        self.project_type == ProjectType::MicroservicesPackage
    }
}

/// A ticket
///
/// `status` stays a raw string because two status vocabularies coexist; see
/// [`Ticket::status_as`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub assigned_to_user_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub log_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub solution: Option<Solution>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default, deserialize_with = "coerce::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Parse the raw status into one of the workflow vocabularies
    pub fn status_as<S: crate::policy::Workflow>(&self) -> Option<S> {
        S::parse(&self.status)
    }

    pub fn is_unassigned(&self) -> bool {
        self.assigned_to_user_id.is_none()
    }
}

/// An ingested application log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    #[serde(rename = "type")]
    pub log_type: String,
    #[serde(deserialize_with = "coerce::timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub handled: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
}

/// A proposed fix for a ticket (at most one per ticket)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub status: SolutionStatus,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub author_user_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub ticket_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A ticket comment; replies carry their parent's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    #[serde(deserialize_with = "coerce::id")]
    pub ticket_id: i64,
    pub content: String,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub author_user_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::ids")]
    pub mentioned_user_ids: Vec<i64>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub parent_comment_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A user of the tracker; staff members share the same shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "coerce::id")]
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

pub type StaffMember = User;

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Dashboard counters returned by the statistics endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_projects: u64,
    pub total_tickets: u64,
    pub open_tickets: u64,
    pub total_logs: u64,
    pub unhandled_logs: u64,
    pub tickets_by_status: BTreeMap<String, u64>,
    pub tickets_by_priority: BTreeMap<String, u64>,
    pub logs_by_severity: BTreeMap<String, u64>,
}

/// A push notification from the real-time feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub id: Option<i64>,
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub ticket_id: Option<i64>,
    #[serde(default, deserialize_with = "coerce::opt_id")]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub read: bool,
    #[serde(default, deserialize_with = "coerce::opt_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Logo attached to a project form
#[derive(Debug, Clone)]
pub struct Logo {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Fields for creating or updating a project (sent as multipart)
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub description: Option<String>,
    pub project_tag: String,
    pub technologies: Vec<String>,
    pub repository_link: Option<String>,
    pub deadline_date: Option<NaiveDate>,
    pub tags: Vec<String>,
    pub project_type: ProjectType,
    pub parent_project_id: Option<i64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub logo: Option<Logo>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, project_tag: impl Into<String>, project_type: ProjectType) -> Self {
        Self {
            name: name.into(),
            description: None,
            project_tag: project_tag.into(),
            technologies: Vec::new(),
            repository_link: None,
            deadline_date: None,
            tags: Vec::new(),
            project_type,
            parent_project_id: None,
            status: None,
            priority: None,
            logo: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: Priority,
    pub project_id: i64,
    pub assigned_to_user_id: Option<i64>,
    pub log_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub ticket_id: i64,
    pub content: String,
    pub author_user_id: i64,
    pub mentioned_user_ids: Vec<i64>,
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSolution {
    pub ticket_id: i64,
    pub title: String,
    pub content: String,
    pub complexity: Complexity,
    pub status: SolutionStatus,
    pub author_user_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStaffMember {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Lenient deserializers for ids and dates
mod coerce {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Text(String),
    }

    impl RawId {
        fn into_id<E: de::Error>(self) -> Result<Option<i64>, E> {
            match self {
                RawId::Num(n) => Ok(Some(n)),
                RawId::Text(s) if s.trim().is_empty() => Ok(None),
                RawId::Text(s) => s
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| E::custom(format!("invalid id '{}'", s))),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawParent {
        Object { id: Option<RawId> },
        Id(RawId),
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Parts(Vec<u32>),
    }

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        RawId::deserialize(d)?
            .into_id::<D::Error>()?
            .ok_or_else(|| de::Error::custom("empty id"))
    }

    pub fn opt_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            Some(raw) => raw.into_id(),
            None => Ok(None),
        }
    }

    pub fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<i64>, D::Error> {
        let raw = Option::<Vec<RawId>>::deserialize(d)?.unwrap_or_default();
        let mut out = Vec::with_capacity(raw.len());
        for r in raw {
            if let Some(id) = r.into_id::<D::Error>()? {
                out.push(id);
            }
        }
        Ok(out)
    }

    pub fn opt_parent<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<RawParent>::deserialize(d)? {
            Some(RawParent::Id(raw)) => raw.into_id(),
            Some(RawParent::Object { id: Some(raw) }) => raw.into_id(),
            Some(RawParent::Object { id: None }) | None => Ok(None),
        }
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<RawDate>::deserialize(d)? {
            None => Ok(None),
            Some(RawDate::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(RawDate::Text(s)) => parse_date(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date '{}'", s))),
            Some(RawDate::Parts(parts)) => date_from_parts(&parts)
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(|| de::Error::custom("invalid date array")),
        }
    }

    pub fn timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        opt_timestamp(d)?.ok_or_else(|| de::Error::custom("missing timestamp"))
    }

    pub fn opt_timestamp<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<RawDate>::deserialize(d)? {
            None => Ok(None),
            Some(RawDate::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(RawDate::Text(s)) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", s))),
            Some(RawDate::Parts(parts)) => date_from_parts(&parts)
                .map(Some)
                .ok_or_else(|| de::Error::custom("invalid timestamp array")),
        }
    }

    pub(super) fn parse_date(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_timestamp(s).map(|dt| dt.date_naive()))
    }

    pub(super) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        // Naive datetimes are taken as UTC
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })
    }

    fn date_from_parts(parts: &[u32]) -> Option<DateTime<Utc>> {
        let get = |i: usize| parts.get(i).copied().unwrap_or(0);
        if parts.len() < 3 {
            return None;
        }
        let year = i32::try_from(get(0)).ok()?;
        Utc.with_ymd_and_hms(year, get(1), get(2), get(3), get(4), get(5))
            .single()
    }
}
