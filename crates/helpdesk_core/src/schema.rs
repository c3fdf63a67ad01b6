use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Closed,
}

/// Ticket categories across both schema generations. The retired label
/// "Bug Report" is rewritten to `BugTicket` at the deserialization
/// boundary via the serde alias; serialization only ever emits the
/// current labels, so the migration is one-way and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Category {
    #[serde(rename = "Access Request")]
    AccessRequest,
    #[serde(rename = "Bug Ticket", alias = "Bug Report")]
    BugTicket,
    #[serde(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "General Support")]
    GeneralSupport,
    #[serde(rename = "Technical Issue")]
    TechnicalIssue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub status: Status,
    /// Contact address; present from the second schema generation on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_date: String, // RFC 3339, set once at creation
    /// Stamped by the repository on every update; callers never set it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeArticle {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String, // free-form, not the closed ticket enum
    pub tags: Vec<String>,
    pub created_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUser {
    pub email: String,
    pub role: String,
    pub login_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub is_authenticated: bool,
    pub user: Option<AdminUser>,
    pub expires_at: String,
}

/// Presentation-side list filtering; all criteria are optional and
/// combined with AND.
#[derive(Debug, Clone, Default)]
pub struct TicketFilters {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    pub category: Option<Category>,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
    pub high_priority: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub open: usize,
    pub in_progress: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCounts {
    pub access_request: usize,
    pub bug_ticket: usize,
    pub feature_request: usize,
    pub general_support: usize,
    pub technical_issue: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub new_tickets_today: usize,
    pub closed_tickets_today: usize,
    /// Hours, rounded. A proxy (closed today over total, scaled to a
    /// day), not a measured latency. Kept for parity with the
    /// dashboards that already display it.
    pub average_response_time: i64,
}

/// Derived from the full ticket collection on each request; never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminAnalytics {
    pub total_tickets: usize,
    pub tickets_by_status: StatusCounts,
    pub tickets_by_priority: PriorityCounts,
    pub tickets_by_category: CategoryCounts,
    pub recent_activity: RecentActivity,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Closed => "Closed",
        }
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::AccessRequest => "Access Request",
            Category::BugTicket => "Bug Ticket",
            Category::FeatureRequest => "Feature Request",
            Category::GeneralSupport => "General Support",
            Category::TechnicalIssue => "Technical Issue",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(anyhow::anyhow!("Unknown priority: {value}")),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().replace('-', " ").as_str() {
            "open" => Ok(Status::Open),
            "in progress" => Ok(Status::InProgress),
            "closed" => Ok(Status::Closed),
            _ => Err(anyhow::anyhow!("Unknown status: {value}")),
        }
    }
}

impl std::str::FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().replace('-', " ").as_str() {
            "access request" => Ok(Category::AccessRequest),
            "bug ticket" => Ok(Category::BugTicket),
            "feature request" => Ok(Category::FeatureRequest),
            "general support" => Ok(Category::GeneralSupport),
            "technical issue" => Ok(Category::TechnicalIssue),
            _ => Err(anyhow::anyhow!("Unknown category: {value}")),
        }
    }
}
