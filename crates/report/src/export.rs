use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use helpdesk_core::schema::{AdminAnalytics, Ticket};

pub struct ExportPaths {
    pub root: PathBuf,
}

impl ExportPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

/// Pretty-printed JSON array of the full collection, named by export
/// day like the browser download it replaces.
pub fn write_json(paths: &ExportPaths, tickets: &[Ticket], day: &str) -> Result<PathBuf> {
    paths.ensure()?;
    let path = paths.root.join(format!("support-tickets-{day}.json"));
    fs::write(&path, serde_json::to_string_pretty(tickets)?)?;
    Ok(path)
}

// Field order is part of the export contract; existing imports depend
// on it.
const CSV_HEADER: &str =
    "id,title,description,priority,category,status,email,createdDate,updatedDate";

pub fn write_csv(paths: &ExportPaths, tickets: &[Ticket], day: &str) -> Result<PathBuf> {
    paths.ensure()?;
    let path = paths.root.join(format!("support-tickets-{day}.csv"));

    let mut lines: Vec<String> = Vec::with_capacity(tickets.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for ticket in tickets {
        lines.push(csv_row(ticket));
    }
    let mut contents = lines.join("\n");
    contents.push('\n');

    fs::write(&path, contents)?;
    Ok(path)
}

fn csv_row(ticket: &Ticket) -> String {
    [
        csv_field(&ticket.id),
        csv_field(&ticket.title),
        csv_field(&ticket.description),
        csv_field(ticket.priority.as_str()),
        csv_field(ticket.category.as_str()),
        csv_field(ticket.status.as_str()),
        csv_field(ticket.email.as_deref().unwrap_or("")),
        csv_field(&ticket.created_date),
        csv_field(ticket.updated_date.as_deref().unwrap_or("")),
    ]
    .join(",")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Markdown dashboard snapshot of the computed analytics.
pub fn write_summary(paths: &ExportPaths, analytics: &AdminAnalytics, day: &str) -> Result<PathBuf> {
    paths.ensure()?;
    let path = paths.root.join(format!("ticket-summary-{day}.md"));

    let mut lines: Vec<String> = Vec::new();
    lines.push(format!("# Ticket Summary - {day}"));
    lines.push(String::new());
    lines.push("This report is generated. Do not edit manually.".to_string());
    lines.push(String::new());
    lines.push(format!("Total tickets: {}", analytics.total_tickets));
    lines.push(String::new());

    lines.push("## By Status".to_string());
    lines.push(String::new());
    lines.push(format!("- Open ({})", analytics.tickets_by_status.open));
    lines.push(format!(
        "- In Progress ({})",
        analytics.tickets_by_status.in_progress
    ));
    lines.push(format!("- Closed ({})", analytics.tickets_by_status.closed));
    lines.push(String::new());

    lines.push("## By Priority".to_string());
    lines.push(String::new());
    lines.push(format!("- Low ({})", analytics.tickets_by_priority.low));
    lines.push(format!(
        "- Medium ({})",
        analytics.tickets_by_priority.medium
    ));
    lines.push(format!("- High ({})", analytics.tickets_by_priority.high));
    lines.push(String::new());

    lines.push("## By Category".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- Access Request ({})",
        analytics.tickets_by_category.access_request
    ));
    lines.push(format!(
        "- Bug Ticket ({})",
        analytics.tickets_by_category.bug_ticket
    ));
    lines.push(format!(
        "- Feature Request ({})",
        analytics.tickets_by_category.feature_request
    ));
    lines.push(format!(
        "- General Support ({})",
        analytics.tickets_by_category.general_support
    ));
    lines.push(format!(
        "- Technical Issue ({})",
        analytics.tickets_by_category.technical_issue
    ));
    lines.push(String::new());

    lines.push("## Recent Activity".to_string());
    lines.push(String::new());
    lines.push(format!(
        "- New today: {}",
        analytics.recent_activity.new_tickets_today
    ));
    lines.push(format!(
        "- Closed today: {}",
        analytics.recent_activity.closed_tickets_today
    ));
    lines.push(format!(
        "- Average response time: {}h (proxy)",
        analytics.recent_activity.average_response_time
    ));
    lines.push(String::new());

    fs::write(&path, lines.join("\n"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helpdesk_core::analytics::compute_analytics;
    use helpdesk_core::schema::{Category, Priority, Status};
    use time::macros::datetime;

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: "Report totals, wrong".to_string(),
            description: "The \"weekly\" numbers do not add up.".to_string(),
            priority: Priority::Medium,
            category: Category::BugTicket,
            status: Status::Open,
            email: Some("reporter@example.com".to_string()),
            created_date: "2024-06-01T09:00:00Z".to_string(),
            updated_date: None,
        }
    }

    #[test]
    fn json_export_parses_back_to_the_same_tickets() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::new(dir.path().join("exports"));
        let tickets = vec![ticket("t1"), ticket("t2")];

        let path = write_json(&paths, &tickets, "2024-06-15").unwrap();
        assert!(path.ends_with("support-tickets-2024-06-15.json"));

        let raw = fs::read_to_string(path).unwrap();
        let parsed: Vec<Ticket> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, tickets);
    }

    #[test]
    fn csv_export_keeps_the_field_order_and_quotes_awkward_fields() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::new(dir.path().join("exports"));

        let path = write_csv(&paths, &[ticket("t1")], "2024-06-15").unwrap();
        let raw = fs::read_to_string(path).unwrap();
        let mut lines = raw.lines();

        assert_eq!(lines.next(), Some(CSV_HEADER));
        let row = lines.next().unwrap();
        assert!(row.starts_with("t1,\"Report totals, wrong\","));
        assert!(row.contains("\"The \"\"weekly\"\" numbers do not add up.\""));
        assert!(row.ends_with("Medium,Bug Ticket,Open,reporter@example.com,2024-06-01T09:00:00Z,"));
    }

    #[test]
    fn summary_report_lists_every_bucket() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ExportPaths::new(dir.path().join("exports"));
        let analytics = compute_analytics(
            &[ticket("t1")],
            datetime!(2024-06-15 12:00:00 UTC),
        );

        let path = write_summary(&paths, &analytics, "2024-06-15").unwrap();
        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.contains("Total tickets: 1"));
        assert!(raw.contains("- Bug Ticket (1)"));
        assert!(raw.contains("- Open (1)"));
        assert!(raw.contains("Do not edit manually."));
    }
}
