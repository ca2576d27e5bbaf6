use crate::account::AccountSummary;
use crate::task::TaskSummary;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Department")]
    department: String,
    #[tabled(rename = "Job Title")]
    job_title: String,
}

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Assigned To")]
    assigned_to: String,
    #[tabled(rename = "Manager")]
    manager: String,
}

fn or_dash(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn account_table(accounts: &[AccountSummary]) -> String {
    let rows: Vec<AccountRow> = accounts
        .iter()
        .map(|a| AccountRow {
            username: a.username.clone(),
            name: format!("{} {}", a.first_name, a.last_name),
            email: a.email.clone(),
            role: a.role.to_string(),
            department: or_dash(&a.department),
            job_title: or_dash(&a.job_title),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn task_table(tasks: &[TaskSummary]) -> String {
    let rows: Vec<TaskRow> = tasks
        .iter()
        .map(|t| TaskRow {
            id: t.id,
            title: t.title.clone(),
            description: t.description.clone(),
            status: t.status.to_string(),
            assigned_to: or_dash(&t.assigned_to),
            manager: or_dash(&t.manager),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::task::TaskStatus;

    #[test]
    fn test_empty_builder_renders_nothing() {
        assert!(TableBuilder::new().build().is_empty());
        assert!(stats_table(&[("Accounts", "3")]).contains("Accounts"));
    }

    #[test]
    fn test_account_table_fills_missing_fields() {
        let table = account_table(&[AccountSummary {
            username: "alice".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            email: "alice@example.com".into(),
            role: Role::Employee,
            department: None,
            job_title: Some("Analyst".into()),
        }]);
        assert!(table.contains("Alice Smith"));
        assert!(table.contains("Analyst"));
        assert!(table.contains(" - "));
    }

    #[test]
    fn test_task_table_has_no_feedback_column() {
        let table = task_table(&[TaskSummary {
            id: 7,
            title: "Audit".into(),
            description: "Q3".into(),
            status: TaskStatus::Accepted,
            assigned_to: Some("alice".into()),
            manager: None,
        }]);
        assert!(table.contains("Accepted"));
        assert!(table.contains("Assigned To"));
        assert!(!table.contains("Feedback"));
    }
}
