use crate::{emit_success, AccountCommand, OutputMode, TaskCommand};
use anyhow::{bail, Context};
use owo_colors::OwoColorize;
use staffdesk::config::{self, StaffdeskConfig};
use staffdesk::ui::{self, banner, info, section, status_badge, success, summary_row, Icons};
use staffdesk::{Account, NewAccount, NewTask, Role, SqliteStore, Task, TaskAction};
use std::path::Path;

/// Blank required fields are rejected here, before anything reaches the store.
fn require_filled(fields: &[(&str, &str)]) -> anyhow::Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        bail!("All fields must be filled out (missing: {}).", missing.join(", "));
    }
    Ok(())
}

pub fn run_init(
    config_path: Option<&Path>,
    database: Option<&Path>,
    force: bool,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);

    let file_config = match config::load_config(Some(&path))? {
        Some(existing) if !force => {
            tracing::info!(path = %path.display(), "Keeping existing config");
            existing
        }
        _ => {
            let fresh = StaffdeskConfig {
                database: Some(
                    database
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| config::default_database_path_in(Path::new(".")))
                        .display()
                        .to_string(),
                ),
                busy_timeout_ms: Some(config::DEFAULT_BUSY_TIMEOUT_MS),
                username_match: Some(Default::default()),
                on_account_delete: Some(Default::default()),
            };
            config::write_config(&path, &fresh, true)?;
            fresh
        }
    };

    let store_config = file_config.resolve(database);
    config::ensure_db_dir(&store_config.path)?;
    let store = SqliteStore::new(store_config);
    store
        .initialize()
        .with_context(|| format!("could not create tables in {}", store.path().display()))?;

    if output_mode.is_human() {
        success("Database ready");
        info("Config", &path.display().to_string());
        info("Database", &store.path().display().to_string());
    } else {
        emit_success(
            output_mode,
            "init",
            serde_json::json!({
                "config": path.display().to_string(),
                "database": store.path().display().to_string(),
            }),
        )?;
    }
    Ok(())
}

pub fn run_login(
    store: &SqliteStore,
    username: &str,
    password: &str,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    require_filled(&[("username", username), ("password", password)])?;
    let Some(account) = store.find_by_credentials(username, password) else {
        bail!("Invalid username or password.");
    };

    match account.role {
        Role::Employee => {
            let tasks = store.find_by_assignee(&account.username);
            if output_mode.is_human() {
                banner(
                    &format!("{} Welcome, {}", Icons::PERSON, account.full_name()),
                    "Employee view",
                );
                print_profile(&account);
                section("My Tasks");
                print_task_cards(&tasks);
            } else {
                emit_success(
                    output_mode,
                    "login",
                    serde_json::json!({ "account": account, "tasks": tasks }),
                )?;
            }
        }
        Role::Hr => {
            let employees = store.list_employee_accounts();
            let tasks = store.list_tasks();
            if output_mode.is_human() {
                banner(
                    &format!("{} Welcome, {}", Icons::PERSON, account.full_name()),
                    "HR view",
                );
                print_profile(&account);
                section("Employees");
                print_or_empty(employees.is_empty(), || ui::account_table(&employees));
                section("Tasks");
                print_or_empty(tasks.is_empty(), || ui::task_table(&tasks));
            } else {
                emit_success(
                    output_mode,
                    "login",
                    serde_json::json!({
                        "account": account,
                        "employees": employees,
                        "tasks": tasks,
                    }),
                )?;
            }
        }
    }
    Ok(())
}

pub fn run_account(
    store: &SqliteStore,
    command: AccountCommand,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        AccountCommand::Add {
            username,
            password,
            role,
            first_name,
            last_name,
            email,
            department,
            job_title,
        } => {
            require_filled(&[
                ("username", username.as_str()),
                ("password", password.as_str()),
                ("first name", first_name.as_str()),
                ("last name", last_name.as_str()),
                ("email", email.as_str()),
            ])?;
            let account = NewAccount {
                username,
                password,
                role,
                first_name,
                last_name,
                department,
                job_title,
                email,
            };
            if !store.create_account(&account) {
                bail!("Failed to add employee.");
            }
            report(
                output_mode,
                "account.add",
                &format!("Account {} created", account.username),
                serde_json::json!({
                    "username": account.username,
                    "role": account.role,
                }),
            )
        }

        AccountCommand::Remove { username } => {
            if !store.delete_account(&username) {
                bail!("Failed to delete employee.");
            }
            report(
                output_mode,
                "account.remove",
                &format!("Account {} deleted", username),
                serde_json::json!({
                    "username": username,
                }),
            )
        }

        AccountCommand::Show { username } => {
            let Some(account) = store.find_by_username(&username) else {
                bail!("User not found.");
            };
            if output_mode.is_human() {
                print_profile(&account);
                Ok(())
            } else {
                emit_success(output_mode, "account.show", serde_json::to_value(&account)?)
            }
        }

        AccountCommand::Update {
            username,
            first_name,
            last_name,
            role,
            department,
            job_title,
            email,
        } => {
            let Some(mut account) = store.find_by_username(&username) else {
                bail!("User not found.");
            };
            if let Some(first_name) = first_name {
                account.first_name = first_name;
            }
            if let Some(last_name) = last_name {
                account.last_name = last_name;
            }
            if let Some(role) = role {
                account.role = role;
            }
            if let Some(department) = department {
                account.department = Some(department).filter(|d| !d.trim().is_empty());
            }
            if let Some(job_title) = job_title {
                account.job_title = Some(job_title).filter(|j| !j.trim().is_empty());
            }
            if let Some(email) = email {
                account.email = email;
            }
            require_filled(&[
                ("first name", account.first_name.as_str()),
                ("last name", account.last_name.as_str()),
                ("email", account.email.as_str()),
            ])?;

            if !store.update_account(&account) {
                bail!("Failed to update employee.");
            }
            report(
                output_mode,
                "account.update",
                &format!("Account {} updated", account.username),
                serde_json::to_value(&account)?,
            )
        }

        AccountCommand::List { names } => {
            if names {
                let usernames = store.list_employee_usernames();
                if output_mode.is_human() {
                    for name in &usernames {
                        println!("{}", name);
                    }
                    Ok(())
                } else {
                    emit_success(output_mode, "account.list", serde_json::json!(usernames))
                }
            } else {
                let accounts = store.list_employee_accounts();
                if output_mode.is_human() {
                    print_or_empty(accounts.is_empty(), || ui::account_table(&accounts));
                    Ok(())
                } else {
                    emit_success(output_mode, "account.list", serde_json::to_value(&accounts)?)
                }
            }
        }
    }
}

pub fn run_task(
    store: &SqliteStore,
    command: TaskCommand,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add {
            title,
            description,
            assignee,
            manager,
            feedback,
        } => {
            require_filled(&[
                ("title", title.as_str()),
                ("description", description.as_str()),
                ("assignee", assignee.as_str()),
                ("manager", manager.as_str()),
            ])?;
            let mut task = NewTask::new(title, description, assignee, manager);
            task.feedback = feedback.filter(|f| !f.trim().is_empty());

            let id = store.try_create_task(&task).map_err(|e| {
                tracing::warn!(error = %e, "create_task failed");
                anyhow::anyhow!("Failed to create task.")
            })?;
            report(
                output_mode,
                "task.add",
                &format!("Task #{} created", id),
                serde_json::json!({
                    "id": id,
                    "status": staffdesk::TaskStatus::Assigned,
                }),
            )
        }

        TaskCommand::Update {
            id,
            title,
            description,
            status,
            assignee,
            manager,
            feedback,
        } => {
            let mut task = find_task(store, id)?;
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(status) = status {
                task.status = status;
            }
            if let Some(assignee) = assignee {
                task.assigned_to = Some(assignee);
            }
            if let Some(manager) = manager {
                task.manager = Some(manager);
            }
            if let Some(feedback) = feedback {
                task.feedback = Some(feedback).filter(|f| !f.trim().is_empty());
            }
            require_filled(&[("title", task.title.as_str()), ("description", task.description.as_str())])?;

            if !store.update_task(&task) {
                bail!("Failed to update task.");
            }
            report(
                output_mode,
                "task.update",
                &format!("Task #{} updated", id),
                serde_json::to_value(&task)?,
            )
        }

        TaskCommand::Remove { id } => {
            if !store.delete_task(id) {
                bail!("Enter valid Task ID!");
            }
            report(output_mode, "task.remove", &format!("Task #{} deleted", id), serde_json::json!({ "id": id }))
        }

        TaskCommand::List => {
            let tasks = store.list_tasks();
            if output_mode.is_human() {
                print_or_empty(tasks.is_empty(), || ui::task_table(&tasks));
                Ok(())
            } else {
                emit_success(output_mode, "task.list", serde_json::to_value(&tasks)?)
            }
        }

        TaskCommand::Assigned { username } => {
            let tasks = store.find_by_assignee(&username);
            if output_mode.is_human() {
                print_task_cards(&tasks);
                Ok(())
            } else {
                emit_success(output_mode, "task.assigned", serde_json::to_value(&tasks)?)
            }
        }

        TaskCommand::Managed { username } => {
            let tasks = store.find_by_manager(&username);
            if output_mode.is_human() {
                print_task_cards(&tasks);
                Ok(())
            } else {
                emit_success(output_mode, "task.managed", serde_json::to_value(&tasks)?)
            }
        }

        TaskCommand::Feedback { id } => {
            let task = find_task(store, id)?;
            if output_mode.is_human() {
                match &task.feedback {
                    Some(feedback) => println!("{} {}", Icons::NOTE, feedback),
                    None => println!("{} {}", Icons::EMPTY, ui::muted("No feedback yet.")),
                }
                Ok(())
            } else {
                emit_success(
                    output_mode,
                    "task.feedback",
                    serde_json::json!({ "id": task.id, "feedback": task.feedback }),
                )
            }
        }

        TaskCommand::Accept { id } => run_action(store, id, TaskAction::Accept, output_mode),
        TaskCommand::Reject { id } => run_action(store, id, TaskAction::Reject, output_mode),
        TaskCommand::Complete { id } => run_action(store, id, TaskAction::Complete, output_mode),
    }
}

fn run_action(
    store: &SqliteStore,
    id: i64,
    action: TaskAction,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    if !store.apply_action(id, action) {
        bail!("Could not {} task #{}.", action, id);
    }
    let status = action.target();
    report(
        output_mode,
        &format!("task.{}", action),
        &format!("Task #{} is now {}", id, status),
        serde_json::json!({ "id": id, "status": status }),
    )
}

pub fn run_stats(store: &SqliteStore, output_mode: OutputMode) -> anyhow::Result<()> {
    let stats = store.stats()?;
    if output_mode.is_human() {
        banner(
            &format!("{} Staffdesk Statistics", Icons::STATS),
            &store.path().display().to_string(),
        );
        let accounts = stats.accounts.to_string();
        let employees = stats.employees.to_string();
        let tasks = stats.tasks().to_string();
        let by_status: Vec<(String, String)> = stats
            .tasks_by_status
            .iter()
            .map(|(status, count)| (format!("  {}", status), count.to_string()))
            .collect();
        let mut rows = vec![
            ("Accounts", accounts.as_str()),
            ("Employees", employees.as_str()),
            ("Tasks", tasks.as_str()),
        ];
        rows.extend(by_status.iter().map(|(s, c)| (s.as_str(), c.as_str())));
        println!("{}", ui::stats_table(&rows));
        Ok(())
    } else {
        let by_status: serde_json::Map<String, serde_json::Value> = stats
            .tasks_by_status
            .iter()
            .map(|(status, count)| (status.to_string(), serde_json::json!(count)))
            .collect();
        emit_success(
            output_mode,
            "stats",
            serde_json::json!({
                "accounts": stats.accounts,
                "employees": stats.employees,
                "tasks": stats.tasks(),
                "tasks_by_status": by_status,
            }),
        )
    }
}

fn find_task(store: &SqliteStore, id: i64) -> anyhow::Result<Task> {
    match store.try_find_task(id) {
        Ok(Some(task)) => Ok(task),
        Ok(None) => bail!("Task #{} not found.", id),
        Err(e) => {
            tracing::error!(task_id = id, error = %e, "find_task failed");
            bail!("Could not read task #{}.", id)
        }
    }
}

fn report(
    output_mode: OutputMode,
    command: &str,
    message: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if output_mode.is_human() {
        success(message);
        Ok(())
    } else {
        emit_success(output_mode, command, data)
    }
}

fn print_or_empty(empty: bool, render: impl FnOnce() -> String) {
    if empty {
        println!("{} {}", Icons::EMPTY, ui::muted("Nothing to show."));
    } else {
        println!("{}", render());
    }
}

fn print_profile(account: &Account) {
    summary_row("Username:", &account.username);
    summary_row("Name:", &account.full_name());
    summary_row("Role:", account.role.as_str());
    summary_row("Email:", &account.email);
    summary_row("Department:", account.department.as_deref().unwrap_or("-"));
    summary_row("Job Title:", account.job_title.as_deref().unwrap_or("-"));
}

/// One block per task, the way an employee sees their own work.
fn print_task_cards(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("{} {}", Icons::EMPTY, ui::muted("No tasks."));
        return;
    }

    for task in tasks {
        println!();
        println!(
            "{} #{} {} {}",
            Icons::TASK,
            task.id,
            task.title.bold(),
            status_badge(task.status)
        );
        println!("   {}", task.description);
        summary_row(" Manager:", task.manager.as_deref().unwrap_or("-"));
        let actions = TaskAction::available(task.status);
        if !actions.is_empty() {
            let names: Vec<&str> = actions.iter().map(TaskAction::as_str).collect();
            summary_row(" Actions:", &names.join(", "));
        }
        if let Some(feedback) = &task.feedback {
            summary_row(" Feedback:", feedback);
        }
    }
}
