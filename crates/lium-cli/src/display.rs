use crate::Result;
use chrono::{DateTime, Local, Utc};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use lium_core::{BackupConfig, BackupLog, ExecutorInfo, PodInfo, Template, VolumeInfo};
use lium_utils::{
    format_cost, format_duration_between, format_file_count, format_frequency, format_relative,
    format_retention, format_size_gb, format_uptime, mid_ellipsize, PodUtils,
};

/// Table formatting utilities
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    max_widths: Vec<usize>,
}

/// Printable width, ignoring ANSI colour sequences
pub fn visible_width(s: &str) -> usize {
    let mut width = 0;
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

impl Table {
    pub fn new<S: Into<String>>(headers: Vec<S>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let max_widths = headers.iter().map(|h| visible_width(h)).collect();
        Self {
            headers,
            rows: Vec::new(),
            max_widths,
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.max_widths.len() {
                self.max_widths[i] = self.max_widths[i].max(visible_width(cell));
            }
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        self.print_separator('┌', '┬', '┐');
        self.print_header();
        self.print_separator('├', '┼', '┤');
        for row in &self.rows {
            self.print_row(row);
        }
        self.print_separator('└', '┴', '┘');
    }

    fn print_separator(&self, left: char, mid: char, right: char) {
        let parts: Vec<String> = self
            .max_widths
            .iter()
            .map(|&w| "─".repeat(w + 2))
            .collect();
        println!("{}{}{}", left, parts.join(&mid.to_string()), right);
    }

    fn print_header(&self) {
        let cells: Vec<String> = self
            .headers
            .iter()
            .map(|h| h.bold().to_string())
            .collect();
        self.print_row(&cells);
    }

    fn print_row(&self, row: &[String]) {
        print!("│");
        for (i, width) in self.max_widths.iter().enumerate() {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            let pad = width.saturating_sub(visible_width(cell));
            print!(" {}{} │", cell, " ".repeat(pad));
        }
        println!();
    }
}

fn or_dash(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| "—".to_string())
}

/// "8×H100"
pub fn gpu_config(executor: Option<&ExecutorInfo>) -> String {
    match executor {
        Some(e) if !e.gpu_type.is_empty() => format!("{}×{}", e.gpu_count, e.gpu_type),
        _ => "—".to_string(),
    }
}

fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Executors ranked by `rank_executors`; Pareto-optimal rows get a star
pub fn display_executors_table(rows: &[(ExecutorInfo, bool)]) {
    if rows.is_empty() {
        println!("{}", "No executors found.".yellow());
        return;
    }

    let mut table = Table::new(vec![
        "", "#", "HUID", "GPU", "$/GPU/h", "$/h", "VRAM", "RAM", "Disk", "Net ↑/↓", "Location",
    ]);

    for (i, (executor, optimal)) in rows.iter().enumerate() {
        let star = if *optimal {
            "★".yellow().to_string()
        } else {
            String::new()
        };
        table.add_row(vec![
            star,
            (i + 1).to_string(),
            executor.huid.cyan().to_string(),
            gpu_config(Some(executor)),
            format!("{:.2}", executor.price_per_gpu_hour).green().to_string(),
            format!("{:.2}", executor.price_per_hour),
            or_dash(executor.vram_gb(), |v| format!("{:.0}G", v)),
            or_dash(executor.ram_gb(), |v| format!("{:.0}G", v)),
            or_dash(executor.disk_gb(), |v| format!("{:.0}G", v)),
            format!(
                "{}/{}",
                or_dash(executor.net_up(), |v| format!("{:.0}", v)),
                or_dash(executor.net_down(), |v| format!("{:.0}", v))
            ),
            executor.country(),
        ]);
    }

    table.print();
    if rows.iter().any(|(_, optimal)| *optimal) {
        println!("{} Pareto-optimal on price and hardware", "★".yellow());
    }
}

pub fn display_executors_detailed(rows: &[(ExecutorInfo, bool)]) {
    if rows.is_empty() {
        println!("{}", "No executors found.".yellow());
        return;
    }

    for (i, (e, optimal)) in rows.iter().enumerate() {
        let star = if *optimal { " ★" } else { "" };
        println!(
            "{} {}{}",
            format!("[{}]", i + 1).bold(),
            e.huid.cyan(),
            star.yellow()
        );
        println!("    Machine:   {}", e.machine_name);
        println!("    GPUs:      {}", gpu_config(Some(e)));
        println!(
            "    Price:     ${:.2}/GPU/h  (${:.2}/h)",
            e.price_per_gpu_hour, e.price_per_hour
        );
        println!(
            "    VRAM:      {}   RAM: {}   Disk: {}",
            or_dash(e.vram_gb(), |v| format!("{:.0} GB", v)),
            or_dash(e.ram_gb(), |v| format!("{:.0} GB", v)),
            or_dash(e.disk_gb(), |v| format!("{:.0} GB", v))
        );
        println!(
            "    PCIe:      {}   Mem: {}   TFLOPS: {}",
            or_dash(e.pcie_speed(), |v| format!("{:.0} MB/s", v)),
            or_dash(e.memory_speed(), |v| format!("{:.0} MB/s", v)),
            or_dash(e.tflops(), |v| format!("{:.1}", v))
        );
        println!(
            "    Network:   ↑ {} / ↓ {} Mbps",
            or_dash(e.net_up(), |v| format!("{:.0}", v)),
            or_dash(e.net_down(), |v| format!("{:.0}", v))
        );
        println!("    Location:  {}", e.country());
        if let Some(ports) = e.available_port_count {
            println!("    Ports:     {}", ports);
        }
        if let Some(driver) = e.driver_version() {
            println!("    Driver:    {}", driver);
        }
        println!();
    }
}

pub fn colored_status(status: &str) -> String {
    match status.to_uppercase().as_str() {
        "RUNNING" => status.green().to_string(),
        "PENDING" | "STARTING" | "CREATING" | "REBOOTING" => status.yellow().to_string(),
        "FAILED" | "STOPPED" | "ERROR" => status.red().to_string(),
        _ => status.to_string(),
    }
}

pub fn display_pods_table(pods: &[PodInfo], now: DateTime<Utc>) {
    if pods.is_empty() {
        println!("{}", "No active pods.".yellow());
        return;
    }

    let mut table = Table::new(vec![
        "#", "HUID", "Name", "Status", "Config", "$/h", "Uptime", "Cost", "Removal", "SSH",
    ]);

    for (i, pod) in pods.iter().enumerate() {
        let rate = PodUtils::price_per_hour(pod);
        let uptime = PodUtils::uptime_seconds(pod, now);
        table.add_row(vec![
            (i + 1).to_string(),
            pod.huid.cyan().to_string(),
            mid_ellipsize(&pod.name, 24),
            colored_status(&pod.status),
            gpu_config(pod.executor.as_ref()),
            format!("{:.2}", rate),
            uptime.map(format_uptime).unwrap_or_else(|| "—".to_string()),
            uptime
                .map(|secs| format_cost(secs, rate))
                .unwrap_or_else(|| "—".to_string()),
            pod.removal_scheduled_at
                .map(local_time)
                .unwrap_or_else(|| "—".to_string()),
            mid_ellipsize(pod.ssh_cmd.as_deref().unwrap_or(""), 40),
        ]);
    }

    table.print();
}

pub fn display_pod_details(pod: &PodInfo, now: DateTime<Utc>) {
    println!("{} {}", pod.huid.cyan().bold(), format!("({})", pod.id).dimmed());
    println!("  Name:      {}", pod.name);
    println!("  Status:    {}", colored_status(&pod.status));
    println!("  Config:    {}", gpu_config(pod.executor.as_ref()));
    if let Some(executor) = &pod.executor {
        println!("  Executor:  {} ({})", executor.huid, executor.country());
        println!("  Price:     ${:.2}/h", executor.price_per_hour);
    }
    if let Some(name) = pod.template_name() {
        println!("  Template:  {}", name);
    }
    if let Some(created) = pod.created_at {
        let secs = PodUtils::uptime_seconds(pod, now).unwrap_or(0);
        println!(
            "  Uptime:    {} (since {})",
            format_uptime(secs),
            local_time(created)
        );
        println!(
            "  Cost:      {}",
            format_cost(secs, PodUtils::price_per_hour(pod))
        );
    }
    if let Some(ssh) = &pod.ssh_cmd {
        println!("  SSH:       {}", ssh);
    }
    if !pod.ports.is_empty() {
        let mut ports: Vec<_> = pod.ports.iter().collect();
        ports.sort();
        let rendered: Vec<String> = ports
            .iter()
            .map(|(internal, external)| format!("{}→{}", internal, external))
            .collect();
        println!("  Ports:     {}", rendered.join(", "));
    }
    if let Some(removal) = pod.removal_scheduled_at {
        println!("  Removal:   {}", local_time(removal).yellow());
    }
    if let Some(url) = &pod.jupyter_url {
        println!("  Jupyter:   {}", url);
    }
    println!();
}

/// ✓ verified, ✗ failed, ? anything else
pub fn template_status_icon(status: &str) -> String {
    match status.to_uppercase().as_str() {
        "VERIFY_SUCCESS" => "✓".green().to_string(),
        "VERIFY_FAILED" => "✗".red().to_string(),
        _ => "?".yellow().to_string(),
    }
}

pub fn display_templates_table(templates: &[Template]) {
    if templates.is_empty() {
        println!("{}", "No templates found.".yellow());
        return;
    }

    let mut table = Table::new(vec!["#", "", "Name", "Image", "Category", "ID"]);
    for (i, template) in templates.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            template_status_icon(&template.status),
            mid_ellipsize(&template.name, 30),
            mid_ellipsize(&template.image_ref(), 50),
            template.category.clone(),
            template.id.dimmed().to_string(),
        ]);
    }
    table.print();
}

pub fn display_volumes_table(volumes: &[VolumeInfo], now: DateTime<Utc>) {
    if volumes.is_empty() {
        println!("{}", "No volumes.".yellow());
        return;
    }

    let mut table = Table::new(vec!["#", "HUID", "Name", "Size", "Files", "Description", "Created"]);
    for (i, volume) in volumes.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            volume.huid.cyan().to_string(),
            volume.name.clone(),
            format_size_gb(volume.current_size_gb),
            format_file_count(volume.current_file_count),
            mid_ellipsize(&volume.description, 30),
            volume
                .created_at
                .map(|ts| format_relative(ts, now))
                .unwrap_or_else(|| "—".to_string()),
        ]);
    }
    table.print();
}

/// Backup configs; `pod_name` maps an executor id to the pod using it
pub fn display_backup_configs_table<F>(configs: &[BackupConfig], pod_name: F, now: DateTime<Utc>)
where
    F: Fn(&str) -> Option<String>,
{
    if configs.is_empty() {
        println!("{}", "No backup configurations.".yellow());
        return;
    }

    let mut table = Table::new(vec![
        "#", "HUID", "Pod", "Path", "Frequency", "Retention", "Active", "Created",
    ]);
    for (i, config) in configs.iter().enumerate() {
        let active = if config.is_active {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        };
        table.add_row(vec![
            (i + 1).to_string(),
            config.huid.cyan().to_string(),
            pod_name(&config.pod_executor_id)
                .unwrap_or_else(|| mid_ellipsize(&config.pod_executor_id, 12)),
            config.backup_path.clone(),
            format_frequency(config.backup_frequency_hours),
            format_retention(config.retention_days),
            active,
            config
                .created_at
                .map(|ts| format_relative(ts, now))
                .unwrap_or_else(|| "—".to_string()),
        ]);
    }
    table.print();
}

pub fn display_backup_logs_table(logs: &[BackupLog], now: DateTime<Utc>) {
    if logs.is_empty() {
        println!("{}", "No backups yet.".yellow());
        return;
    }

    let mut table = Table::new(vec!["#", "Backup ID", "Status", "Started", "Duration", "Note"]);
    for (i, log) in logs.iter().enumerate() {
        let status = match log.status.to_uppercase().as_str() {
            "COMPLETED" | "SUCCESS" => log.status.green().to_string(),
            "FAILED" => log.status.red().to_string(),
            _ => log.status.yellow().to_string(),
        };
        let duration = match (log.started_at, log.completed_at) {
            (Some(start), Some(end)) => format_duration_between(start, end),
            (Some(start), None) => format!("{} (running)", format_duration_between(start, now)),
            _ => "—".to_string(),
        };
        let note = log
            .error_message
            .clone()
            .or_else(|| log.progress.map(|p| format!("{:.0}%", p)))
            .unwrap_or_default();

        table.add_row(vec![
            (i + 1).to_string(),
            log.id.clone(),
            status,
            log.started_at
                .map(|ts| format_relative(ts, now))
                .unwrap_or_else(|| "—".to_string()),
            duration,
            mid_ellipsize(&note, 40),
        ]);
    }
    table.print();
}

/// Interactive prompts
pub fn prompt_confirm(message: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .default(default)
        .interact()?)
}

pub fn prompt_input(message: &str, default: Option<&str>) -> Result<String> {
    let theme = ColorfulTheme::default();
    let mut input = Input::<String>::with_theme(&theme).with_prompt(message);
    if let Some(default_val) = default {
        input = input.default(default_val.to_string());
    }
    Ok(input.interact_text()?)
}

/// Masked input
pub fn prompt_secret(message: &str) -> Result<String> {
    Ok(Password::with_theme(&ColorfulTheme::default())
        .with_prompt(message)
        .interact()?)
}

/// Status messages
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_width_ignores_ansi() {
        assert_eq!(visible_width("plain"), 5);
        assert_eq!(visible_width("\u{1b}[32mgreen\u{1b}[0m"), 5);
        assert_eq!(visible_width("8×H100"), 6);
        assert_eq!(visible_width(""), 0);
    }

    #[test]
    fn test_table_widths_track_visible_text() {
        let mut table = Table::new(vec!["#", "Name"]);
        table.add_row(vec!["1".to_string(), "\u{1b}[36mlong-name\u{1b}[0m".to_string()]);
        assert_eq!(table.max_widths, vec![1, 9]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_template_status_icons() {
        colored::control::set_override(false);
        assert_eq!(template_status_icon("VERIFY_SUCCESS"), "✓");
        assert_eq!(template_status_icon("verify_failed"), "✗");
        assert_eq!(template_status_icon("VERIFYING"), "?");
    }
}
