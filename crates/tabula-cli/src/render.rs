//! Terminal output for analyses, projects and chat messages.

use colored::Colorize;
use tabula_core::analysis::{
    AnalysisResult, AnalysisStage, Chart, Insight, PersistedAnalysis, format_size,
};
use tabula_core::chat::{ChatMessage, MessageRole};
use tabula_core::compare::{ComparisonResult, MergeResult};
use tabula_core::project::{Project, ProjectFile};

pub fn stage(stage: AnalysisStage) {
    let line = match stage {
        AnalysisStage::Idle => return,
        AnalysisStage::Uploading => "Uploading file...",
        AnalysisStage::Processing => "Processing data...",
        AnalysisStage::Analyzing => "Generating insights...",
        AnalysisStage::Complete => "Analysis complete",
        AnalysisStage::Error => "Analysis failed",
    };
    match stage {
        AnalysisStage::Complete => println!("{} {}", "✓".green(), line.green()),
        AnalysisStage::Error => println!("{} {}", "✗".red(), line.red()),
        _ => println!("{} {}", "…".bright_blue(), line.dimmed()),
    }
}

pub fn analysis(result: &AnalysisResult) {
    if let Some(summary) = &result.summary {
        println!(
            "\n{} {} rows × {} columns",
            "Dataset:".bold(),
            summary.row_count,
            summary.column_count
        );
        for column in &summary.columns {
            let dtype = column.dtype.as_deref().unwrap_or("?");
            println!(
                "  {} {} {}",
                column.name.cyan(),
                format!("({})", dtype).dimmed(),
                if column.missing > 0 {
                    format!("{} missing", column.missing).yellow().to_string()
                } else {
                    String::new()
                }
            );
        }
    }
    if let Some(id) = result.analysis_id {
        println!("{} #{}", "Saved as analysis".dimmed(), id);
    }
    charts(&result.charts);
    insights(&result.insights);
}

pub fn charts(charts: &[Chart]) {
    if charts.is_empty() {
        return;
    }
    println!("\n{}", "Charts".bold().underline());
    for chart in charts {
        chart_line(chart);
    }
}

pub fn chart_line(chart: &Chart) {
    println!(
        "  {} {} {}",
        format!("[{}]", chart.id).bright_black(),
        chart.title.bold(),
        format!("({})", chart.chart_type).dimmed()
    );
    if let Some(insight) = &chart.insight {
        println!("      {}", insight.italic());
    }
}

pub fn insights(insights: &[Insight]) {
    if insights.is_empty() {
        return;
    }
    println!("\n{}", "Insights".bold().underline());
    for insight in insights {
        let marker = match insight.importance.as_deref() {
            Some("high") => "!".red().bold(),
            Some("medium") => "•".yellow(),
            _ => "•".normal(),
        };
        println!("  {} {}", marker, insight.title.bold());
        println!("    {}", insight.description);
    }
}

pub fn project(project: &Project) {
    println!(
        "{:>5}  {}  {}",
        project.id.to_string().bright_black(),
        project.name.bold(),
        format!("{} file(s)", project.file_count).dimmed()
    );
    if let Some(description) = project.description.as_deref().filter(|d| !d.is_empty()) {
        println!("       {}", description);
    }
}

pub fn file(file: &ProjectFile) {
    let size = file.file_size.map(format_size).unwrap_or_default();
    println!(
        "{:>5}  {}  {} rows × {} cols  {}",
        file.id.to_string().bright_black(),
        file.filename.cyan(),
        file.row_count,
        file.column_count,
        size.dimmed()
    );
    if !file.columns.is_empty() {
        println!("       {}", file.columns.join(", ").dimmed());
    }
}

pub fn history_entry(entry: &PersistedAnalysis) {
    println!(
        "{:>5}  {}  {}  {}",
        entry.id.to_string().bright_black(),
        entry.created_at.as_deref().unwrap_or("-"),
        entry
            .user_intent
            .as_deref()
            .map(|i| format!("\"{}\"", i))
            .unwrap_or_else(|| "(no intent)".to_string())
            .italic(),
        format!("{} chart(s), {} insight(s)", entry.charts.len(), entry.insights.len()).dimmed()
    );
}

pub fn comparison(result: &ComparisonResult) {
    println!("\n{}", result.summary.bold());
    column_list("In both", &result.common_columns);
    column_list("Only in A", &result.only_in_a);
    column_list("Only in B", &result.only_in_b);
    charts(&result.charts);
    insights(&result.insights);
}

pub fn merge(result: &MergeResult) {
    println!(
        "\n{} {} rows, {} columns",
        "Merged:".bold(),
        result.row_count,
        result.column_names.len()
    );
    if let Some(id) = result.merged_file_id {
        println!("{} {}", "Stored as file".dimmed(), id);
    }
    charts(&result.charts);
    insights(&result.insights);
}

fn column_list(label: &str, columns: &[String]) {
    if columns.is_empty() {
        return;
    }
    println!("  {:<10} {}", format!("{}:", label).dimmed(), columns.join(", "));
}

pub fn chat_message(message: &ChatMessage) {
    match message.role {
        MessageRole::User => println!("{} {}", "you>".bright_blue().bold(), message.content),
        MessageRole::Assistant if message.is_error => {
            println!("{} {}", "tabula>".red().bold(), message.content.red())
        }
        MessageRole::Assistant => {
            println!("{} {}", "tabula>".green().bold(), message.content);
            if let Some(chart) = &message.chart {
                chart_line(chart);
            }
        }
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}
