use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    let msg = err.to_string().to_lowercase();

    if msg.contains("authentication failed") || msg.contains("rejected a freshly minted token") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Re-authenticate with:");
        eprintln!("  {} gcloud auth login", "$".dimmed());
    }

    if msg.contains("not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the project, location and engine id. List engines with:");
        eprintln!(
            "  {} gcloud ai reasoning-engines list --project <PROJECT> --region <LOCATION>",
            "$".dimmed()
        );
    }

    if msg.contains("transient failure") || msg.contains("transport error") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  The control plane did not respond; check connectivity and retry.");
    }

    std::process::exit(1);
}
