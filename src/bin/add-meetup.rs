//! Adds a meetup submitted through the GitHub issue form to the listing.
//!
//! The issue body comes from `ISSUE_BODY` or the first argument. Exits
//! non-zero, listing every problem, when the submission is invalid.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use apis::meetup::{Meetup, prepend_to_file};

#[derive(Parser)]
#[command(name = "add-meetup")]
#[command(about = "Add a meetup from a GitHub issue-form body to the meetup listing", long_about = None)]
struct Cli {
    /// Issue body, in GitHub issue-form markdown.
    #[arg(env = "ISSUE_BODY")]
    body: Option<String>,

    /// Listing to update.
    #[arg(short, long, default_value = "data/meetups.json")]
    file: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(body) = cli.body.filter(|b| !b.trim().is_empty()) else {
        eprintln!("Error: No issue body provided");
        eprintln!("Usage: add-meetup <issue-body>  (or set ISSUE_BODY)");
        return ExitCode::FAILURE;
    };

    let meetup = Meetup::from_issue_form(&body);
    if let Err(errors) = meetup.validate() {
        eprintln!("❌ Validation errors:");
        for error in errors {
            eprintln!("  - {error}");
        }
        return ExitCode::FAILURE;
    }

    match serde_json::to_string_pretty(&meetup) {
        Ok(json) => println!("Parsed meetup:\n{json}"),
        Err(e) => eprintln!("warning: cannot echo meetup: {e}"),
    }

    match prepend_to_file(&cli.file, meetup) {
        Ok(total) => {
            println!("✅ Meetup added successfully! ({total} listed)");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
