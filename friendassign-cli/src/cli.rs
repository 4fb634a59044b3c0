use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use friendassign_api::assignment::Difficulty;
use friendassign_flows::listing::sort::SortField;

#[derive(Debug, Parser)]
#[command(name = "friendassign")]
#[command(version, about = "Share assignments with friends, submit work and grade each other")]
pub struct Cli {
    /// Print outcomes as JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account from FRIENDASSIGN_EMAIL and FRIENDASSIGN_PASSWORD
    SignUp {
        /// Name shown on your assignments and submissions
        #[arg(long)]
        name: Option<String>,
    },
    /// List assignments
    List {
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
        #[arg(short, long, default_value = "")]
        search: String,
        #[arg(long)]
        sort: Option<SortField>,
        #[arg(long)]
        desc: bool,
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// Search interactively; every line typed on stdin is a new search
    Browse,
    /// Show one assignment, by id or title
    Show { assignment: String },
    /// Create an assignment owned by the signed-in user
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        marks: String,
        #[arg(long)]
        thumbnail_url: String,
        #[arg(long, default_value = "Easy")]
        difficulty: Difficulty,
        /// YYYY-MM-DD, today if omitted
        #[arg(long)]
        due_date: Option<NaiveDate>,
    },
    /// Change an assignment you own; omitted fields keep their current value
    Edit {
        assignment: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        marks: Option<String>,
        #[arg(long)]
        thumbnail_url: Option<String>,
        #[arg(long)]
        difficulty: Option<Difficulty>,
        #[arg(long)]
        due_date: Option<NaiveDate>,
    },
    /// Delete an assignment you own
    Delete {
        assignment: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Submit your work for an assignment
    Submit {
        assignment: String,
        /// Link to the document with your work
        #[arg(long)]
        link: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// List submissions waiting for a grade
    Pending,
    /// Grade someone else's pending submission
    Grade {
        submission: String,
        #[arg(long)]
        marks: String,
        #[arg(long, default_value = "")]
        feedback: String,
    },
}
