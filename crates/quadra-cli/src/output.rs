//! Output formatting utilities.

use colored::Colorize;
use quadra_types::Timestamp;
use quadra_voting::{ProposalStatus, ProposalView, VoteReceipt, VoterInfo};
use tabled::{Table, Tabled};

/// Print success message.
pub fn print_success(msg: &str) {
    println!("{}", format!("✓ {}", msg).green());
}

/// Print error message.
pub fn print_error(msg: &str) {
    eprintln!("{}", format!("✗ {}", msg).red());
}

/// Print info message.
pub fn print_info(msg: &str) {
    println!("{}", format!("ℹ {}", msg).blue());
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_status(status: ProposalStatus) -> String {
    match status {
        ProposalStatus::Open => "Open".green().to_string(),
        ProposalStatus::Closed => "Closed".yellow().to_string(),
        ProposalStatus::Executed => "Executed".bright_black().to_string(),
    }
}

/// Human-readable time left until `end`, relative to `now`.
pub fn format_remaining(now: Timestamp, end: Timestamp) -> String {
    let secs = now.secs_until(end);
    if secs == 0 {
        return "-".to_string();
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h {}m", h, m)
    } else if m > 0 {
        format!("{}m {}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// Print vote receipt.
pub fn print_receipt(receipt: &VoteReceipt) {
    println!("{}", "Vote Receipt".bold());
    println!("{}", "=".repeat(50));
    println!("Proposal:  {}", receipt.proposal_id.to_string().bright_green());
    println!("Voter:     {}", receipt.voter.to_string().bright_cyan());
    println!("Credits:   {}", receipt.credits);
    println!("Votes:     {}", receipt.votes.to_string().bright_yellow());
}

/// Print proposal info.
pub fn print_proposal(view: &ProposalView, status: ProposalStatus, now: Timestamp) {
    println!("{}", format!("Proposal #{}", view.id).bold());
    println!("{}", "=".repeat(50));
    println!("Title:        {}", view.title);
    if !view.description.is_empty() {
        println!("Description:  {}", view.description);
    }
    println!("Status:       {}", format_status(status));
    println!("Voting ends:  {} (in {})", view.voting_end_time, format_remaining(now, view.voting_end_time));
    println!("Total votes:  {}", view.total_votes.to_string().bright_yellow());
    println!("Voters:       {}", view.voter_count);
}

/// Print voter info.
pub fn print_voter(info: &VoterInfo) {
    println!("{}", "Voter".bold());
    println!("{}", "=".repeat(50));
    println!("Address:    {}", info.voter.to_string().bright_cyan());
    println!("Hex:        {:x}", info.voter);
    println!("Registered: {}", info.is_registered);
    println!("Credits:    {} used / {} total", info.used_credits, info.total_credits);
    println!("Remaining:  {}", info.remaining_credits.to_string().bright_green());
}

/// Print proposal table.
pub fn print_proposal_table(rows: &[(ProposalView, ProposalStatus)], now: Timestamp) {
    #[derive(Tabled)]
    struct ProposalRow {
        id: u64,
        title: String,
        status: String,
        votes: u64,
        voters: usize,
        ends_in: String,
    }

    let rows: Vec<ProposalRow> = rows
        .iter()
        .map(|(view, status)| ProposalRow {
            id: view.id,
            title: view.title.clone(),
            status: format!("{:?}", status),
            votes: view.total_votes,
            voters: view.voter_count,
            ends_in: format_remaining(now, view.voting_end_time),
        })
        .collect();

    println!("{}", Table::new(rows));
}
