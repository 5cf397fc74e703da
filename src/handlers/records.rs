//! Record listing, editing and reset handlers

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::db::KeyValueStore;
use crate::services::links::ShareLink;
use crate::services::survey::RecordLine;
use crate::services::SurveyService;
use crate::types::VolunteerSummary;

const NO_DATA: &str = "No survey data. Run `survey-admin import <file>` first.";

pub fn handle_volunteers<S: KeyValueStore>(service: &SurveyService<S>) -> Result<()> {
    let volunteers = service.volunteers();
    if volunteers.is_empty() {
        println!("{}", NO_DATA);
        return Ok(());
    }
    print!("{}", format_volunteers(&volunteers));
    Ok(())
}

pub fn handle_list<S: KeyValueStore>(
    service: &SurveyService<S>,
    volunteer: Option<&str>,
) -> Result<()> {
    if service.records().is_none() {
        println!("{}", NO_DATA);
        return Ok(());
    }
    let lines = match volunteer {
        Some(v) => service.records_for(v),
        None => service.lines(),
    };
    if lines.is_empty() {
        println!("No records for volunteer {}", volunteer.unwrap_or_default());
        return Ok(());
    }
    print!("{}", format_lines(&service.name_label(), &lines));
    Ok(())
}

pub fn handle_links<S: KeyValueStore>(
    service: &SurveyService<S>,
    volunteer: Option<&str>,
) -> Result<()> {
    if service.records().is_none() {
        println!("{}", NO_DATA);
        return Ok(());
    }
    print!("{}", format_links(&service.share_links(volunteer)));
    Ok(())
}

pub fn handle_update<S: KeyValueStore>(
    service: &mut SurveyService<S>,
    id: &str,
    edits: &[(String, String)],
) -> Result<()> {
    service
        .update(id, edits)
        .with_context(|| format!("Failed to update record {}", id))?;
    println!("Record {} updated", id);
    Ok(())
}

pub fn handle_reset<S: KeyValueStore>(service: &mut SurveyService<S>, yes: bool) -> Result<()> {
    if !yes {
        let count = service.records().map(|r| r.len()).unwrap_or(0);
        let prompt = format!(
            "This deletes all {} records and their updates. Continue? [y/N] ",
            count
        );
        if !confirm(&prompt, &mut io::stdin().lock())? {
            println!("Reset cancelled");
            return Ok(());
        }
    }
    service.reset().context("Failed to clear survey data")?;
    println!("All survey data cleared");
    Ok(())
}

fn confirm(prompt: &str, input: &mut impl BufRead) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub fn format_volunteers(volunteers: &[VolunteerSummary]) -> String {
    let mut out = format!("{:<10} {:>7} {:>8}\n", "Volunteer", "Records", "Updated");
    for v in volunteers {
        out.push_str(&format!(
            "{:<10} {:>7} {:>8}\n",
            v.volunteer_id, v.total, v.updated
        ));
    }
    out
}

pub fn format_lines(name_label: &str, lines: &[RecordLine]) -> String {
    let mut out = format!("id\tvolunteer\tstatus\t{}\n", name_label);
    for line in lines {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            line.id, line.volunteer_id, line.status, line.name
        ));
    }
    out
}

pub fn format_links(links: &[ShareLink]) -> String {
    let mut out = String::new();
    for link in links {
        out.push_str(&format!(
            "{} ({})\n  form:     {}\n  whatsapp: {}\n",
            link.record_id, link.name, link.form_url, link.whatsapp_url
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_accepts_yes() {
        assert!(confirm("", &mut "y\n".as_bytes()).unwrap());
        assert!(confirm("", &mut "YES\n".as_bytes()).unwrap());
        assert!(!confirm("", &mut "\n".as_bytes()).unwrap());
        assert!(!confirm("", &mut "nope\n".as_bytes()).unwrap());
    }

    #[test]
    fn test_format_volunteers() {
        let out = format_volunteers(&[VolunteerSummary {
            volunteer_id: "V1".to_string(),
            total: 40,
            updated: 3,
        }]);
        let rows: Vec<&str> = out.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1].split_whitespace().collect::<Vec<_>>(),
            vec!["V1", "40", "3"]
        );
    }

    #[test]
    fn test_format_lines() {
        let out = format_lines(
            "Name / பெயர்",
            &[RecordLine {
                id: "4".to_string(),
                volunteer_id: "1".to_string(),
                name: "Asha".to_string(),
                status: "Updated",
            }],
        );
        assert_eq!(
            out,
            "id\tvolunteer\tstatus\tName / பெயர்\n4\t1\tUpdated\tAsha\n"
        );
    }
}
