//! Command-line surface: one command naming the field, plus selection flags.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use strava_bulk_client::{DateRange, Sport, StravaError, UpdatePayload, Visibility};

pub const CLI_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Parser)]
#[command(
    name = "strava-bulk-edit",
    version,
    about = "Edit multiple Strava activities at once"
)]
pub struct Cli {
    /// Update all Strava activities
    #[arg(long, global = true)]
    pub all: bool,

    /// Update all Strava activities on or after the specified date. Date format: YYYY-MM-DD
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub from: Option<String>,

    /// Update all Strava activities before the specified date. Date format: YYYY-MM-DD
    #[arg(long, global = true, value_name = "YYYY-MM-DD")]
    pub to: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Update the activities' titles
    Title {
        /// New title for the activities
        title: String,
    },
    /// Update the activities' descriptions
    Description {
        /// New description for the activities
        description: String,
    },
    /// Set the activities as commute/non-commute activities
    Commute {
        /// true or false indicating whether activities should be marked commute
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        commute: bool,
    },
    /// Update the activities' sport type
    Sport {
        /// New sport type for the activities (e.g. Ride, Run, Swim)
        sport: Sport,
    },
    /// Update the activities' visibility
    Visibility {
        /// New visibility for the activities: everyone, followers_only or only_me
        visibility: Visibility,
    },
}

impl Command {
    pub fn payload(&self) -> UpdatePayload {
        match self {
            Command::Title { title } => UpdatePayload::title(title.as_str()),
            Command::Description { description } => UpdatePayload::description(description.as_str()),
            Command::Commute { commute } => UpdatePayload::commute(*commute),
            Command::Sport { sport } => UpdatePayload::sport(*sport),
            Command::Visibility { visibility } => UpdatePayload::visibility(*visibility),
        }
    }
}

impl Cli {
    /// Check the selection flags and turn them into a date window.
    pub fn date_range(&self) -> Result<DateRange, StravaError> {
        if !self.all && self.from.is_none() && self.to.is_none() {
            return Err(StravaError::Validation(
                "Please use a flag (--all, --from, and/or --to) to specify the activities to update"
                    .into(),
            ));
        }
        if self.all && (self.from.is_some() || self.to.is_some()) {
            return Err(StravaError::Validation(
                "The --all flag cannot be used together with the --from and --to flags".into(),
            ));
        }
        if self.all {
            return Ok(DateRange::all());
        }

        let from = match &self.from {
            Some(s) => parse_date(s, "start")?,
            None => DateRange::earliest(),
        };
        let to = match &self.to {
            Some(s) => parse_date(s, "end")?,
            None => DateRange::latest(),
        };
        DateRange::from_dates(from, to)
    }
}

fn parse_date(s: &str, which: &str) -> Result<NaiveDate, StravaError> {
    NaiveDate::parse_from_str(s, CLI_DATE_FORMAT).map_err(|_| {
        StravaError::Validation(format!(
            "Could not parse {which} date {s:?} (must be formatted as YYYY-MM-DD)"
        ))
    })
}
