use std::fmt::Display;

use anyhow::Result;
use chrono::{DateTime, Local};
use chrono_english::parse_date_string;
use clap::{CommandFactory, ValueEnum};

use crate::utils::clock::Clock;

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

/// Reference instant of a command. Relative inputs like "yesterday" are relative to the clock,
/// no input means now.
pub fn parse_reference(
    date: Option<&str>,
    date_style: DateStyle,
    clock: &dyn Clock,
) -> Result<DateTime<Local>> {
    let now = clock.time();
    match date.map(|s| parse_date_string(s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.with_timezone(&Local)),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now),
    }
}
