//! Markdown summary of a talking list, meant to be turned into a PDF with pandoc.

use core::fmt::{self, Display, Formatter};
use core::time::Duration;

use chrono::{DateTime, Utc};
use list_o_matic_database::models::TalkingList;

use crate::time_distribution::TimeDistribution;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Renders title, time distribution, the contribution log and the attendee roster.
#[must_use]
pub fn markdown(list: &TalkingList, generated_at: DateTime<Utc>) -> String {
    Report { list, generated_at }.to_string()
}

struct Report<'a> {
    list: &'a TalkingList,
    generated_at: DateTime<Utc>,
}

impl Display for Report<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let list = self.list;
        writeln!(f, "# {}", Cell(&list.name))?;
        writeln!(f)?;
        writeln!(
            f,
            "Generated at {}",
            self.generated_at.format(TIMESTAMP_FORMAT)
        )?;

        let distribution = TimeDistribution::new(&list.groups, &list.past_contributions);
        let mut groups: Vec<_> = list.groups.iter().collect();
        groups.sort_by(|(_, a), (_, b)| a.name.cmp(&b.name));
        writeln!(f)?;
        writeln!(f, "## Time distribution")?;
        writeln!(f)?;
        writeln!(f, "| Group | Contributions | Time | Share |")?;
        writeln!(f, "|---|--:|--:|--:|")?;
        for (id, group) in groups {
            writeln!(
                f,
                "| {} | {} | {} | {:.2} % |",
                Cell(&group.name),
                distribution.number_contributions.get(id).copied().unwrap_or(0),
                PrettyDuration(distribution.time_share.get(id).copied().unwrap_or_default()),
                distribution.relative_share(id),
            )?;
        }
        writeln!(
            f,
            "| **Total** | {} | {} | |",
            list.past_contributions.len(),
            PrettyDuration(distribution.total_time)
        )?;

        writeln!(f)?;
        writeln!(f, "## Contributions")?;
        writeln!(f)?;
        writeln!(f, "| Start | Speaker | Group | Duration |")?;
        writeln!(f, "|---|---|---|--:|")?;
        for contribution in &list.past_contributions {
            let start = contribution
                .start_time
                .map(|start| start.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default();
            let speaker = contribution
                .application
                .as_ref()
                .map_or("", |application| application.name.as_str());
            // deleted groups leave the column empty
            let group = contribution
                .group_uuid
                .and_then(|id| list.groups.get(&id))
                .map_or("", |group| group.name.as_str());
            writeln!(
                f,
                "| {start} | {} | {} | {} |",
                Cell(speaker),
                Cell(group),
                PrettyDuration(contribution.duration.unwrap_or_default()),
            )?;
        }

        writeln!(f)?;
        writeln!(f, "## Attendees")?;
        writeln!(f)?;
        writeln!(f, "| Surname | Given name | Degree | Mail |")?;
        writeln!(f, "|---|---|---|---|")?;
        let mut attendees: Vec<_> = list.attendees.values().collect();
        attendees.sort_by(|a, b| {
            (a.sur_name.as_str(), a.given_name.as_str())
                .cmp(&(b.sur_name.as_str(), b.given_name.as_str()))
        });
        for attendee in attendees {
            writeln!(
                f,
                "| {} | {} | {} | {} |",
                Cell(&attendee.sur_name),
                Cell(&attendee.given_name),
                Cell(&attendee.degree),
                Cell(attendee.mail.as_deref().unwrap_or("")),
            )?;
        }
        Ok(())
    }
}

/// Text that is safe inside a table cell.
struct Cell<'a>(&'a str);

impl Display for Cell<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '|' => f.write_str("\\|")?,
                '\n' | '\r' => f.write_str(" ")?,
                c => write!(f, "{c}")?,
            }
        }
        Ok(())
    }
}

/// Only the largest non-zero unit, e.g. `1 hour` for 1h 59m.
pub struct PrettyDuration(pub Duration);

const UNITS: [(&str, &str, u128); 8] = [
    ("year", "years", 365 * 24 * 60 * 60 * 1_000_000_000),
    ("week", "weeks", 7 * 24 * 60 * 60 * 1_000_000_000),
    ("day", "days", 24 * 60 * 60 * 1_000_000_000),
    ("hour", "hours", 60 * 60 * 1_000_000_000),
    ("minute", "minutes", 60 * 1_000_000_000),
    ("second", "seconds", 1_000_000_000),
    ("millisecond", "milliseconds", 1_000_000),
    ("microsecond", "microseconds", 1_000),
];

impl Display for PrettyDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let nanos = self.0.as_nanos();
        for (singular, plural, unit) in UNITS {
            let amount = nanos / unit;
            if amount > 0 {
                let name = if amount == 1 { singular } else { plural };
                return write!(f, "{amount} {name}");
            }
        }
        f.write_str("0 seconds")
    }
}
