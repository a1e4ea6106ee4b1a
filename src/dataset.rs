use std::collections::HashSet;
use std::io;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::models::{Volunteer, VolunteerRow};

/// Required row fields as (CSV header, snake_case name). Either spelling is
/// accepted on input; CSV output uses the header spelling.
pub const REQUIRED_FIELDS: [(&str, &str); 5] = [
    ("Name", "name"),
    ("Total_Score", "total_score"),
    ("Tasks_Completed", "tasks_completed"),
    ("Average_Mark", "average_mark"),
    ("Average_Rating", "average_rating"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Flat rows.
    Csv,
    /// Detailed records; tasks are dropped on load.
    Json,
}

pub fn load_population(path: &Path, format: DatasetFormat) -> Result<Vec<VolunteerRow>> {
    let rows = match format {
        DatasetFormat::Csv => read_rows_csv(path)?,
        DatasetFormat::Json => read_rows_json(path)?,
    };
    tracing::info!(path = %path.display(), ?format, rows = rows.len(), "dataset loaded");
    Ok(rows)
}

pub fn write_rows_csv(path: &Path, volunteers: &[Volunteer]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_rows(file, volunteers)
}

pub fn write_rows<W: io::Write>(writer: W, volunteers: &[Volunteer]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for volunteer in volunteers {
        writer.serialize(volunteer.row())?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_detailed_json(path: &Path, volunteers: &[Volunteer]) -> Result<()> {
    let json = serde_json::to_string_pretty(volunteers)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read_detailed_json(path: &Path) -> Result<Vec<Volunteer>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn read_rows_csv(path: &Path) -> Result<Vec<VolunteerRow>> {
    let file = std::fs::File::open(path)?;
    read_rows(file)
}

pub fn read_rows<R: io::Read>(reader: R) -> Result<Vec<VolunteerRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers: HashSet<String> = reader.headers()?.iter().map(str::to_string).collect();
    if let Some(missing) = missing_field(|name| headers.contains(name)) {
        return Err(Error::schema(format!("CSV is missing required column '{missing}'")));
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<VolunteerRow>() {
        rows.push(result?);
    }
    Ok(rows)
}

pub fn read_rows_json(path: &Path) -> Result<Vec<VolunteerRow>> {
    let text = std::fs::read_to_string(path)?;
    rows_from_json(&text)
}

/// Projects detailed (or flat) JSON records onto rows after checking every
/// record carries the required fields.
pub fn rows_from_json(text: &str) -> Result<Vec<VolunteerRow>> {
    let Value::Array(records) = serde_json::from_str::<Value>(text)? else {
        return Err(Error::schema("JSON dataset must be an array of volunteer records"));
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let Value::Object(fields) = &record else {
                return Err(Error::schema(format!("record {index} is not an object")));
            };
            if let Some(missing) = missing_field(|name| fields.contains_key(name)) {
                return Err(Error::schema(format!(
                    "record {index} is missing required field '{missing}'"
                )));
            }
            Ok(serde_json::from_value(record)?)
        })
        .collect()
}

fn missing_field(has: impl Fn(&str) -> bool) -> Option<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .find(|(header, snake)| !has(header) && !has(snake))
        .map(|(_, snake)| *snake)
}
