use std::{collections::BTreeMap, path::Path};

use chrono::NaiveDate;
use tracing::debug;

use super::store::JsonStore;
use crate::error::{DashError, Result};

pub const MESSAGES_FILE: &str = "messages.json";

const DATE_FORMAT: &str = "%Y-%m-%d";

type Messages = BTreeMap<String, String>;

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| DashError::InvalidDate(value.to_string()))
}

/// The message for `date`, or an empty string when there is none.
pub fn message_for(store: &JsonStore, file: &Path, date: NaiveDate) -> Result<String> {
    let key = date.format(DATE_FORMAT).to_string();

    let Some(mut messages) = store.read_optional::<Messages>(file)? else {
        debug!(file = %file.display(), "no messages file");
        return Ok(String::new());
    };

    Ok(messages.remove(&key).unwrap_or_default())
}

pub fn set_message(store: &JsonStore, file: &Path, date: NaiveDate, message: &str) -> Result<()> {
    let key = date.format(DATE_FORMAT).to_string();
    store.update(file, |messages: &mut Messages| {
        messages.insert(key, message.to_string());
        Ok(())
    })
}
