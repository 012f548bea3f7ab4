use crate::error::{ErrorKind, EvaluationError};
use crate::table::{Column, ColumnData, DataTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use pipes_types::ParseDateTimePipeConfig;

/// Parses `value` with a `strftime`-style `format` as a UTC timestamp in
/// milliseconds.  Formats without a time component parse to midnight.
pub fn parse_timestamp(value: &str, format: &str) -> Result<i64, EvaluationError> {
    NaiveDateTime::parse_from_str(value, format)
        .or_else(|_| NaiveDate::parse_from_str(value, format).map(|date| date.and_time(NaiveTime::MIN)))
        .map(|datetime| datetime.and_utc().timestamp_millis())
        .map_err(|_| EvaluationError::InvalidDateTime {
            value: value.to_string(),
            format: format.to_string(),
        })
}

/// Writes the parsed `column_from` strings to the `column_to` date-time
/// column, replacing a column of that name in place.
pub fn parse_datetime(table: &DataTable, config: &ParseDateTimePipeConfig) -> Result<DataTable, ErrorKind> {
    let source = table.column(&config.column_from)?;
    let parsed = match source.data() {
        ColumnData::String(values) => values
            .iter()
            .map(|value| {
                value
                    .as_deref()
                    .map(|value| parse_timestamp(value, &config.format))
                    .transpose()
            })
            .collect::<Result<Vec<_>, _>>()?,
        other if other.is_all_null() => vec![None; other.len()],
        other => {
            return Err(EvaluationError::type_mismatch(
                "ParseDateTime",
                "a string column",
                other.data_type(),
            )
            .into())
        }
    };
    let column = Column::new(config.column_to.as_str(), ColumnData::DateTime(parsed));
    Ok(table.with_column(column)?)
}
