use itertools::Itertools;
use polars::prelude::*;
use serde_json::Value;

/// Build a column from loosely typed JSON values.
///
/// All numbers become `Float64`, all booleans become `Boolean`, anything else is rendered as
/// text. `None` and JSON `null` are nulls.
pub(crate) fn series_from_values(name: &str, values: &[Option<&Value>]) -> Series {
    let present = values
        .iter()
        .flatten()
        .filter(|v| !v.is_null())
        .collect::<Vec<_>>();

    if present.is_empty() {
        Series::full_null(name.into(), values.len(), &DataType::String)
    } else if present.iter().all(|v| v.is_number()) {
        let numbers = values
            .iter()
            .map(|v| v.and_then(Value::as_f64))
            .collect::<Vec<_>>();
        Series::new(name.into(), numbers)
    } else if present.iter().all(|v| v.is_boolean()) {
        let flags = values
            .iter()
            .map(|v| v.and_then(Value::as_bool))
            .collect::<Vec<_>>();
        Series::new(name.into(), flags)
    } else {
        let text = values
            .iter()
            .map(|v| match v {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            })
            .collect::<Vec<_>>();
        Series::new(name.into(), text)
    }
}

/// Stack frames row-wise over the union of their columns.
///
/// Columns keep the order they are first seen in. A column missing from a frame is null for that
/// frame's rows. Columns whose types disagree are widened to text, ignoring all-null columns.
pub(crate) fn concat_diagonal(frames: &[DataFrame]) -> anyhow::Result<DataFrame> {
    let dtypes = frames
        .iter()
        .flat_map(|frame| frame.get_column_names_owned())
        .unique()
        .map(|name| {
            let parts = frames
                .iter()
                .map(|frame| frame.column(&name).ok())
                .collect::<Vec<_>>();
            let dtype = combined_dtype(&parts);
            (name, dtype)
        })
        .collect::<Vec<_>>();

    let widened = frames
        .iter()
        .map(|frame| {
            let mut frame = frame.clone();
            for (name, dtype) in &dtypes {
                if frame
                    .column(name)
                    .is_ok_and(|column| column.dtype() != dtype)
                {
                    let cast = frame.column(name)?.cast(dtype)?;
                    frame.with_column(cast)?;
                }
            }
            Ok::<_, PolarsError>(frame)
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    Ok(polars::functions::concat_df_diagonal(&widened)?)
}

fn combined_dtype(parts: &[Option<&Column>]) -> DataType {
    let present = parts.iter().flatten().collect::<Vec<_>>();
    let mut with_values: Vec<DataType> = Vec::new();
    for column in present.iter().filter(|c| c.null_count() < c.len()) {
        if !with_values.contains(column.dtype()) {
            with_values.push(column.dtype().clone());
        }
    }

    match with_values.as_slice() {
        [dtype] => dtype.clone(),
        [] => present
            .first()
            .map(|column| column.dtype().clone())
            .unwrap_or(DataType::String),
        _ => DataType::String,
    }
}
