use comfy_table::{presets, Row, Table};
use polars::datatypes::DataType;
use polars::lazy::dsl::{col, lit};
use polars::prelude::*;

use crate::pipeline::UNKNOWN_STATE;
use crate::prelude::*;

/// Ranks the states by the mean score of their posts. Posts without a
/// state or score are ignored.
pub(crate) fn summarize(
    scores: &[(&'static str, Option<f64>)],
) -> HappyResult<DataFrame> {
    let (states, scores): (Vec<&str>, Vec<Option<f64>>) =
        scores.iter().copied().unzip();

    let sort_options = SortMultipleOptions::default()
        .with_order_descending_multi([true, false]);

    let df = DataFrame::new(vec![
        Series::new("state", states),
        Series::new("score", scores),
    ])?
    .lazy()
    .filter(
        col("state")
            .neq(lit(UNKNOWN_STATE))
            .and(col("score").is_not_null()),
    )
    .group_by([col("state")])
    .agg([
        col("score").mean().alias("happiness"),
        col("score").count().alias("posts"),
    ])
    .select([
        col("state"),
        col("happiness"),
        col("posts").cast(DataType::UInt64),
    ])
    .sort(["happiness", "state"], sort_options)
    .collect()?;

    Ok(df)
}

/// Renders the ranking as a table.
pub(crate) fn table(df: &DataFrame) -> HappyResult<Table> {
    let states = df.column("state")?.str()?;
    let happiness = df.column("happiness")?.f64()?;
    let posts = df.column("posts")?.u64()?;

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_header(Row::from(vec!["rank", "state", "happiness", "posts"]));

    for idx in 0..df.height() {
        let state = states.get(idx).unwrap_or_default();
        let mean = happiness.get(idx).unwrap_or_default();
        let count = posts.get(idx).unwrap_or_default();

        table.add_row([
            (idx + 1).to_string(),
            state.to_string(),
            format!("{mean:.3}"),
            count.to_string(),
        ]);
    }

    Ok(table)
}
