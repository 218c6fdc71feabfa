// src/schema/catalog.rs

//! Shapes of every artifact the pipeline publishes or checks.

use super::{Field, Shape};

// Indicator domains

fn series_point() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("value", Shape::Number),
    ])
}

/// `{domain}/{year}/indicators.json`
pub fn indicators() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("domain", Shape::Str),
        Field::required("source", Shape::Str),
        Field::required(
            "indicators",
            Shape::list(Shape::record([
                Field::required("key", Shape::Str),
                Field::required("code", Shape::Str),
                Field::required("series", Shape::list(series_point())),
            ])),
        ),
    ])
}

/// `{domain}/{year}/summary.json`
pub fn summary() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("domain", Shape::Str),
        Field::required("source", Shape::Str),
        Field::required("lastUpdated", Shape::Str),
        Field::required(
            "latest",
            Shape::list(Shape::record([
                Field::required("key", Shape::Str),
                Field::required("code", Shape::Str),
                Field::required("points", Shape::Integer),
                Field::required("year", Shape::nullable(Shape::Str)),
                Field::required("value", Shape::nullable(Shape::Number)),
                Field::required("previousValue", Shape::nullable(Shape::Number)),
                Field::required("yoyChange", Shape::nullable(Shape::Number)),
            ])),
        ),
    ])
}

// Union budget

fn treemap_node() -> Shape {
    Shape::record([
        Field::required("name", Shape::Str),
        Field::required("id", Shape::Str),
        Field::optional("value", Shape::nullable(Shape::Number)),
        Field::optional("percentOfTotal", Shape::nullable(Shape::Number)),
        Field::optional(
            "children",
            Shape::nullable(Shape::list(Shape::Deferred(treemap_node))),
        ),
    ])
}

/// `budget/{year}/treemap.json`
pub fn treemap() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("root", treemap_node()),
    ])
}

/// `budget/{year}/expenditure.json`
pub fn expenditure() -> Shape {
    let scheme = Shape::record([
        Field::required("id", Shape::Str),
        Field::required("name", Shape::Str),
        Field::required("amount", Shape::Number),
    ]);
    let ministry = Shape::record([
        Field::required("id", Shape::Str),
        Field::required("name", Shape::Str),
        Field::required("budgetEstimate", Shape::Number),
        Field::required("revisedEstimate", Shape::nullable(Shape::Number)),
        Field::required("actualExpenditure", Shape::nullable(Shape::Number)),
        Field::required("percentOfTotal", Shape::Number),
        Field::required("yoyChange", Shape::nullable(Shape::Number)),
        Field::required("perCapita", Shape::Number),
        Field::required("humanContext", Shape::Str),
        Field::required("schemes", Shape::list(scheme)),
    ]);

    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("total", Shape::Number),
        Field::required("ministries", Shape::list(ministry)),
    ])
}

/// `budget/{year}/schemes.json`
pub fn schemes() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required(
            "schemes",
            Shape::list(Shape::record([
                Field::required("id", Shape::Str),
                Field::required("name", Shape::Str),
                Field::required("ministry", Shape::Str),
                Field::required("ministryName", Shape::Str),
                Field::required("allocation", Shape::Number),
                Field::required("previousYear", Shape::nullable(Shape::Number)),
                Field::required("yoyChange", Shape::nullable(Shape::Number)),
                Field::required("humanContext", Shape::Str),
            ])),
        ),
    ])
}

/// `budget/{year}/receipts.json`
pub fn receipts() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("total", Shape::Number),
        Field::optional("note", Shape::nullable(Shape::Str)),
        Field::required(
            "categories",
            Shape::list(Shape::record([
                Field::required("id", Shape::Str),
                Field::required("name", Shape::Str),
                Field::required("amount", Shape::Number),
                Field::required("percentOfTotal", Shape::Number),
                Field::required("previousYear", Shape::nullable(Shape::Number)),
                Field::required("yoyChange", Shape::nullable(Shape::Number)),
            ])),
        ),
    ])
}

/// `budget/{year}/statewise.json`
pub fn statewise() -> Shape {
    Shape::record([
        Field::required("year", Shape::Str),
        Field::required("totalTransfers", Shape::Number),
        Field::optional("note", Shape::nullable(Shape::Str)),
        Field::required(
            "states",
            Shape::list(Shape::record([
                Field::required("id", Shape::Str),
                Field::required("name", Shape::Str),
                Field::required("transfer", Shape::Number),
                Field::required("perCapita", Shape::Number),
                Field::required("percentOfTotal", Shape::Number),
                Field::required("population", Shape::Integer),
            ])),
        ),
    ])
}

/// File names and shapes of the union-budget artifacts.
pub fn budget() -> Vec<(&'static str, Shape)> {
    vec![
        ("treemap.json", treemap()),
        ("expenditure.json", expenditure()),
        ("schemes.json", schemes()),
        ("receipts.json", receipts()),
        ("statewise.json", statewise()),
    ]
}
