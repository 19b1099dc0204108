// Year selection expressions: "all", "1960", "1960,1980", "2000..2010"

use crate::config::GdpInfo;
use anyhow::{anyhow, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, map_res, opt, value, verify},
    multi::separated_list1,
    sequence::{delimited, preceded, tuple},
    IResult,
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearItem {
    Single(u32),
    /// Inclusive on both ends
    Range(u32, u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearSelection {
    All,
    Items(Vec<YearItem>),
}

impl YearSelection {
    /// Year labels in ascending order without duplicates.
    ///
    /// Ranges must lie inside `min_year..=max_year`; single years may fall
    /// outside it.
    pub fn expand(&self, gdpinfo: &GdpInfo) -> Result<Vec<String>> {
        let items = match self {
            YearSelection::All => return Ok(gdpinfo.years().collect()),
            YearSelection::Items(items) => items,
        };

        let mut years = BTreeSet::new();
        for item in items {
            match *item {
                YearItem::Single(y) => {
                    years.insert(y);
                }
                YearItem::Range(start, end) => {
                    if start < gdpinfo.min_year || end > gdpinfo.max_year {
                        return Err(anyhow!(
                            "Year range {}..{} is outside the configured years {}..{}",
                            start,
                            end,
                            gdpinfo.min_year,
                            gdpinfo.max_year
                        ));
                    }
                    years.extend(start..=end);
                }
            }
        }
        Ok(years.into_iter().map(|y| y.to_string()).collect())
    }
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn year(input: &str) -> IResult<&str, u32> {
    map_res(digit1, str::parse::<u32>)(input)
}

fn year_item(input: &str) -> IResult<&str, YearItem> {
    let range_tail = preceded(ws(tag("..")), year);
    map(
        verify(tuple((year, opt(range_tail))), |(start, end): &(u32, Option<u32>)| {
            end.map_or(true, |end| *start <= end)
        }),
        |(start, end)| match end {
            Some(end) => YearItem::Range(start, end),
            None => YearItem::Single(start),
        },
    )(input)
}

fn selection(input: &str) -> IResult<&str, YearSelection> {
    alt((
        value(YearSelection::All, ws(tag("all"))),
        map(
            separated_list1(char(','), ws(year_item)),
            YearSelection::Items,
        ),
    ))(input)
}

/// Parse a year selection expression.
pub fn parse_year_selection(input: &str) -> Result<YearSelection> {
    all_consuming(selection)(input)
        .map(|(_, sel)| sel)
        .map_err(|e| anyhow!("Invalid year selection '{}': {:?}", input, e))
}
