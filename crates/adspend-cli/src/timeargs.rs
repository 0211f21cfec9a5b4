use adspend_core::clock::{parse_instant, DayBound};
use time::OffsetDateTime;

/// `--from` style argument: a bare date means the start of that day.
pub fn start_arg(arg: Option<&str>, default: OffsetDateTime) -> anyhow::Result<OffsetDateTime> {
    instant_arg(arg, DayBound::Start, default)
}

/// `--to` style argument: a bare date means the end of that day.
pub fn end_arg(arg: Option<&str>, default: OffsetDateTime) -> anyhow::Result<OffsetDateTime> {
    instant_arg(arg, DayBound::End, default)
}

fn instant_arg(
    arg: Option<&str>,
    bound: DayBound,
    default: OffsetDateTime,
) -> anyhow::Result<OffsetDateTime> {
    match arg {
        Some(text) => Ok(parse_instant(text, bound)?),
        None => Ok(default),
    }
}
