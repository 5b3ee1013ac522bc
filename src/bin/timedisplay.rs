use time::Duration;

pub fn pretty_print_duration(d: Duration) -> String {
    let days = d.whole_days();
    let hours = d.whole_hours() - days * 24;
    let minutes = d.whole_minutes() - d.whole_hours() * 60;
    let seconds = d.whole_seconds() - d.whole_minutes() * 60;

    format!(
        "{d} days {h} hours {m} minutes {s} seconds",
        d = days,
        h = hours,
        m = minutes,
        s = seconds
    )
}
